//! Selection state for bulk actions.
//!
//! The post list is split into two partitions by the `posted` flag and each
//! partition owns an independent selection.

use std::collections::BTreeSet;

use listingdesk_api_types::PostId;

/// Which half of the post list a selection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Pending,
    Posted,
}

impl Partition {
    pub fn of(posted: bool) -> Self {
        if posted {
            Partition::Posted
        } else {
            Partition::Pending
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Partition::Pending => "pending",
            Partition::Posted => "posted",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<PostId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id` when absent, remove it when present.
    pub fn toggle(&mut self, id: PostId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Toggle between "everything in `candidates`" and "nothing".
    ///
    /// When the selection already equals the candidate set it is cleared,
    /// otherwise it is replaced by the candidate set. Never additive.
    pub fn select_all<I>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = PostId>,
    {
        let candidates: BTreeSet<PostId> = candidates.into_iter().collect();
        if self.ids == candidates {
            self.ids.clear();
        } else {
            self.ids = candidates;
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn remove_all<'a, I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = &'a PostId>,
    {
        for id in ids {
            self.ids.remove(id);
        }
    }

    pub fn contains(&self, id: PostId) -> bool {
        self.ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> Vec<PostId> {
        self.ids.iter().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = PostId> + '_ {
        self.ids.iter().copied()
    }
}

/// The two independent selections of the posts view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostSelections {
    pub pending: SelectionSet,
    pub posted: SelectionSet,
}

impl PostSelections {
    pub fn get(&self, partition: Partition) -> &SelectionSet {
        match partition {
            Partition::Pending => &self.pending,
            Partition::Posted => &self.posted,
        }
    }

    pub fn get_mut(&mut self, partition: Partition) -> &mut SelectionSet {
        match partition {
            Partition::Pending => &mut self.pending,
            Partition::Posted => &mut self.posted,
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.posted.clear();
    }
}
