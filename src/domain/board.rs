//! In-memory mirror of the post list together with its selections.

use std::collections::BTreeSet;

use listingdesk_api_types::{Post, PostId};
use serde::Serialize;

use super::selection::{Partition, PostSelections, SelectionSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BoardStats {
    pub total: usize,
    pub posted: usize,
    pub pending: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PostBoard {
    posts: Vec<Post>,
    selections: PostSelections,
}

impl PostBoard {
    pub fn new(posts: Vec<Post>) -> Self {
        Self {
            posts,
            selections: PostSelections::default(),
        }
    }

    /// Swap in a freshly fetched list. Both selections are cleared.
    pub fn replace_posts(&mut self, posts: Vec<Post>) {
        self.posts = posts;
        self.selections.clear();
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn find(&self, id: PostId) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn partition_of(&self, id: PostId) -> Option<Partition> {
        self.find(id).map(|post| Partition::of(post.posted))
    }

    /// Candidate ids of a partition, in list order.
    pub fn candidates(&self, partition: Partition) -> Vec<PostId> {
        self.posts
            .iter()
            .filter(|post| Partition::of(post.posted) == partition)
            .map(|post| post.id)
            .collect()
    }

    pub fn selection(&self, partition: Partition) -> &SelectionSet {
        self.selections.get(partition)
    }

    pub fn selections(&self) -> &PostSelections {
        &self.selections
    }

    /// Toggle `id` in the partition it belongs to. Returns `false` and leaves
    /// the selection untouched when `id` is not a candidate of `partition`.
    pub fn toggle(&mut self, partition: Partition, id: PostId) -> bool {
        if self.partition_of(id) != Some(partition) {
            return false;
        }
        self.selections.get_mut(partition).toggle(id);
        true
    }

    pub fn select_all(&mut self, partition: Partition) {
        let candidates = self.candidates(partition);
        self.selections.get_mut(partition).select_all(candidates);
    }

    pub fn clear_selection(&mut self, partition: Partition) {
        self.selections.get_mut(partition).clear();
    }

    /// Remove posts from the list and from both selections.
    pub fn remove_posts(&mut self, ids: &[PostId]) {
        if ids.is_empty() {
            return;
        }
        let doomed: BTreeSet<PostId> = ids.iter().copied().collect();
        self.posts.retain(|post| !doomed.contains(&post.id));
        self.selections.pending.remove_all(&doomed);
        self.selections.posted.remove_all(&doomed);
    }

    pub fn stats(&self) -> BoardStats {
        let posted = self.posts.iter().filter(|post| post.posted).count();
        BoardStats {
            total: self.posts.len(),
            posted,
            pending: self.posts.len() - posted,
            failed: self.posts.iter().filter(|post| post.is_failed()).count(),
        }
    }
}
