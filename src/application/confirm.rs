//! Confirmation port guarding destructive or irreversible actions.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Danger,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub title: String,
    pub message: String,
    pub confirm_text: &'static str,
    pub tone: Tone,
}

impl Confirmation {
    pub fn danger(
        title: impl Into<String>,
        message: impl Into<String>,
        confirm_text: &'static str,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_text,
            tone: Tone::Danger,
        }
    }

    pub fn info(
        title: impl Into<String>,
        message: impl Into<String>,
        confirm_text: &'static str,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            confirm_text,
            tone: Tone::Info,
        }
    }
}

/// Asked before a request is issued; `false` aborts the action.
pub trait Confirm: Send + Sync {
    fn confirm(&self, request: &Confirmation) -> bool;
}

/// Answers every confirmation with yes, e.g. for `--yes`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&self, _request: &Confirmation) -> bool {
        true
    }
}

/// Fixed answer that remembers what it was asked.
#[derive(Debug, Default)]
pub struct ScriptedConfirm {
    answer: bool,
    asked: Mutex<Vec<Confirmation>>,
}

impl ScriptedConfirm {
    pub fn accepting() -> Self {
        Self {
            answer: true,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn declining() -> Self {
        Self {
            answer: false,
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<Confirmation> {
        self.asked
            .lock()
            .map(|asked| asked.clone())
            .unwrap_or_default()
    }
}

impl Confirm for ScriptedConfirm {
    fn confirm(&self, request: &Confirmation) -> bool {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(request.clone());
        }
        self.answer
    }
}
