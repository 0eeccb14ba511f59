#![deny(clippy::all, clippy::pedantic)]

use std::io::{self, BufRead, Write};

use listingdesk::application::confirm::{Confirm, Confirmation, Tone};

/// Asks on stderr and reads the answer from stdin. End of input declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, request: &Confirmation) -> bool {
        let mut stderr = io::stderr().lock();
        let marker = match request.tone {
            Tone::Danger => "!",
            Tone::Info => "i",
        };
        let asked = writeln!(stderr, "[{marker}] {}", request.title)
            .and_then(|()| writeln!(stderr, "{}", request.message))
            .and_then(|()| write!(stderr, "{} [y/N]: ", request.confirm_text))
            .and_then(|()| stderr.flush());
        if asked.is_err() {
            return false;
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(0) | Err(_) => false,
            Ok(_) => is_yes(&answer),
        }
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
