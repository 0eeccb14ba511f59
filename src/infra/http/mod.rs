//! reqwest adapter for the scheduler backend.

mod accounts;
mod auth;
mod client;
mod posts;
mod reports;

pub use client::ApiClient;
pub use posts::{PostForm, PostPatch};

#[cfg(test)]
mod tests;
