#![deny(clippy::all, clippy::pedantic)]

pub mod accounts;
pub mod activity;
pub mod auth;
pub mod posts;
pub mod reports;
pub mod users;
