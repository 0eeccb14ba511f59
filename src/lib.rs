//! Client coordination for a Marketplace listing scheduler.
//!
//! `domain` holds the post board and input checks, `application` the
//! coordinators (bulk actions, job poller, activity log), and `infra` the
//! HTTP client, file-backed storage and telemetry.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
