//! Application services: coordination between the post board, the backend
//! gateways and the activity log.

pub mod accounts;
pub mod activity;
pub mod bulk;
pub mod confirm;
pub mod error;
pub mod gateway;
pub mod poller;
pub mod schedule;
pub mod session;
pub mod storage;
pub mod workspace;
