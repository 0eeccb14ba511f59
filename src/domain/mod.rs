//! Domain layer types and invariants.

pub mod board;
pub mod error;
pub mod selection;
pub mod validation;
