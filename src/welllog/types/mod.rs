//! Foundational data structures, error types and the progress capability.

pub mod error;
pub mod models;
