//! CLI command implementations.

pub mod delete;
pub mod read;
pub mod sync;
