//! Command implementations.

pub mod completions;
pub mod event;
pub mod version;
