//! CLI command implementations

pub mod catalog;
pub mod completions;
pub mod plan;
pub mod session;
