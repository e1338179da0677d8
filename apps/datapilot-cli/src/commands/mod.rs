//! CLI command implementations

pub mod batch;
pub mod catalog;
pub mod classify;
pub mod patterns;
pub mod time;
