//! Shared error types and configuration for DataPilot.

pub mod config;
pub mod error;

pub use self::config::*;
pub use self::error::*;
