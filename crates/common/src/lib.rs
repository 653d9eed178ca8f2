//! ThesisTrack Common Library
//!
//! Shared types, configuration, and HTTP plumbing for the ThesisTrack
//! API test harness.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use client::{ApiClient, ApiResponse};
pub use config::HarnessConfig;
pub use error::{Error, Result};
pub use types::*;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
