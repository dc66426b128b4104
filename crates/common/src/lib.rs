//! ScholarMatch Common Library
//!
//! Shared code for the ScholarMatch services including:
//! - Domain models for the matching pipeline
//! - Professor cache store (SeaORM) and its read/write contract
//! - Session and progress store (Redis)
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability
//! - Balanced-JSON extraction for oracle output

pub mod cache;
pub mod config;
pub mod db;
pub mod errors;
pub mod json;
pub mod metrics;
pub mod models;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use cache::ProfessorCache;
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use session::SessionStore;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Professor cache records older than this are treated as absent
pub const CACHE_TTL_DAYS: i64 = 7;
