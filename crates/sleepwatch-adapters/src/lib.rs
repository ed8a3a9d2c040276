//! Sleepwatch Adapters - External adapters for sleepwatch.
//!
//! This crate provides adapters for:
//! - SQLite outcome storage
//! - The HTTP API
//! - Model downloading and caching

pub mod http;
pub mod models;
pub mod sqlite;

pub use http::{router, serve, AppState, ServerSettings};
pub use models::{model_paths, models_dir};
pub use sqlite::SqliteOutcomeStore;
