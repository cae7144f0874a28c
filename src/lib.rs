// src/lib.rs
// Public library surface for integration tests (and the Shuttle binary).

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod llm;
pub mod news;
pub mod prediction;
pub mod prompt;
pub mod provider;

// ---- Re-exports for stable public API ----
pub use crate::api::{app, router, AppState};
pub use crate::error::OracleError;
