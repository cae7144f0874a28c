// src/error.rs
//! Error taxonomy shared across the pipeline.
//!
//! Configuration problems are fatal at startup; news-service problems degrade
//! to "no headline" at the call site; schema problems surface the raw model
//! output with a warning instead of crashing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    /// Missing credentials at startup. Blocks any further action.
    #[error("missing configuration: {missing}")]
    Configuration { missing: String },

    /// Provider key outside the closed set of four. Contract violation,
    /// should not occur through the UI dropdown.
    #[error("unsupported provider: {0:?}")]
    UnsupportedProvider(String),

    /// Known provider, but the model id is not in its static menu.
    #[error("unknown model {model:?} for provider {provider}")]
    UnknownModel {
        provider: &'static str,
        model: String,
    },

    /// Selection reached a provider whose credential is empty.
    #[error("no credential configured for provider {0}")]
    MissingCredential(&'static str),

    /// News fetch transport/parse failure. Recovered locally, never fatal.
    #[error("news service error: {0}")]
    ExternalService(String),

    /// Model output does not match the prediction schema.
    #[error("prediction schema violation: {0}")]
    SchemaViolation(String),
}
