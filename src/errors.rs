//! Unified error types for the stock offer engine.
//!
//! Malformed filter input and stale SKU references are normalised or ignored by the
//! engines themselves, so the only failures that surface here come from persistence,
//! configuration and the simulated catalog transport.

use thiserror::Error;

/// Errors that can escape the catalog and offer engines.
#[derive(Debug, Error)]
pub enum Error {
    /// The offer snapshot table could not be read or written
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// The offer snapshot could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Settings file missing, unreadable or malformed
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong while loading settings
        message: String,
    },

    /// The catalog service was asked to fail this request
    #[error("Catalog service unavailable: {message}")]
    Transport {
        /// Description of the simulated failure
        message: String,
    },

    /// The database directory could not be created
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
