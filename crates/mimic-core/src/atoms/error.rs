// ── Mimic Atoms: Error Types ───────────────────────────────────────────────
// Single canonical error enum for the engine, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, DB, Store, Config…).
//   • The `#[from]` attribute wires std/external error conversions automatically.
//   • Corrupt model payloads are NOT errors: the codec degrades them to an
//     empty chain, so no variant exists for them.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failure (encoding a model, never decoding one).
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLite / rusqlite database failure.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Persistent store read/write failure for a specific key.
    #[error("Store error: {key}: {message}")]
    Store { key: String, message: String },

    /// Channel / bridge failure.
    #[error("Channel error: {channel}: {message}")]
    Channel { channel: String, message: String },

    /// Engine or host configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenience constructors ───────────────────────────────────────────────

impl EngineError {
    /// Create a store error for a key.
    pub fn store(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Store { key: key.into(), message: message.into() }
    }

    /// Create a channel error with name and message.
    pub fn channel(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Channel { channel: channel.into(), message: message.into() }
    }
}

// ── Bridge: String → EngineError ───────────────────────────────────────────
// Lets bridges raise ad-hoc messages with `?` / `.into()`.

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Other(s)
    }
}

impl From<&str> for EngineError {
    fn from(s: &str) -> Self {
        EngineError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All engine operations return this type.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<EngineError> for String {
    fn from(e: EngineError) -> Self {
        e.to_string()
    }
}
