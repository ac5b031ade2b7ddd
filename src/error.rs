//! Error types for the MT-32 bridge.
//!
//! Resolution and engine-open failures are reported once, to the caller of
//! `open`. Recoverable mismatches during resolution never surface here.

use thiserror::Error;

/// Errors that can occur while configuring or opening the bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// No model satisfied presence and load in any searched directory.
    #[error(
        "Could not find ROMs for model '{selector}' in directories: {}",
        search_order.join(", ")
    )]
    ConfigurationNotFound {
        selector: String,
        search_order: Vec<String>,
    },

    /// The engine accepted the ROMs but refused to open.
    #[error("Error initialising emulation: engine returned {code}")]
    EngineOpen { code: i32 },

    /// A model definition is missing a required ROM role.
    #[error("Invalid model '{name}': {reason}")]
    InvalidModel { name: String, reason: String },

    /// The configured selector names no model in the catalog.
    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    /// The render thread could not be started.
    #[error("Failed to start render thread: {0}")]
    ThreadSpawn(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BridgeError>;
