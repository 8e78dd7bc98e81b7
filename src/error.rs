//! Error types for BotForge
//!
//! Every fallible operation in the module pipeline returns [`Result`]. Expected
//! failures (bad module layout, unreadable unit, template typo) are variants of
//! [`ForgeError`]; each variant maps to a stable machine-readable code via
//! [`ForgeError::code`] so the CLI and the startup sequence can report them
//! uniformly.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type for BotForge operations.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// A settings or router unit could not be loaded (missing, unreadable,
    /// malformed JSON, or the wrong JSON shape).
    #[error("Failed to import unit '{unit}': {reason}")]
    Import { unit: String, reason: String },

    /// Structure or settings-contract violation.
    #[error("Invalid module: {0}")]
    InvalidModule(String),

    /// The deepest requested module already exists on disk.
    #[error("Module already exists: {0}")]
    ModuleExists(String),

    /// A template referenced a placeholder that is not known.
    #[error("Template error: {0}")]
    Template(String),

    /// A directory could not be created.
    #[error("Failed to create directory {}: {source}", path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected failure caught at the startup boundary.
    #[error("Startup failed: {message}")]
    StartupFail {
        message: String,
        details: Option<String>,
    },

    /// Router attachment rejected (already attached, self-attachment).
    #[error("Routing error: {0}")]
    Routing(String),

    /// Configuration-related errors (invalid config file, missing bot token, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ForgeError {
    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ForgeError::Import { .. } => "IMPORT ERROR",
            ForgeError::InvalidModule(_) => "Invalid module",
            ForgeError::ModuleExists(_) => "Module is exists",
            ForgeError::Template(_) => "Template Error",
            ForgeError::DirectoryCreate { .. } => "DIRECTORY CREATE ERROR",
            ForgeError::StartupFail { .. } => "STARTUP FAIL",
            ForgeError::Routing(_) => "ROUTER ERROR",
            ForgeError::Config(_) => "CONFIG ERROR",
            ForgeError::Io(_) => "IO ERROR",
            ForgeError::Json(_) => "JSON ERROR",
        }
    }

    /// Optional details, e.g. the payload of a panic caught during startup.
    pub fn details(&self) -> Option<&str> {
        match self {
            ForgeError::StartupFail { details, .. } => details.as_deref(),
            _ => None,
        }
    }

    pub(crate) fn import(unit: impl Into<String>, reason: impl ToString) -> Self {
        ForgeError::Import {
            unit: unit.into(),
            reason: reason.to_string(),
        }
    }
}

/// A specialized `Result` type for BotForge operations.
pub type Result<T> = std::result::Result<T, ForgeError>;
