//! Error types and exit codes for firstline
//!
//! Exit codes:
//! - 0: Success
//! - 1: Generic failure
//! - 2: Usage error (bad flags/args)
//! - 3: Data/vault error (missing vault, invalid config, bad document path)

use std::path::PathBuf;
use thiserror::Error;

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Success (0)
    Success = 0,
    /// Generic failure (1)
    Failure = 1,
    /// Usage error - bad flags/args (2)
    Usage = 2,
    /// Data/vault error - missing vault, invalid config (3)
    Data = 3,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

/// Errors that can occur during firstline operations
#[derive(Error, Debug)]
pub enum FirstlineError {
    // Usage errors (exit code 2)
    #[error("unknown format: {0} (expected: human or json)")]
    UnknownFormat(String),

    #[error("{0}")]
    UsageError(String),

    // Data/vault errors (exit code 3)
    #[error("vault not found: {path:?}")]
    VaultNotFound { path: PathBuf },

    #[error("config already exists at {path:?}")]
    ConfigAlreadyExists { path: PathBuf },

    #[error("invalid config in {path:?}: {reason}")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("document not found: {path:?}")]
    DocumentNotFound { path: PathBuf },

    #[error("not a markdown document: {path:?}")]
    NotMarkdown { path: PathBuf },

    #[error("rename target already exists: {path:?}")]
    RenameTargetExists { path: PathBuf },

    #[error("document path escapes the vault: {path:?}")]
    OutsideVault { path: PathBuf },

    // Generic failures (exit code 1)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl FirstlineError {
    /// Get the appropriate exit code for this error
    pub fn exit_code(&self) -> ExitCode {
        match self {
            FirstlineError::UnknownFormat(_) | FirstlineError::UsageError(_) => ExitCode::Usage,

            FirstlineError::VaultNotFound { .. }
            | FirstlineError::ConfigAlreadyExists { .. }
            | FirstlineError::InvalidConfig { .. }
            | FirstlineError::DocumentNotFound { .. }
            | FirstlineError::NotMarkdown { .. }
            | FirstlineError::RenameTargetExists { .. }
            | FirstlineError::OutsideVault { .. } => ExitCode::Data,

            FirstlineError::Io(_)
            | FirstlineError::Toml(_)
            | FirstlineError::Json(_)
            | FirstlineError::Other(_) => ExitCode::Failure,
        }
    }

    /// Convert error to JSON representation for structured error output
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.exit_code() as i32,
                "type": self.error_type(),
                "message": self.to_string(),
            }
        })
    }

    /// Get the error type identifier
    fn error_type(&self) -> &'static str {
        match self {
            FirstlineError::UnknownFormat(_) => "unknown_format",
            FirstlineError::UsageError(_) => "usage_error",
            FirstlineError::VaultNotFound { .. } => "vault_not_found",
            FirstlineError::ConfigAlreadyExists { .. } => "config_already_exists",
            FirstlineError::InvalidConfig { .. } => "invalid_config",
            FirstlineError::DocumentNotFound { .. } => "document_not_found",
            FirstlineError::NotMarkdown { .. } => "not_markdown",
            FirstlineError::RenameTargetExists { .. } => "rename_target_exists",
            FirstlineError::OutsideVault { .. } => "outside_vault",
            FirstlineError::Io(_) => "io_error",
            FirstlineError::Json(_) => "json_error",
            FirstlineError::Toml(_) => "toml_error",
            FirstlineError::Other(_) => "other",
        }
    }
}

/// Result type alias for firstline operations
pub type Result<T> = std::result::Result<T, FirstlineError>;
