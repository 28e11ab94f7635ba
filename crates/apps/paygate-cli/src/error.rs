//! CLI error types.

use paygate_client::GatewayError;
use thiserror::Error;

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error enum wrapping all crate errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Gateway error.
    #[error("{0}")]
    Gateway(#[from] GatewayError),

    /// IO error.
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// User-facing error with actionable message.
    #[error("{0}")]
    User(String),

    /// File not found.
    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl CliError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a user-facing error.
    pub fn user(msg: impl Into<String>) -> Self {
        Self::User(msg.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors: 1
            Self::User(_) => 1,
            // Not found: 2
            Self::FileNotFound(_) => 2,
            // Config errors: 3
            Self::Config(_) => 3,
            // Gateway errors: 4-8
            Self::Gateway(e) => match e {
                GatewayError::Config(_) | GatewayError::MissingSigningKey => 3,
                GatewayError::MissingRequiredField(_) | GatewayError::MissingCertificate(_) => 4,
                GatewayError::Transport { .. } => 5,
                GatewayError::InvalidSignature | GatewayError::MalformedResponse(_) => 6,
                GatewayError::Provider { .. } => 7,
                GatewayError::Encode(_) | GatewayError::Signing(_) => 8,
            },
            // IO errors: 9
            Self::Io(_) => 9,
            // JSON/format errors: 10
            Self::Json(_) => 10,
        }
    }

    /// A recovery hint, if one applies.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Gateway(e) => Some(e.suggestion()),
            Self::Config(_) => Some("Pass --config or set PAYGATE_CONFIG to a TOML file"),
            Self::FileNotFound(_) => Some("Check the path, or pass '-' to read standard input"),
            _ => None,
        }
    }
}
