//! Error types for the gateway client.

use paygate_crypto::CryptoError;
use paygate_wire::WireError;
use thiserror::Error;

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors that can occur while building, dispatching or verifying a call.
///
/// Validation, signing-key and certificate errors are always raised before
/// any network I/O happens.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// A required field, or every member of a required group, is absent.
    ///
    /// Groups are rendered as `a|b|c`.
    #[error("missing required field: {0}")]
    MissingRequiredField(String),

    /// The shared key is empty, or the asymmetric scheme has no signer.
    #[error("signing key is missing")]
    MissingSigningKey,

    /// A certificate-gated call has no usable client certificate or key.
    #[error("client certificate unavailable: {0}")]
    MissingCertificate(String),

    /// Network, TLS, timeout or non-success HTTP status.
    #[error("transport error{}: {reason}", code.map(|c| format!(" ({})", c)).unwrap_or_default())]
    Transport {
        /// HTTP status code, when one was received
        code: Option<u16>,
        /// Description of the failure
        reason: String,
    },

    /// A response or notification carries a missing or mismatched signature.
    #[error("invalid response signature")]
    InvalidSignature,

    /// The provider answered with a well-formed failure envelope.
    #[error("provider error {return_code}: {return_msg}")]
    Provider {
        /// Provider status code
        return_code: String,
        /// Provider status message
        return_msg: String,
    },

    /// The response could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request envelope could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// The signing primitive failed for a reason other than a missing key.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    /// Create a new MissingRequiredField error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingRequiredField(field.into())
    }

    /// Create a new MissingCertificate error.
    pub fn missing_certificate(msg: impl Into<String>) -> Self {
        Self::MissingCertificate(msg.into())
    }

    /// Create a new Transport error.
    pub fn transport(code: Option<u16>, reason: impl Into<String>) -> Self {
        Self::Transport {
            code,
            reason: reason.into(),
        }
    }

    /// Create a new Provider error.
    pub fn provider(return_code: impl Into<String>, return_msg: impl Into<String>) -> Self {
        Self::Provider {
            return_code: return_code.into(),
            return_msg: return_msg.into(),
        }
    }

    /// Create a new MalformedResponse error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a new Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns true if the call may succeed if the caller retries it.
    ///
    /// The client itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport { code, .. } => code.map_or(true, |c| c >= 500),
            _ => false,
        }
    }

    /// Returns true if the error was raised before any network I/O.
    pub fn is_pre_dispatch(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredField(_)
                | Self::MissingSigningKey
                | Self::MissingCertificate(_)
                | Self::Encode(_)
                | Self::Signing(_)
                | Self::Config(_)
        )
    }

    /// Returns a short recovery hint for this error.
    pub fn suggestion(&self) -> &str {
        match self {
            Self::MissingRequiredField(_) => "Set the named field on the request",
            Self::MissingSigningKey => "Configure the shared key or attach a private-key signer",
            Self::MissingCertificate(_) => {
                "Set ssl_cert_path and ssl_key_path to existing PEM files"
            }
            Self::Transport { .. } => "Check connectivity and proxy settings, then retry",
            Self::InvalidSignature => "Check that the shared key matches the merchant platform",
            Self::Provider { .. } => "Inspect return_msg; the provider rejected the request",
            Self::MalformedResponse(_) => "The provider response could not be parsed",
            Self::Encode(_) => "Field names must be plain XML names such as out_trade_no",
            Self::Signing(_) => "This is an internal error; please report it",
            Self::Config(_) => "Fix the gateway configuration",
        }
    }
}

impl From<CryptoError> for GatewayError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::MissingSigningKey => Self::MissingSigningKey,
            other => Self::Signing(other.to_string()),
        }
    }
}

impl From<WireError> for GatewayError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::Encode(msg) => Self::Encode(msg),
            e @ WireError::InvalidFieldName(_) => Self::Encode(e.to_string()),
            other => Self::MalformedResponse(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport {
            code: e.status().map(|s| s.as_u16()),
            reason: e.to_string(),
        }
    }
}
