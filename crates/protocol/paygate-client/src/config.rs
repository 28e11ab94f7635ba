//! Gateway configuration.
//!
//! Loaded from TOML. String values may reference environment variables with
//! `${VAR}` syntax so that secrets stay out of the file.

use std::fmt;
use std::path::{Path, PathBuf};

use paygate_crypto::SignType;
use paygate_types::constants::{DEFAULT_NONCE_LENGTH, NO_PROXY_HOST, NO_PROXY_PORT};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult};
use crate::telemetry::ReportLevel;

/// Address reported to the provider when the caller does not supply one.
pub const DEFAULT_CLIENT_IP: &str = "127.0.0.1";

/// Shortest nonce the provider accepts.
const MIN_NONCE_LENGTH: usize = 1;
/// Longest nonce the provider accepts.
const MAX_NONCE_LENGTH: usize = 32;

/// Expand environment variables in a string.
/// Supports `${VAR_NAME}` syntax. Unset variables are left as-is.
fn expand_env_vars(input: &str) -> GatewayResult<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
        .map_err(|e| GatewayError::config(format!("invalid expansion pattern: {}", e)))?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string())
}

fn expand_path(path: &Path) -> GatewayResult<PathBuf> {
    match path.to_str() {
        Some(s) => expand_env_vars(s).map(PathBuf::from),
        None => Ok(path.to_path_buf()),
    }
}

/// Merchant credentials and client behaviour.
///
/// Shared read-only by every call made through a client.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Application id issued by the provider.
    pub app_id: String,
    /// Merchant id.
    pub mch_id: String,
    /// Shared signing key.
    pub key: String,
    /// Application secret, used only for session exchange.
    pub app_secret: Option<String>,
    /// Default asynchronous notification URL.
    pub notify_url: Option<String>,
    /// Address injected as `spbill_create_ip` and `user_ip` when unset.
    pub client_ip: String,
    /// Client certificate PEM file for refund and reverse.
    pub ssl_cert_path: Option<PathBuf>,
    /// Client private key PEM file for refund and reverse.
    pub ssl_key_path: Option<PathBuf>,
    /// Proxy host; `0.0.0.0` disables the proxy.
    pub proxy_host: String,
    /// Proxy port; `0` disables the proxy.
    pub proxy_port: u16,
    /// Which call outcomes are reported back to the provider.
    pub report_level: ReportLevel,
    /// Signature scheme for outgoing requests and response verification.
    pub sign_type: SignType,
    /// Length of generated nonces.
    pub nonce_length: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            mch_id: String::new(),
            key: String::new(),
            app_secret: None,
            notify_url: None,
            client_ip: DEFAULT_CLIENT_IP.to_string(),
            ssl_cert_path: None,
            ssl_key_path: None,
            proxy_host: NO_PROXY_HOST.to_string(),
            proxy_port: NO_PROXY_PORT,
            report_level: ReportLevel::default(),
            sign_type: SignType::default(),
            nonce_length: DEFAULT_NONCE_LENGTH,
        }
    }
}

impl GatewayConfig {
    /// Create a configuration with the given merchant credentials and
    /// defaults for everything else.
    pub fn new(app_id: impl Into<String>, mch_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            mch_id: mch_id.into(),
            key: key.into(),
            ..Self::default()
        }
    }

    /// Set the default notification URL.
    pub fn with_notify_url(mut self, url: impl Into<String>) -> Self {
        self.notify_url = Some(url.into());
        self
    }

    /// Set the client certificate and key paths.
    pub fn with_certificate(mut self, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        self.ssl_cert_path = Some(cert.into());
        self.ssl_key_path = Some(key.into());
        self
    }

    /// Route requests through an HTTP proxy.
    pub fn with_proxy(mut self, host: impl Into<String>, port: u16) -> Self {
        self.proxy_host = host.into();
        self.proxy_port = port;
        self
    }

    /// Set the report level.
    pub fn with_report_level(mut self, level: ReportLevel) -> Self {
        self.report_level = level;
        self
    }

    /// Set the signature scheme.
    pub fn with_sign_type(mut self, sign_type: SignType) -> Self {
        self.sign_type = sign_type;
        self
    }

    /// Set the application secret.
    pub fn with_app_secret(mut self, secret: impl Into<String>) -> Self {
        self.app_secret = Some(secret.into());
        self
    }

    /// Parse configuration from a TOML string, expanding `${VAR}` references.
    pub fn from_toml_str(contents: &str) -> GatewayResult<Self> {
        let mut config: Self = toml::from_str(contents)
            .map_err(|e| GatewayError::config(format!("invalid configuration: {}", e)))?;
        config.expand_env()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> GatewayResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> GatewayResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GatewayError::config(format!("cannot create {}: {}", parent.display(), e)))?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| GatewayError::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)
            .map_err(|e| GatewayError::config(format!("cannot write {}: {}", path.display(), e)))
    }

    fn expand_env(&mut self) -> GatewayResult<()> {
        for value in [
            &mut self.app_id,
            &mut self.mch_id,
            &mut self.key,
            &mut self.client_ip,
            &mut self.proxy_host,
        ] {
            *value = expand_env_vars(value)?;
        }
        for value in [&mut self.app_secret, &mut self.notify_url]
            .into_iter()
            .flatten()
        {
            *value = expand_env_vars(value)?;
        }
        for path in [&mut self.ssl_cert_path, &mut self.ssl_key_path]
            .into_iter()
            .flatten()
        {
            *path = expand_path(path)?;
        }
        Ok(())
    }

    /// Check that the configuration can sign requests.
    ///
    /// Certificate paths are not checked here; they are only needed by
    /// certificate-gated calls and are checked when those are made.
    pub fn validate(&self) -> GatewayResult<()> {
        if self.app_id.is_empty() {
            return Err(GatewayError::config("app_id is required"));
        }
        if self.mch_id.is_empty() {
            return Err(GatewayError::config("mch_id is required"));
        }
        if self.key.is_empty() && self.sign_type != SignType::Rsa {
            return Err(GatewayError::MissingSigningKey);
        }
        if !(MIN_NONCE_LENGTH..=MAX_NONCE_LENGTH).contains(&self.nonce_length) {
            return Err(GatewayError::config(format!(
                "nonce_length must be between {} and {}",
                MIN_NONCE_LENGTH, MAX_NONCE_LENGTH
            )));
        }
        Ok(())
    }

    /// The proxy URL, if a proxy is configured.
    ///
    /// Only used when the host is not `0.0.0.0` and the port is not 0.
    pub fn proxy_url(&self) -> Option<String> {
        if self.proxy_host != NO_PROXY_HOST && self.proxy_port != NO_PROXY_PORT {
            Some(format!("http://{}:{}", self.proxy_host, self.proxy_port))
        } else {
            None
        }
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "<redacted>"
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("app_id", &self.app_id)
            .field("mch_id", &self.mch_id)
            .field("key", &redact(&self.key))
            .field("app_secret", &self.app_secret.as_deref().map(redact))
            .field("notify_url", &self.notify_url)
            .field("client_ip", &self.client_ip)
            .field("ssl_cert_path", &self.ssl_cert_path)
            .field("ssl_key_path", &self.ssl_key_path)
            .field("proxy", &self.proxy_url())
            .field("report_level", &self.report_level)
            .field("sign_type", &self.sign_type)
            .field("nonce_length", &self.nonce_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.client_ip, "127.0.0.1");
        assert_eq!(config.proxy_host, "0.0.0.0");
        assert_eq!(config.proxy_port, 0);
        assert_eq!(config.report_level, ReportLevel::ErrorsOnly);
        assert_eq!(config.sign_type, SignType::Md5);
        assert_eq!(config.nonce_length, 32);
        assert!(config.proxy_url().is_none());
    }

    #[test]
    fn test_proxy_requires_host_and_port() {
        let base = GatewayConfig::new("wx1", "100", "k");
        assert!(base.clone().with_proxy("10.0.0.1", 0).proxy_url().is_none());
        assert!(base.clone().with_proxy("0.0.0.0", 8080).proxy_url().is_none());
        assert_eq!(
            base.with_proxy("10.0.0.1", 8080).proxy_url().as_deref(),
            Some("http://10.0.0.1:8080")
        );
    }

    #[test]
    fn test_validate() {
        assert!(GatewayConfig::new("wx1", "100", "k").validate().is_ok());
        assert!(matches!(
            GatewayConfig::new("", "100", "k").validate(),
            Err(GatewayError::Config(_))
        ));
        assert!(matches!(
            GatewayConfig::new("wx1", "100", "").validate(),
            Err(GatewayError::MissingSigningKey)
        ));
        // The asymmetric scheme signs without the shared key
        assert!(GatewayConfig::new("wx1", "100", "")
            .with_sign_type(SignType::Rsa)
            .validate()
            .is_ok());

        let mut config = GatewayConfig::new("wx1", "100", "k");
        config.nonce_length = 33;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = GatewayConfig::new("wx1", "100", "super-secret-key").with_app_secret("s3cr3t");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret-key"));
        assert!(!debug.contains("s3cr3t"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("wx1"));
    }

    #[test]
    fn test_from_toml_with_env_expansion() {
        std::env::set_var("PAYGATE_TEST_CONFIG_KEY", "from-env");

        let config = GatewayConfig::from_toml_str(
            r#"
            app_id = "wx2421b1c4370ec43b"
            mch_id = "10000100"
            key = "${PAYGATE_TEST_CONFIG_KEY}"
            notify_url = "https://example.com/${PAYGATE_TEST_UNSET_12345}"
            report_level = "all"
            sign_type = "HMAC-SHA256"
            proxy_host = "10.1.1.1"
            proxy_port = 3128
            "#,
        )
        .unwrap();

        assert_eq!(config.key, "from-env");
        assert_eq!(
            config.notify_url.as_deref(),
            Some("https://example.com/${PAYGATE_TEST_UNSET_12345}")
        );
        assert_eq!(config.report_level, ReportLevel::All);
        assert_eq!(config.sign_type, SignType::HmacSha256);
        assert_eq!(config.proxy_url().as_deref(), Some("http://10.1.1.1:3128"));
        assert_eq!(config.client_ip, "127.0.0.1");

        std::env::remove_var("PAYGATE_TEST_CONFIG_KEY");
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            GatewayConfig::from_toml_str("report_level = \"sometimes\""),
            Err(GatewayError::Config(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("paygate.toml");

        let config = GatewayConfig::new("wx1", "100", "k")
            .with_notify_url("https://example.com/notify")
            .with_certificate("/etc/paygate/cert.pem", "/etc/paygate/key.pem");
        config.save(&path).unwrap();

        let loaded = GatewayConfig::load(&path).unwrap();
        assert_eq!(loaded.app_id, "wx1");
        assert_eq!(loaded.notify_url.as_deref(), Some("https://example.com/notify"));
        assert_eq!(
            loaded.ssl_cert_path.as_deref(),
            Some(Path::new("/etc/paygate/cert.pem"))
        );
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = GatewayConfig::load(&temp_dir.path().join("absent.toml"));
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }
}
