//! HTTP transport.
//!
//! The [`Transport`] trait is the seam between the client and the network.
//! [`HttpTransport`] is the production implementation; tests substitute a
//! recording mock.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Identity, Proxy};
use tracing::debug;

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};

/// Client certificate and private key, both PEM.
///
/// Loaded from disk per certificate-gated call so that rotated files are
/// picked up without rebuilding the client.
#[derive(Clone)]
pub struct ClientCertificate {
    cert_pem: Vec<u8>,
    key_pem: Vec<u8>,
}

impl ClientCertificate {
    /// Build from in-memory PEM data.
    pub fn from_pem(cert_pem: Vec<u8>, key_pem: Vec<u8>) -> Self {
        Self { cert_pem, key_pem }
    }

    /// Load the configured certificate and key.
    ///
    /// Both paths must be configured and both files must exist.
    pub fn load(cert_path: Option<&Path>, key_path: Option<&Path>) -> GatewayResult<Self> {
        let key_path =
            key_path.ok_or_else(|| GatewayError::missing_certificate("ssl_key_path is not set"))?;
        let cert_path = cert_path
            .ok_or_else(|| GatewayError::missing_certificate("ssl_cert_path is not set"))?;

        let key_pem = read_pem(key_path, "key")?;
        let cert_pem = read_pem(cert_path, "certificate")?;
        Ok(Self { cert_pem, key_pem })
    }

    /// Load the certificate named by a configuration.
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        Self::load(config.ssl_cert_path.as_deref(), config.ssl_key_path.as_deref())
    }

    /// Certificate PEM bytes.
    pub fn cert_pem(&self) -> &[u8] {
        &self.cert_pem
    }

    /// Combined PEM bundle, certificate first, as expected by the TLS stack.
    pub fn identity_pem(&self) -> Vec<u8> {
        let mut pem = Vec::with_capacity(self.cert_pem.len() + self.key_pem.len() + 1);
        pem.extend_from_slice(&self.cert_pem);
        if !pem.ends_with(b"\n") {
            pem.push(b'\n');
        }
        pem.extend_from_slice(&self.key_pem);
        pem
    }
}

fn read_pem(path: &Path, what: &str) -> GatewayResult<Vec<u8>> {
    if !path.is_file() {
        return Err(GatewayError::missing_certificate(format!(
            "{} file {} does not exist",
            what,
            path.display()
        )));
    }
    std::fs::read(path).map_err(|e| {
        GatewayError::missing_certificate(format!("cannot read {} file {}: {}", what, path.display(), e))
    })
}

impl fmt::Debug for ClientCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCertificate")
            .field("cert_pem", &format_args!("{} bytes", self.cert_pem.len()))
            .field("key_pem", &"<redacted>")
            .finish()
    }
}

/// One outgoing envelope.
#[derive(Debug, Clone, Copy)]
pub struct DispatchRequest<'a> {
    pub url: &'a str,
    pub body: &'a [u8],
    pub timeout: Duration,
    /// Present only for certificate-gated calls.
    pub client_cert: Option<&'a ClientCertificate>,
}

/// Sends envelopes to the provider.
///
/// Implementations return the raw response body on a successful HTTP
/// status and [`GatewayError::Transport`] otherwise. They never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST an XML envelope.
    async fn post(&self, request: DispatchRequest<'_>) -> GatewayResult<Vec<u8>>;

    /// GET a URL with query parameters.
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> GatewayResult<Vec<u8>>;
}

/// Transport over HTTPS with strict peer and host verification.
#[derive(Clone)]
pub struct HttpTransport {
    /// Shared client for calls without a client certificate
    client: Client,
    /// Proxy URL, reapplied to per-call certificate clients
    proxy: Option<String>,
}

impl HttpTransport {
    /// Create a transport, optionally routed through an HTTP proxy.
    pub fn new(proxy: Option<String>) -> GatewayResult<Self> {
        let client = Self::builder(proxy.as_deref())?
            .build()
            .map_err(|e| GatewayError::config(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, proxy })
    }

    /// Create from a gateway config.
    pub fn from_config(config: &GatewayConfig) -> GatewayResult<Self> {
        Self::new(config.proxy_url())
    }

    fn builder(proxy: Option<&str>) -> GatewayResult<ClientBuilder> {
        let mut builder = Client::builder();
        if let Some(url) = proxy {
            let proxy = Proxy::all(url)
                .map_err(|e| GatewayError::config(format!("invalid proxy {}: {}", url, e)))?;
            builder = builder.proxy(proxy);
        }
        Ok(builder)
    }

    fn client_for(&self, cert: Option<&ClientCertificate>) -> GatewayResult<Client> {
        let Some(cert) = cert else {
            return Ok(self.client.clone());
        };
        let identity = Identity::from_pem(&cert.identity_pem()).map_err(|e| {
            GatewayError::missing_certificate(format!("unusable certificate or key: {}", e))
        })?;
        Self::builder(self.proxy.as_deref())?
            .identity(identity)
            .build()
            .map_err(|e| GatewayError::config(format!("failed to create HTTP client: {}", e)))
    }

    async fn read_body(response: reqwest::Response) -> GatewayResult<Vec<u8>> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::transport(
                Some(status.as_u16()),
                format!("provider returned {}: {}", status, body),
            ));
        }
        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(GatewayError::transport(
                Some(status.as_u16()),
                "empty response body",
            ));
        }
        Ok(body.to_vec())
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("proxy", &self.proxy)
            .finish()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: DispatchRequest<'_>) -> GatewayResult<Vec<u8>> {
        debug!(
            url = request.url,
            bytes = request.body.len(),
            cert = request.client_cert.is_some(),
            "POST envelope"
        );
        let client = self.client_for(request.client_cert)?;
        let response = client
            .post(request.url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .timeout(request.timeout)
            .body(request.body.to_vec())
            .send()
            .await?;
        Self::read_body(response).await
    }

    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        timeout: Duration,
    ) -> GatewayResult<Vec<u8>> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(timeout)
            .send()
            .await?;
        Self::read_body(response).await
    }
}
