//! Signed request/response gateway client for the provider's payment API.
//!
//! Callers hand over a flat [`FieldMap`] for a method; the client validates
//! it against the method's requirements, injects credentials, a fresh nonce
//! and method-specific fields, signs it, sends it as an XML envelope and
//! returns the response only once its signature checks out.
//!
//! # Example
//!
//! ```no_run
//! use paygate_client::{GatewayClient, GatewayConfig};
//! use paygate_types::FieldMap;
//!
//! # async fn example() -> paygate_client::GatewayResult<()> {
//! let config = GatewayConfig::new("wx2421b1c4370ec43b", "10000100", "merchant-key")
//!     .with_notify_url("https://example.com/notify");
//! let client = GatewayClient::new(config)?;
//!
//! let order = client
//!     .unified_order(FieldMap::from([
//!         ("out_trade_no", "T001"),
//!         ("body", "test"),
//!         ("total_fee", "100"),
//!         ("trade_type", "NATIVE"),
//!         ("product_id", "P1"),
//!     ]))
//!     .await?;
//! println!("{:?}", order.get("code_url"));
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`api`]: per-method descriptors (endpoint, timeout, requirements)
//! - [`request`]: validation, injection and signing
//! - [`transport`]: the [`Transport`] seam and its HTTPS implementation
//! - [`verify`]: response and notification verification
//! - [`telemetry`]: post-call outcome reporting
//! - [`config`]: merchant configuration

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod native;
pub mod notify;
pub mod request;
pub mod session;
pub mod telemetry;
pub mod transport;
pub mod verify;

pub use api::{ApiDescriptor, ApiMethod, Requirement};
pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use notify::NotifyReply;
pub use session::SessionInfo;
pub use telemetry::{ReportLevel, TelemetrySample};
pub use transport::{ClientCertificate, DispatchRequest, HttpTransport, Transport};
pub use verify::{check_signature, verify_fields, verify_response, SignedEnvelope};

// Re-export types callers need for every call
pub use paygate_crypto::{PrivateKeySigner, SignType};
pub use paygate_types::FieldMap;
