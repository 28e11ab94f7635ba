//! Inbound payment notifications.

use std::future::Future;

use paygate_types::constants::{FIELD_RETURN_CODE, FIELD_RETURN_MSG, STATUS_FAIL, STATUS_SUCCESS};
use paygate_types::FieldMap;
use paygate_wire::WireResult;
use tracing::{info, warn};

use crate::client::GatewayClient;
use crate::error::GatewayResult;
use crate::verify::{verify_response, SignedEnvelope};

/// Acknowledgement returned to the provider as the notification's HTTP body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyReply {
    success: bool,
    message: String,
}

impl NotifyReply {
    /// Acknowledge the notification (`SUCCESS` / `OK`).
    pub fn success() -> Self {
        Self {
            success: true,
            message: "OK".to_string(),
        }
    }

    /// Refuse the notification; the provider will redeliver it.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The reply as fields.
    pub fn to_fields(&self) -> FieldMap {
        let code = if self.success { STATUS_SUCCESS } else { STATUS_FAIL };
        FieldMap::from([(FIELD_RETURN_CODE, code), (FIELD_RETURN_MSG, self.message.as_str())])
    }

    /// The reply as an XML envelope.
    pub fn to_xml(&self) -> WireResult<Vec<u8>> {
        paygate_wire::encode(&self.to_fields())
    }
}

impl GatewayClient {
    /// Decode and verify a notification body.
    pub fn verify_notification(&self, body: &[u8]) -> GatewayResult<SignedEnvelope> {
        verify_response(body, &self.config().key, &self.scheme()?)
    }

    /// Verify a notification and hand it to `handler`.
    ///
    /// The handler only ever sees verified notifications. Its result picks
    /// the reply: `Ok` acknowledges, `Err(message)` refuses with that message.
    /// A notification that fails verification is refused with the error text.
    pub async fn handle_notify<F, Fut>(&self, body: &[u8], handler: F) -> NotifyReply
    where
        F: FnOnce(SignedEnvelope) -> Fut,
        Fut: Future<Output = Result<(), String>>,
    {
        let envelope = match self.verify_notification(body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(error = %e, "Rejected notification");
                return NotifyReply::fail(e.to_string());
            }
        };

        let out_trade_no = envelope.get("out_trade_no").map(str::to_string);
        match handler(envelope).await {
            Ok(()) => {
                info!(out_trade_no = ?out_trade_no, "Notification handled");
                NotifyReply::success()
            }
            Err(message) => {
                warn!(out_trade_no = ?out_trade_no, reason = %message, "Notification handler refused");
                NotifyReply::fail(message)
            }
        }
    }
}
