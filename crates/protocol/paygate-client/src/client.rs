//! The gateway client.
//!
//! Every dispatched call runs the same pipeline: validate the caller's
//! fields, inject credentials and computed fields, sign, encode, load the
//! client certificate when the method needs one, send, decode, check the
//! response signature, optionally report the outcome, then check the
//! return code.

use std::sync::Arc;
use std::time::{Duration, Instant};

use paygate_crypto::{PrivateKeySigner, SignScheme};
use paygate_types::constants::{FIELD_RETURN_CODE, FIELD_RETURN_MSG, STATUS_SUCCESS};
use paygate_types::FieldMap;
use tracing::{debug, info, warn};

use crate::api::{ApiDescriptor, ApiMethod};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::request::RequestBuilder;
use crate::telemetry::TelemetrySample;
use crate::transport::{ClientCertificate, DispatchRequest, HttpTransport, Transport};
use crate::verify::{check_envelope, check_signature, SignedEnvelope};

/// Raw outcome of one dispatched envelope.
struct Dispatched {
    url: &'static str,
    body: Vec<u8>,
    elapsed: Duration,
}

/// Client for the provider's payment API.
///
/// Cheap to clone; clones share configuration and transport. A client holds
/// no per-call state, so concurrent calls are independent.
#[derive(Clone)]
pub struct GatewayClient {
    config: Arc<GatewayConfig>,
    transport: Arc<dyn Transport>,
    signer: Option<Arc<dyn PrivateKeySigner>>,
}

impl GatewayClient {
    /// Create a client that talks HTTPS to the provider.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let transport = HttpTransport::from_config(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(config: GatewayConfig, transport: Arc<dyn Transport>) -> GatewayResult<Self> {
        config.validate()?;
        debug!(
            app_id = %config.app_id,
            mch_id = %config.mch_id,
            sign_type = %config.sign_type,
            "Gateway client created"
        );
        Ok(Self {
            config: Arc::new(config),
            transport,
            signer: None,
        })
    }

    /// Attach an external signer for the asymmetric scheme.
    pub fn with_private_key_signer(mut self, signer: Arc<dyn PrivateKeySigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// The client's configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Resolve the configured sign type into a usable scheme.
    pub(crate) fn scheme(&self) -> GatewayResult<SignScheme> {
        Ok(SignScheme::resolve(self.config.sign_type, self.signer.as_ref())?)
    }

    /// Validate, inject and sign fields for `method` without sending them.
    pub fn build_request(&self, method: ApiMethod, fields: FieldMap) -> GatewayResult<FieldMap> {
        let scheme = self.scheme()?;
        RequestBuilder::new(&self.config, &scheme).build(method.descriptor(), fields)
    }

    // =========================================================================
    // Core pipeline
    // =========================================================================

    /// Call `method` with its default timeout.
    pub async fn call(&self, method: ApiMethod, fields: FieldMap) -> GatewayResult<SignedEnvelope> {
        self.call_with_timeout(method, fields, None).await
    }

    /// Call `method`, overriding its default timeout when `timeout` is set.
    ///
    /// Returns the verified response. Validation, signing-key and
    /// certificate errors are raised before anything is sent.
    pub async fn call_with_timeout(
        &self,
        method: ApiMethod,
        fields: FieldMap,
        timeout: Option<Duration>,
    ) -> GatewayResult<SignedEnvelope> {
        let descriptor = method.descriptor();
        let scheme = self.scheme()?;
        let dispatched = self.dispatch(descriptor, fields, timeout, &scheme).await?;

        let response = paygate_wire::decode(&dispatched.body)?;
        check_signature(&response, &self.config.key, &scheme)?;
        if descriptor.reports_outcome {
            self.report_outcome(dispatched.url, dispatched.elapsed, &response).await;
        }

        let envelope = check_envelope(response)?;
        info!(
            %method,
            result_code = envelope.get("result_code").unwrap_or_default(),
            elapsed_ms = dispatched.elapsed.as_millis() as u64,
            "Call completed"
        );
        Ok(envelope)
    }

    async fn dispatch(
        &self,
        descriptor: &'static ApiDescriptor,
        fields: FieldMap,
        timeout: Option<Duration>,
        scheme: &SignScheme,
    ) -> GatewayResult<Dispatched> {
        let url = descriptor.endpoint()?;
        let request = RequestBuilder::new(&self.config, scheme).build(descriptor, fields)?;
        let body = paygate_wire::encode(&request)?;
        let cert = if descriptor.requires_cert {
            Some(ClientCertificate::from_config(&self.config)?)
        } else {
            None
        };

        let started = Instant::now();
        let result = self
            .transport
            .post(DispatchRequest {
                url,
                body: &body,
                timeout: timeout.unwrap_or(descriptor.timeout),
                client_cert: cert.as_ref(),
            })
            .await;
        let elapsed = started.elapsed();

        match result {
            Ok(body) => Ok(Dispatched { url, body, elapsed }),
            Err(e) => {
                warn!(method = %descriptor.method, url, error = %e, "Dispatch failed");
                Err(e)
            }
        }
    }

    /// Report a call outcome if the report level asks for it.
    ///
    /// Failures are logged and discarded; they never reach the caller of
    /// the primary call.
    async fn report_outcome(&self, url: &str, elapsed: Duration, response: &FieldMap) {
        if !self.config.report_level.should_report(response) {
            return;
        }
        let sample = TelemetrySample::from_response(url, elapsed, response);
        if let Err(e) = self.report(sample.into_fields()).await {
            debug!(url, error = %e, "Telemetry report discarded");
        }
    }

    // =========================================================================
    // Provider methods
    // =========================================================================

    /// Place an order. Requires `out_trade_no`, `body`, `total_fee`,
    /// `trade_type`, plus `openid` for JSAPI and `product_id` for NATIVE.
    pub async fn unified_order(&self, fields: FieldMap) -> GatewayResult<SignedEnvelope> {
        self.call(ApiMethod::UnifiedOrder, fields).await
    }

    /// Query an order by `out_trade_no` or `transaction_id`.
    pub async fn order_query(&self, fields: FieldMap) -> GatewayResult<SignedEnvelope> {
        self.call(ApiMethod::OrderQuery, fields).await
    }

    /// Close an unpaid order.
    pub async fn close_order(&self, fields: FieldMap) -> GatewayResult<SignedEnvelope> {
        self.call(ApiMethod::CloseOrder, fields).await
    }

    /// Request a refund. Needs the client certificate.
    pub async fn refund(&self, fields: FieldMap) -> GatewayResult<SignedEnvelope> {
        self.call(ApiMethod::Refund, fields).await
    }

    /// Query refund status.
    pub async fn refund_query(&self, fields: FieldMap) -> GatewayResult<SignedEnvelope> {
        self.call(ApiMethod::RefundQuery, fields).await
    }

    /// Charge a payer-presented barcode.
    pub async fn micropay(&self, fields: FieldMap) -> GatewayResult<SignedEnvelope> {
        self.call(ApiMethod::Micropay, fields).await
    }

    /// Reverse a barcode payment. Needs the client certificate.
    pub async fn reverse(&self, fields: FieldMap) -> GatewayResult<SignedEnvelope> {
        self.call(ApiMethod::Reverse, fields).await
    }

    /// Shorten a mode-one QR URL.
    pub async fn short_url(&self, fields: FieldMap) -> GatewayResult<SignedEnvelope> {
        self.call(ApiMethod::ShortUrl, fields).await
    }

    /// Download a reconciliation bill.
    ///
    /// Returns the raw report text. When the provider answers with an XML
    /// envelope instead (no bill for that date, bad parameters) the result
    /// is an empty string.
    pub async fn download_bill(&self, fields: FieldMap) -> GatewayResult<String> {
        let scheme = self.scheme()?;
        let dispatched = self
            .dispatch(ApiMethod::DownloadBill.descriptor(), fields, None, &scheme)
            .await?;

        if paygate_wire::is_xml_envelope(&dispatched.body) {
            let reason = paygate_wire::decode(&dispatched.body)
                .ok()
                .and_then(|f| f.get(FIELD_RETURN_MSG).map(str::to_string))
                .unwrap_or_default();
            warn!(reason = %reason, "Bill download returned an envelope instead of a report");
            return Ok(String::new());
        }

        info!(bytes = dispatched.body.len(), "Bill downloaded");
        Ok(String::from_utf8_lossy(&dispatched.body).into_owned())
    }

    /// Send a telemetry report.
    ///
    /// Requires `interface_url`, `return_code`, `result_code` and
    /// `execute_time_`. The response is not signature-checked and never
    /// itself reported.
    pub async fn report(&self, fields: FieldMap) -> GatewayResult<FieldMap> {
        let scheme = self.scheme()?;
        let dispatched = self
            .dispatch(ApiMethod::Report.descriptor(), fields, None, &scheme)
            .await?;

        let response = paygate_wire::decode(&dispatched.body)?;
        let return_code = response.get(FIELD_RETURN_CODE).map(str::to_string);
        match return_code.as_deref() {
            Some(STATUS_SUCCESS) => Ok(response),
            Some(code) => Err(GatewayError::provider(
                code,
                response.get(FIELD_RETURN_MSG).unwrap_or_default(),
            )),
            None => Err(GatewayError::malformed("missing return_code")),
        }
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("config", &self.config)
            .field("external_signer", &self.signer.is_some())
            .finish()
    }
}
