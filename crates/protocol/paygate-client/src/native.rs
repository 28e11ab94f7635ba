//! QR-code and mobile payment helpers.

use chrono::Utc;
use paygate_crypto::generate_nonce;
use paygate_types::constants::{FIELD_APPID, FIELD_PRODUCT_ID, FIELD_SIGN, FIELD_TRADE_TYPE};
use paygate_types::FieldMap;
use tracing::debug;

use crate::api::{ApiMethod, PAY_URL_TIMEOUT, QR_URL_PREFIX};
use crate::client::GatewayClient;
use crate::error::GatewayResult;
use crate::verify::SignedEnvelope;

/// `package` value the mobile SDK expects for app payments.
pub const APP_PACKAGE: &str = "Sign=WXPay";

/// Trade types that can be paid through a mode-two URL.
const PAY_URL_TRADE_TYPES: [&str; 2] = ["NATIVE", "APP"];

impl GatewayClient {
    /// Build the signed fields of a mode-one QR URL for `product_id`.
    pub fn bizpay_url_fields(&self, product_id: &str) -> GatewayResult<FieldMap> {
        self.build_request(
            ApiMethod::BizPayUrl,
            FieldMap::from([(FIELD_PRODUCT_ID, product_id)]),
        )
    }

    /// Build a mode-one QR URL (`weixin://wxpay/bizpayurl?...`).
    pub fn bizpay_url(&self, product_id: &str) -> GatewayResult<String> {
        let fields = self.bizpay_url_fields(product_id)?;
        Ok(format!("{}{}", QR_URL_PREFIX, paygate_wire::to_query_string(&fields)))
    }

    /// Like [`GatewayClient::bizpay_url`], but yields an empty string on any
    /// failure.
    pub fn prepay_url(&self, product_id: &str) -> String {
        match self.bizpay_url(product_id) {
            Ok(url) => url,
            Err(e) => {
                debug!(error = %e, "QR URL generation failed");
                String::new()
            }
        }
    }

    /// Mode-two payment: place a unified order for a NATIVE or APP trade
    /// with a 30 second timeout.
    ///
    /// Returns `None` for other trade types and on any failure.
    pub async fn pay_url(&self, fields: FieldMap) -> Option<SignedEnvelope> {
        let trade_type = fields.get(FIELD_TRADE_TYPE).unwrap_or_default();
        if !PAY_URL_TRADE_TYPES.contains(&trade_type) {
            debug!(trade_type, "Trade type has no payment URL");
            return None;
        }

        match self
            .call_with_timeout(ApiMethod::UnifiedOrder, fields, Some(PAY_URL_TIMEOUT))
            .await
        {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                debug!(error = %e, "Payment URL order failed");
                None
            }
        }
    }

    /// Signed parameters for the mobile SDK's payment call.
    ///
    /// Key names follow the SDK (`partnerid`, `prepayid`, `noncestr`,
    /// `timestamp`), not the server API. No network call is made.
    pub fn app_pay_params(&self, prepay_id: &str) -> GatewayResult<FieldMap> {
        let config = self.config();
        let mut params = FieldMap::new()
            .with(FIELD_APPID, &config.app_id)
            .with("partnerid", &config.mch_id)
            .with("prepayid", prepay_id)
            .with("package", APP_PACKAGE)
            .with("noncestr", generate_nonce(config.nonce_length))
            .with("timestamp", Utc::now().timestamp());

        let signature = paygate_crypto::sign(&params, &config.key, &self.scheme()?)?;
        params.insert(FIELD_SIGN, signature);
        Ok(params)
    }
}
