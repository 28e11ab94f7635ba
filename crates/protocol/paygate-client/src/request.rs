//! Request assembly: validate, inject, sign.

use chrono::{Local, Utc};
use paygate_crypto::{generate_nonce, SignScheme, SignType};
use paygate_types::constants::{
    FIELD_APPID, FIELD_MCH_ID, FIELD_NONCE_STR, FIELD_NOTIFY_URL, FIELD_SIGN, FIELD_SIGN_TYPE,
    FIELD_SPBILL_CREATE_IP, FIELD_TIME, FIELD_TIME_STAMP, FIELD_USER_IP,
};
use paygate_types::FieldMap;
use tracing::trace;

use crate::api::{ApiDescriptor, Injection};
use crate::config::GatewayConfig;
use crate::error::GatewayResult;

/// Format of the `time` field on telemetry reports.
const REPORT_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Turns caller fields into a signed request for one method.
///
/// Credentials (`appid`, `mch_id`) and the nonce always come from the
/// builder; any caller-supplied values for them are replaced.
pub struct RequestBuilder<'a> {
    config: &'a GatewayConfig,
    scheme: &'a SignScheme,
}

impl<'a> RequestBuilder<'a> {
    /// Create a builder over a configuration and a resolved scheme.
    pub fn new(config: &'a GatewayConfig, scheme: &'a SignScheme) -> Self {
        Self { config, scheme }
    }

    /// Validate, inject and sign `fields` for `descriptor`.
    ///
    /// Fails with a validation error before anything is generated, so a
    /// rejected request consumes no nonce.
    pub fn build(&self, descriptor: &ApiDescriptor, mut fields: FieldMap) -> GatewayResult<FieldMap> {
        if descriptor.injects(Injection::NotifyUrl) {
            if let Some(url) = &self.config.notify_url {
                fields.insert_if_unset(FIELD_NOTIFY_URL, url);
            }
        }

        descriptor.validate(&fields)?;

        fields.insert(FIELD_APPID, &self.config.app_id);
        fields.insert(FIELD_MCH_ID, &self.config.mch_id);
        for injection in descriptor.injections {
            self.inject(*injection, &mut fields);
        }
        fields.insert(FIELD_NONCE_STR, generate_nonce(self.config.nonce_length));

        sign_fields(&mut fields, &self.config.key, self.scheme)?;
        trace!(method = %descriptor.method, fields = fields.len(), "Request built");
        Ok(fields)
    }

    fn inject(&self, injection: Injection, fields: &mut FieldMap) {
        match injection {
            Injection::ClientIp => {
                fields.insert_if_unset(FIELD_SPBILL_CREATE_IP, &self.config.client_ip);
            }
            Injection::NotifyUrl => {}
            Injection::TimeStamp => {
                fields.insert(FIELD_TIME_STAMP, Utc::now().timestamp());
            }
            Injection::ReportContext => {
                fields.insert_if_unset(FIELD_USER_IP, &self.config.client_ip);
                fields.insert(FIELD_TIME, Local::now().format(REPORT_TIME_FORMAT));
            }
        }
    }
}

/// Sign `fields` in place.
///
/// Under HMAC-SHA256 a `sign_type` field is added first so that the
/// provider knows how to verify; it is part of the signed content.
pub fn sign_fields(fields: &mut FieldMap, key: &str, scheme: &SignScheme) -> GatewayResult<()> {
    if scheme.sign_type() == SignType::HmacSha256 {
        fields.insert(FIELD_SIGN_TYPE, SignType::HmacSha256.as_str());
    }
    let signature = paygate_crypto::sign(fields, key, scheme)?;
    fields.insert(FIELD_SIGN, signature);
    Ok(())
}
