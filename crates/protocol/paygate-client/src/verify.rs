//! Response and notification verification.

use paygate_crypto::SignScheme;
use paygate_types::constants::{
    FIELD_RESULT_CODE, FIELD_RETURN_CODE, FIELD_RETURN_MSG, FIELD_SIGN, STATUS_SUCCESS,
};
use paygate_types::FieldMap;
use tracing::warn;

use crate::error::{GatewayError, GatewayResult};

/// A decoded response whose signature has been checked.
///
/// Holding one means the provider accepted the call (`return_code` is
/// `SUCCESS`) and the fields are authentic. The business outcome
/// (`result_code`) is still the caller's to inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedEnvelope {
    fields: FieldMap,
    signature: String,
}

impl SignedEnvelope {
    /// Field value by name. The signature is not included.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key)
    }

    /// All fields except `sign`.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// The verified signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Whether the business result is also a success.
    pub fn is_business_success(&self) -> bool {
        self.fields.is(FIELD_RESULT_CODE, STATUS_SUCCESS)
    }

    /// Consume into the field map, without `sign`.
    pub fn into_fields(self) -> FieldMap {
        self.fields
    }
}

/// Verify a decoded response.
///
/// Checks run in this order:
/// 1. a present but mismatched `sign` fails with [`GatewayError::InvalidSignature`];
/// 2. a missing `return_code` fails with [`GatewayError::MalformedResponse`];
/// 3. a non-`SUCCESS` `return_code` fails with [`GatewayError::Provider`];
/// 4. a `SUCCESS` envelope without `sign` fails with [`GatewayError::InvalidSignature`].
///
/// Provider failure envelopes are usually unsigned, which is why a missing
/// signature is only fatal once `return_code` says `SUCCESS`.
pub fn verify_fields(fields: FieldMap, key: &str, scheme: &SignScheme) -> GatewayResult<SignedEnvelope> {
    check_signature(&fields, key, scheme)?;
    check_envelope(fields)
}

/// Fail with [`GatewayError::InvalidSignature`] when a `sign` field is
/// present and does not match. An absent `sign` passes.
pub fn check_signature(fields: &FieldMap, key: &str, scheme: &SignScheme) -> GatewayResult<()> {
    if fields.signature().is_some() && !paygate_crypto::verify(fields, key, scheme)? {
        warn!("Response signature mismatch");
        return Err(GatewayError::InvalidSignature);
    }
    Ok(())
}

/// Steps 2 to 4 of [`verify_fields`], for fields whose signature has
/// already been checked.
pub(crate) fn check_envelope(mut fields: FieldMap) -> GatewayResult<SignedEnvelope> {
    let Some(return_code) = fields.get(FIELD_RETURN_CODE) else {
        return Err(GatewayError::malformed("missing return_code"));
    };
    if return_code != STATUS_SUCCESS {
        return Err(GatewayError::provider(
            return_code,
            fields.get(FIELD_RETURN_MSG).unwrap_or_default(),
        ));
    }

    let signature = fields
        .remove(FIELD_SIGN)
        .ok_or(GatewayError::InvalidSignature)?;
    Ok(SignedEnvelope { fields, signature })
}

/// Decode and verify a raw response body.
pub fn verify_response(raw: &[u8], key: &str, scheme: &SignScheme) -> GatewayResult<SignedEnvelope> {
    let fields = paygate_wire::decode(raw)?;
    verify_fields(fields, key, scheme)
}
