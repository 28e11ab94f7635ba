//! Canonical signature construction.
//!
//! Every scheme signs the same canonical base string:
//! ```text
//! k1=v1&k2=v2&...&kn=vn        keys byte-wise ascending, `sign` and empty values skipped
//! ```
//! The symmetric schemes append `&key=<shared key>` and render the digest as
//! uppercase hex. The asymmetric scheme hands the bare base string to a
//! [`PrivateKeySigner`].

use std::fmt;
use std::sync::Arc;

use constant_time_eq::constant_time_eq;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use paygate_types::FieldMap;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{CryptoError, CryptoResult};

type HmacSha256 = Hmac<Sha256>;

/// Signature scheme selector, as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignType {
    /// MD5 over the keyed base string (provider default).
    #[default]
    #[serde(alias = "MD5")]
    Md5,
    /// HMAC-SHA256 keyed with the shared key.
    #[serde(alias = "HMAC-SHA256")]
    HmacSha256,
    /// Private-key signature from an external provider (mobile channel).
    #[serde(alias = "RSA")]
    Rsa,
}

impl SignType {
    /// Wire name used in the `sign_type` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::HmacSha256 => "HMAC-SHA256",
            Self::Rsa => "RSA",
        }
    }
}

impl fmt::Display for SignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Asymmetric signing primitive supplied by an external crypto provider.
///
/// Implementations receive the canonical base string (no key suffix).
pub trait PrivateKeySigner: Send + Sync {
    /// Sign the base string, returning the encoded signature.
    fn sign(&self, message: &[u8]) -> CryptoResult<String>;

    /// Verify an encoded signature over the base string.
    fn verify(&self, message: &[u8], signature: &str) -> bool;
}

/// A concrete signing scheme, ready to use.
#[derive(Clone, Default)]
pub enum SignScheme {
    /// MD5, uppercase hex.
    #[default]
    Md5,
    /// HMAC-SHA256, uppercase hex.
    HmacSha256,
    /// External private-key signer.
    External(Arc<dyn PrivateKeySigner>),
}

impl SignScheme {
    /// Resolve a configured [`SignType`] into a scheme.
    ///
    /// `Rsa` needs an external signer; without one this fails with
    /// [`CryptoError::MissingSigningKey`].
    pub fn resolve(
        sign_type: SignType,
        external: Option<&Arc<dyn PrivateKeySigner>>,
    ) -> CryptoResult<Self> {
        match sign_type {
            SignType::Md5 => Ok(Self::Md5),
            SignType::HmacSha256 => Ok(Self::HmacSha256),
            SignType::Rsa => external
                .map(|signer| Self::External(Arc::clone(signer)))
                .ok_or(CryptoError::MissingSigningKey),
        }
    }

    /// The configuration-level type of this scheme.
    pub fn sign_type(&self) -> SignType {
        match self {
            Self::Md5 => SignType::Md5,
            Self::HmacSha256 => SignType::HmacSha256,
            Self::External(_) => SignType::Rsa,
        }
    }
}

impl fmt::Debug for SignScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignScheme({})", self.sign_type())
    }
}

/// Build the canonical base string: every non-`sign`, non-empty field in
/// key order, joined as `k=v` pairs with `&`.
pub fn canonical_string(fields: &FieldMap) -> String {
    let mut out = String::new();
    for (k, v) in fields.unsigned().filter(|(_, v)| !v.is_empty()) {
        if !out.is_empty() {
            out.push('&');
        }
        out.push_str(k);
        out.push('=');
        out.push_str(v);
    }
    out
}

/// Compute the signature of `fields` under `scheme`.
///
/// Any existing `sign` field is ignored. For the symmetric schemes an empty
/// `key` fails with [`CryptoError::MissingSigningKey`]; the external scheme
/// ignores `key`.
pub fn sign(fields: &FieldMap, key: &str, scheme: &SignScheme) -> CryptoResult<String> {
    let base = canonical_string(fields);
    match scheme {
        SignScheme::Md5 => {
            let keyed = keyed_base(base, key)?;
            Ok(hex::encode_upper(Md5::digest(keyed.as_bytes())))
        }
        SignScheme::HmacSha256 => {
            let keyed = keyed_base(base, key)?;
            let mut mac = HmacSha256::new_from_slice(key.as_bytes())
                .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
            mac.update(keyed.as_bytes());
            Ok(hex::encode_upper(mac.finalize().into_bytes()))
        }
        SignScheme::External(signer) => signer.sign(base.as_bytes()),
    }
}

/// Check the `sign` field of `fields` against a freshly computed signature.
///
/// Returns `Ok(false)` when there is no `sign` field or it does not match.
/// Symmetric signatures are compared in constant time.
pub fn verify(fields: &FieldMap, key: &str, scheme: &SignScheme) -> CryptoResult<bool> {
    let Some(claimed) = fields.signature() else {
        return Ok(false);
    };
    match scheme {
        SignScheme::External(signer) => {
            Ok(signer.verify(canonical_string(fields).as_bytes(), claimed))
        }
        _ => {
            let expected = sign(fields, key, scheme)?;
            Ok(constant_time_eq(expected.as_bytes(), claimed.as_bytes()))
        }
    }
}

fn keyed_base(mut base: String, key: &str) -> CryptoResult<String> {
    if key.is_empty() {
        return Err(CryptoError::MissingSigningKey);
    }
    base.push_str("&key=");
    base.push_str(key);
    Ok(base)
}
