//! Cryptographic primitives for the paygate payment gateway client.
//!
//! This crate provides:
//!
//! - **Canonical signing**: the sorted `k=v&...&key=<key>` base string and
//!   the MD5 / HMAC-SHA256 digests over it, rendered as uppercase hex
//! - **External signing**: a [`PrivateKeySigner`] seam for the asymmetric
//!   (RSA) scheme, whose primitive lives outside this crate
//! - **Nonces**: fresh lowercase-alphanumeric strings per request
//!
//! # Example
//!
//! ```
//! use paygate_crypto::{sign, verify, generate_nonce, SignScheme};
//! use paygate_types::FieldMap;
//!
//! let mut fields = FieldMap::from([("appid", "wx1"), ("mch_id", "10000100")]);
//! fields.insert("nonce_str", generate_nonce(32));
//!
//! let signature = sign(&fields, "secret", &SignScheme::Md5).unwrap();
//! fields.insert("sign", &signature);
//!
//! assert!(verify(&fields, "secret", &SignScheme::Md5).unwrap());
//! ```

mod error;
mod nonce;
mod signer;

pub use error::{CryptoError, CryptoResult};
pub use nonce::generate_nonce;
pub use signer::{canonical_string, sign, verify, PrivateKeySigner, SignScheme, SignType};
