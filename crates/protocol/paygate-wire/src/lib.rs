//! Wire format serialization for paygate.
//!
//! The provider speaks a flat, single-root XML envelope:
//!
//! ```text
//! <xml>
//!   <appid><![CDATA[wx2421b1c4370ec43b]]></appid>
//!   <total_fee>100</total_fee>
//!   <sign><![CDATA[0CB01533B8C1EF103065174F50BCA001]]></sign>
//! </xml>
//! ```
//!
//! Every top-level field is a same-named child element. Numeric values are
//! written as text, everything else as CDATA. Decoding refuses document type
//! declarations, processing instructions, nested elements and unknown entity
//! references, so no external entity is ever resolved.
//!
//! The QR-code payment mode renders a field mapping as a bare
//! `k=v&k=v` query string instead; see [`to_query_string`].
//!
//! # Example
//!
//! ```
//! use paygate_types::FieldMap;
//! use paygate_wire::{decode, encode};
//!
//! let fields = FieldMap::from([("body", "test"), ("total_fee", "100")]);
//! let bytes = encode(&fields).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), fields);
//! ```

mod codec;
mod error;

pub use codec::{decode, encode, is_xml_envelope, to_query_string};
pub use error::{WireError, WireResult};
