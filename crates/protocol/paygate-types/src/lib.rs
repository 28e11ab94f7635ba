//! Data structures for the paygate payment gateway client.
//!
//! This crate contains no business logic, only the generic [`FieldMap`]
//! every request and response payload is expressed as, and the protocol
//! constants (field names, status codes) shared by the other crates.
//!
//! # Example
//!
//! ```
//! use paygate_types::{FieldMap, constants::FIELD_SIGN};
//!
//! let mut fields = FieldMap::new();
//! fields.insert("out_trade_no", "T001");
//! fields.insert("total_fee", 100);
//! fields.insert(FIELD_SIGN, "ABC");
//!
//! assert_eq!(fields.get("total_fee"), Some("100"));
//! assert_eq!(fields.unsigned().count(), 2);
//! ```

/// Crate version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod constants;
pub mod fields;

pub use fields::FieldMap;
