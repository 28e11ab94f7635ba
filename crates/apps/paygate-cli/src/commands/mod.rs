//! CLI command implementations.

pub mod bill;
pub mod call;
pub mod qr_url;
pub mod session;
pub mod sign;
pub mod verify_notify;

// Re-export command handlers
pub use bill::bill;
pub use call::call;
pub use qr_url::qr_url;
pub use session::session;
pub use sign::sign;
pub use verify_notify::verify_notify;

use paygate_client::FieldMap;

use crate::error::{CliError, CliResult};

/// Parse `key=value` arguments into a field map.
///
/// Values may contain `=`; only the first one splits.
pub fn parse_fields(args: &[String]) -> CliResult<FieldMap> {
    let mut fields = FieldMap::new();
    for arg in args {
        let (key, value) = arg
            .split_once('=')
            .ok_or_else(|| CliError::user(format!("Expected key=value, got '{}'", arg)))?;
        if key.is_empty() {
            return Err(CliError::user(format!("Empty field name in '{}'", arg)));
        }
        fields.insert(key, value);
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fields() {
        let fields = parse_fields(&["body=a=b".to_string(), "total_fee=1".to_string()]).unwrap();
        assert_eq!(fields.get("body"), Some("a=b"));
        assert_eq!(fields.get("total_fee"), Some("1"));
    }

    #[test]
    fn test_parse_fields_rejects_bare_word() {
        assert!(matches!(
            parse_fields(&["body".to_string()]),
            Err(CliError::User(_))
        ));
        assert!(parse_fields(&["=x".to_string()]).is_err());
    }
}
