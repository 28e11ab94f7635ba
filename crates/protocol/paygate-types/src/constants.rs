//! Protocol constants: field names, status codes and wire defaults.

// =============================================================================
// Status Codes
// =============================================================================

/// Value of `return_code` / `result_code` on success.
pub const STATUS_SUCCESS: &str = "SUCCESS";

/// Value of `return_code` / `result_code` on failure.
pub const STATUS_FAIL: &str = "FAIL";

// =============================================================================
// Envelope Fields
// =============================================================================

/// Signature field. Never part of the signature base string.
pub const FIELD_SIGN: &str = "sign";

/// Signature scheme selector sent when a non-default symmetric scheme is used.
pub const FIELD_SIGN_TYPE: &str = "sign_type";

/// Outer (communication) status.
pub const FIELD_RETURN_CODE: &str = "return_code";

/// Outer status message.
pub const FIELD_RETURN_MSG: &str = "return_msg";

/// Business result status.
pub const FIELD_RESULT_CODE: &str = "result_code";

/// Business error code.
pub const FIELD_ERR_CODE: &str = "err_code";

/// Business error description.
pub const FIELD_ERR_CODE_DES: &str = "err_code_des";

// =============================================================================
// Injected Fields
// =============================================================================

/// Application id.
pub const FIELD_APPID: &str = "appid";

/// Merchant id.
pub const FIELD_MCH_ID: &str = "mch_id";

/// Per-call random string.
pub const FIELD_NONCE_STR: &str = "nonce_str";

/// Terminal IP for order creation and micropay.
pub const FIELD_SPBILL_CREATE_IP: &str = "spbill_create_ip";

/// Asynchronous notification callback URL.
pub const FIELD_NOTIFY_URL: &str = "notify_url";

/// Unix timestamp (seconds) for QR-code URLs.
pub const FIELD_TIME_STAMP: &str = "time_stamp";

/// Caller IP for telemetry reports.
pub const FIELD_USER_IP: &str = "user_ip";

/// Local report time (`YYYYmmddHHMMSS`) for telemetry reports.
pub const FIELD_TIME: &str = "time";

// =============================================================================
// Business Fields
// =============================================================================

/// Merchant order number.
pub const FIELD_OUT_TRADE_NO: &str = "out_trade_no";

/// Provider transaction id.
pub const FIELD_TRANSACTION_ID: &str = "transaction_id";

/// Trade type (`JSAPI`, `NATIVE`, `APP`, ...).
pub const FIELD_TRADE_TYPE: &str = "trade_type";

/// Device info echoed in telemetry.
pub const FIELD_DEVICE_INFO: &str = "device_info";

/// Product id for QR-code payments.
pub const FIELD_PRODUCT_ID: &str = "product_id";

// =============================================================================
// Telemetry Fields
// =============================================================================

/// Reported endpoint URL.
pub const FIELD_INTERFACE_URL: &str = "interface_url";

/// Reported call latency in milliseconds.
pub const FIELD_EXECUTE_TIME: &str = "execute_time_";

// =============================================================================
// Defaults
// =============================================================================

/// Default nonce length.
pub const DEFAULT_NONCE_LENGTH: usize = 32;

/// Proxy host sentinel meaning "no proxy".
pub const NO_PROXY_HOST: &str = "0.0.0.0";

/// Proxy port sentinel meaning "no proxy".
pub const NO_PROXY_PORT: u16 = 0;

/// Root element of every wire envelope.
pub const XML_ROOT: &str = "xml";
