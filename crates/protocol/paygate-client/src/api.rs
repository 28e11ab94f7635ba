//! Static descriptors for every supported provider method.
//!
//! Each [`ApiDescriptor`] fixes the endpoint, the default timeout, whether a
//! client certificate is needed, which caller fields are required and which
//! fields the client fills in itself.

use std::fmt;
use std::time::Duration;

use paygate_types::constants::{
    FIELD_OUT_TRADE_NO, FIELD_PRODUCT_ID, FIELD_TRADE_TYPE, FIELD_TRANSACTION_ID,
};
use paygate_types::FieldMap;

use crate::error::{GatewayError, GatewayResult};

/// Provider API host.
pub const API_BASE: &str = "https://api.mch.weixin.qq.com";

/// Session exchange endpoint for mini-program logins.
pub const SESSION_URL: &str = "https://api.weixin.qq.com/sns/jscode2session";

/// Prefix of a mode-one QR payment URL.
pub const QR_URL_PREFIX: &str = "weixin://wxpay/bizpayurl?";

/// Timeout for ordinary calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(6);
/// Timeout for barcode payments, which may wait on the payer.
pub const MICROPAY_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for telemetry reports.
pub const REPORT_TIMEOUT: Duration = Duration::from_secs(1);
/// Timeout for the session exchange.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(3);
/// Timeout for the unified order behind a mode-two QR payment URL.
pub const PAY_URL_TIMEOUT: Duration = Duration::from_secs(30);

/// A provider method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiMethod {
    UnifiedOrder,
    OrderQuery,
    CloseOrder,
    Refund,
    RefundQuery,
    DownloadBill,
    Micropay,
    Reverse,
    Report,
    ShortUrl,
    /// Mode-one QR URL; built locally, never dispatched.
    BizPayUrl,
}

impl ApiMethod {
    /// Every method, in declaration order.
    pub const ALL: [ApiMethod; 11] = [
        Self::UnifiedOrder,
        Self::OrderQuery,
        Self::CloseOrder,
        Self::Refund,
        Self::RefundQuery,
        Self::DownloadBill,
        Self::Micropay,
        Self::Reverse,
        Self::Report,
        Self::ShortUrl,
        Self::BizPayUrl,
    ];

    /// The static descriptor of this method.
    pub fn descriptor(&self) -> &'static ApiDescriptor {
        match self {
            Self::UnifiedOrder => &UNIFIED_ORDER,
            Self::OrderQuery => &ORDER_QUERY,
            Self::CloseOrder => &CLOSE_ORDER,
            Self::Refund => &REFUND,
            Self::RefundQuery => &REFUND_QUERY,
            Self::DownloadBill => &DOWNLOAD_BILL,
            Self::Micropay => &MICROPAY,
            Self::Reverse => &REVERSE,
            Self::Report => &REPORT,
            Self::ShortUrl => &SHORT_URL,
            Self::BizPayUrl => &BIZ_PAY_URL,
        }
    }

    /// Kebab-case name, as used on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UnifiedOrder => "unified-order",
            Self::OrderQuery => "order-query",
            Self::CloseOrder => "close-order",
            Self::Refund => "refund",
            Self::RefundQuery => "refund-query",
            Self::DownloadBill => "download-bill",
            Self::Micropay => "micropay",
            Self::Reverse => "reverse",
            Self::Report => "report",
            Self::ShortUrl => "short-url",
            Self::BizPayUrl => "biz-pay-url",
        }
    }

    /// Look a method up by its kebab-case name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.name() == name)
    }
}

impl fmt::Display for ApiMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A precondition on the caller's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The field must be set.
    Field(&'static str),
    /// At least one of the fields must be set.
    AnyOf(&'static [&'static str]),
    /// `then` must be set when `field` equals `equals`.
    When {
        field: &'static str,
        equals: &'static str,
        then: &'static str,
    },
}

impl Requirement {
    /// Check this requirement. Empty values count as absent.
    pub fn check(&self, fields: &FieldMap) -> GatewayResult<()> {
        match self {
            Self::Field(name) => {
                if !fields.is_set(name) {
                    return Err(GatewayError::missing_field(*name));
                }
            }
            Self::AnyOf(names) => {
                if !names.iter().any(|name| fields.is_set(name)) {
                    return Err(GatewayError::missing_field(names.join("|")));
                }
            }
            Self::When {
                field,
                equals,
                then,
            } => {
                if fields.is(field, equals) && !fields.is_set(then) {
                    return Err(GatewayError::missing_field(*then));
                }
            }
        }
        Ok(())
    }
}

/// A field the client computes rather than the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Injection {
    /// `spbill_create_ip` from the configured client address, if unset.
    ClientIp,
    /// `notify_url` from configuration, if unset. Applied before validation.
    NotifyUrl,
    /// `time_stamp` as current unix seconds.
    TimeStamp,
    /// `user_ip` (if unset) and `time` for telemetry reports.
    ReportContext,
}

/// Static description of one provider method.
#[derive(Debug)]
pub struct ApiDescriptor {
    pub method: ApiMethod,
    /// Full endpoint URL; `None` for locally built URLs.
    pub url: Option<&'static str>,
    pub timeout: Duration,
    pub requires_cert: bool,
    /// Whether the outcome is reported to the telemetry endpoint.
    pub reports_outcome: bool,
    pub requirements: &'static [Requirement],
    pub injections: &'static [Injection],
}

impl ApiDescriptor {
    /// The endpoint URL, or a configuration error for local-only methods.
    pub fn endpoint(&self) -> GatewayResult<&'static str> {
        self.url.ok_or_else(|| {
            GatewayError::config(format!("{} is not dispatched to an endpoint", self.method))
        })
    }

    /// Check every requirement in declaration order.
    pub fn validate(&self, fields: &FieldMap) -> GatewayResult<()> {
        self.requirements
            .iter()
            .try_for_each(|requirement| requirement.check(fields))
    }

    /// Whether this method injects `injection`.
    pub fn injects(&self, injection: Injection) -> bool {
        self.injections.contains(&injection)
    }
}

// =============================================================================
// Method table
// =============================================================================

const ORDER_REF: Requirement = Requirement::AnyOf(&[FIELD_OUT_TRADE_NO, FIELD_TRANSACTION_ID]);

static UNIFIED_ORDER: ApiDescriptor = ApiDescriptor {
    method: ApiMethod::UnifiedOrder,
    url: Some("https://api.mch.weixin.qq.com/pay/unifiedorder"),
    timeout: DEFAULT_TIMEOUT,
    requires_cert: false,
    reports_outcome: true,
    requirements: &[
        Requirement::Field(FIELD_OUT_TRADE_NO),
        Requirement::Field("body"),
        Requirement::Field("total_fee"),
        Requirement::Field(FIELD_TRADE_TYPE),
        Requirement::When {
            field: FIELD_TRADE_TYPE,
            equals: "JSAPI",
            then: "openid",
        },
        Requirement::When {
            field: FIELD_TRADE_TYPE,
            equals: "NATIVE",
            then: FIELD_PRODUCT_ID,
        },
        Requirement::Field("notify_url"),
    ],
    injections: &[Injection::NotifyUrl, Injection::ClientIp],
};

static ORDER_QUERY: ApiDescriptor = ApiDescriptor {
    method: ApiMethod::OrderQuery,
    url: Some("https://api.mch.weixin.qq.com/pay/orderquery"),
    timeout: DEFAULT_TIMEOUT,
    requires_cert: false,
    reports_outcome: true,
    requirements: &[ORDER_REF],
    injections: &[],
};

static CLOSE_ORDER: ApiDescriptor = ApiDescriptor {
    method: ApiMethod::CloseOrder,
    url: Some("https://api.mch.weixin.qq.com/pay/closeorder"),
    timeout: DEFAULT_TIMEOUT,
    requires_cert: false,
    reports_outcome: true,
    requirements: &[Requirement::Field(FIELD_OUT_TRADE_NO)],
    injections: &[],
};

static REFUND: ApiDescriptor = ApiDescriptor {
    method: ApiMethod::Refund,
    url: Some("https://api.mch.weixin.qq.com/secapi/pay/refund"),
    timeout: DEFAULT_TIMEOUT,
    requires_cert: true,
    reports_outcome: true,
    requirements: &[
        ORDER_REF,
        Requirement::Field("out_refund_no"),
        Requirement::Field("total_fee"),
        Requirement::Field("refund_fee"),
        Requirement::Field("op_user_id"),
    ],
    injections: &[],
};

static REFUND_QUERY: ApiDescriptor = ApiDescriptor {
    method: ApiMethod::RefundQuery,
    url: Some("https://api.mch.weixin.qq.com/pay/refundquery"),
    timeout: DEFAULT_TIMEOUT,
    requires_cert: false,
    reports_outcome: true,
    requirements: &[Requirement::AnyOf(&[
        FIELD_OUT_TRADE_NO,
        FIELD_TRANSACTION_ID,
        "out_refund_no",
        "refund_id",
    ])],
    injections: &[],
};

static DOWNLOAD_BILL: ApiDescriptor = ApiDescriptor {
    method: ApiMethod::DownloadBill,
    url: Some("https://api.mch.weixin.qq.com/pay/downloadbill"),
    timeout: DEFAULT_TIMEOUT,
    requires_cert: false,
    reports_outcome: false,
    requirements: &[Requirement::Field("bill_date")],
    injections: &[],
};

static MICROPAY: ApiDescriptor = ApiDescriptor {
    method: ApiMethod::Micropay,
    url: Some("https://api.mch.weixin.qq.com/pay/micropay"),
    timeout: MICROPAY_TIMEOUT,
    requires_cert: false,
    reports_outcome: true,
    requirements: &[
        Requirement::Field("body"),
        Requirement::Field(FIELD_OUT_TRADE_NO),
        Requirement::Field("total_fee"),
        Requirement::Field("auth_code"),
    ],
    injections: &[Injection::ClientIp],
};

static REVERSE: ApiDescriptor = ApiDescriptor {
    method: ApiMethod::Reverse,
    url: Some("https://api.mch.weixin.qq.com/secapi/pay/reverse"),
    timeout: DEFAULT_TIMEOUT,
    requires_cert: true,
    reports_outcome: true,
    requirements: &[ORDER_REF],
    injections: &[],
};

static REPORT: ApiDescriptor = ApiDescriptor {
    method: ApiMethod::Report,
    url: Some("https://api.mch.weixin.qq.com/payitil/report"),
    timeout: REPORT_TIMEOUT,
    requires_cert: false,
    reports_outcome: false,
    requirements: &[
        Requirement::Field("interface_url"),
        Requirement::Field("return_code"),
        Requirement::Field("result_code"),
        Requirement::Field("execute_time_"),
    ],
    injections: &[Injection::ReportContext],
};

static SHORT_URL: ApiDescriptor = ApiDescriptor {
    method: ApiMethod::ShortUrl,
    url: Some("https://api.mch.weixin.qq.com/tools/shorturl"),
    timeout: DEFAULT_TIMEOUT,
    requires_cert: false,
    reports_outcome: true,
    requirements: &[Requirement::Field("long_url")],
    injections: &[],
};

static BIZ_PAY_URL: ApiDescriptor = ApiDescriptor {
    method: ApiMethod::BizPayUrl,
    url: None,
    timeout: DEFAULT_TIMEOUT,
    requires_cert: false,
    reports_outcome: false,
    requirements: &[Requirement::Field(FIELD_PRODUCT_ID)],
    injections: &[Injection::TimeStamp],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_share_api_base() {
        for method in ApiMethod::ALL {
            if let Some(url) = method.descriptor().url {
                assert!(url.starts_with(API_BASE), "{} -> {}", method, url);
            }
            assert_eq!(method.descriptor().method, method);
        }
    }

    #[test]
    fn test_cert_gated_methods() {
        let gated: Vec<ApiMethod> = ApiMethod::ALL
            .into_iter()
            .filter(|m| m.descriptor().requires_cert)
            .collect();
        assert_eq!(gated, vec![ApiMethod::Refund, ApiMethod::Reverse]);
    }

    #[test]
    fn test_timeouts() {
        assert_eq!(ApiMethod::Micropay.descriptor().timeout, Duration::from_secs(10));
        assert_eq!(ApiMethod::Report.descriptor().timeout, Duration::from_secs(1));
        assert_eq!(ApiMethod::OrderQuery.descriptor().timeout, Duration::from_secs(6));
    }

    #[test]
    fn test_method_names_round_trip() {
        for method in ApiMethod::ALL {
            assert_eq!(ApiMethod::from_name(method.name()), Some(method));
        }
        assert_eq!(ApiMethod::from_name("nope"), None);
    }

    #[test]
    fn test_group_requirement_renders_members() {
        let err = ApiMethod::OrderQuery
            .descriptor()
            .validate(&FieldMap::new())
            .unwrap_err();
        match err {
            GatewayError::MissingRequiredField(name) => {
                assert_eq!(name, "out_trade_no|transaction_id")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let fields = FieldMap::from([("out_trade_no", ""), ("transaction_id", "")]);
        assert!(ApiMethod::OrderQuery.descriptor().validate(&fields).is_err());
        let fields = FieldMap::from([("transaction_id", "4200000001")]);
        assert!(ApiMethod::OrderQuery.descriptor().validate(&fields).is_ok());
    }

    #[test]
    fn test_conditional_requirements() {
        let desc = ApiMethod::UnifiedOrder.descriptor();
        let base = FieldMap::from([
            ("out_trade_no", "T1"),
            ("body", "test"),
            ("total_fee", "1"),
            ("notify_url", "https://example.com/n"),
        ]);

        let jsapi = base.clone().with("trade_type", "JSAPI");
        assert!(matches!(
            desc.validate(&jsapi),
            Err(GatewayError::MissingRequiredField(f)) if f == "openid"
        ));
        assert!(desc.validate(&jsapi.with("openid", "o1")).is_ok());

        let native = base.clone().with("trade_type", "NATIVE");
        assert!(matches!(
            desc.validate(&native),
            Err(GatewayError::MissingRequiredField(f)) if f == "product_id"
        ));

        assert!(desc.validate(&base.with("trade_type", "APP")).is_ok());
    }

    #[test]
    fn test_requirements_checked_in_order() {
        let err = ApiMethod::Refund
            .descriptor()
            .validate(&FieldMap::from([("out_trade_no", "T1")]))
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingRequiredField(f) if f == "out_refund_no"));
    }

    #[test]
    fn test_local_method_has_no_endpoint() {
        assert!(ApiMethod::BizPayUrl.descriptor().endpoint().is_err());
        assert!(ApiMethod::ShortUrl.descriptor().endpoint().is_ok());
    }
}
