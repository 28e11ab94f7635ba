//! Post-call outcome reporting.
//!
//! After a primary call returns a decodable body, the client may send a
//! short sample (endpoint, latency, outcome codes) to the provider's
//! report endpoint. Whether it does is decided by [`ReportLevel`].

use std::time::Duration;

use paygate_types::constants::{
    FIELD_DEVICE_INFO, FIELD_ERR_CODE, FIELD_ERR_CODE_DES, FIELD_EXECUTE_TIME,
    FIELD_INTERFACE_URL, FIELD_OUT_TRADE_NO, FIELD_RESULT_CODE, FIELD_RETURN_CODE,
    FIELD_RETURN_MSG, STATUS_SUCCESS,
};
use paygate_types::FieldMap;
use serde::{Deserialize, Serialize};

/// Response fields copied verbatim into a telemetry sample when present.
const COPIED_FIELDS: [&str; 7] = [
    FIELD_RETURN_CODE,
    FIELD_RETURN_MSG,
    FIELD_RESULT_CODE,
    FIELD_ERR_CODE,
    FIELD_ERR_CODE_DES,
    FIELD_OUT_TRADE_NO,
    FIELD_DEVICE_INFO,
];

/// Which call outcomes are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLevel {
    /// Never report.
    Off,
    /// Report only calls whose business result is not a success.
    #[default]
    ErrorsOnly,
    /// Report every call.
    All,
}

impl ReportLevel {
    /// Whether a call with this decoded response should be reported.
    ///
    /// Under [`ReportLevel::ErrorsOnly`], a response counts as successful
    /// only when both `return_code` and `result_code` are `SUCCESS`.
    pub fn should_report(&self, response: &FieldMap) -> bool {
        match self {
            Self::Off => false,
            Self::All => true,
            Self::ErrorsOnly => {
                !(response.is(FIELD_RETURN_CODE, STATUS_SUCCESS)
                    && response.is(FIELD_RESULT_CODE, STATUS_SUCCESS))
            }
        }
    }

    /// Map the provider's numeric level (0, 1, 2) onto a report level.
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(Self::Off),
            1 => Some(Self::ErrorsOnly),
            2 => Some(Self::All),
            _ => None,
        }
    }
}

/// One reported call outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetrySample {
    interface_url: String,
    execute_time_ms: u128,
    outcome: FieldMap,
}

impl TelemetrySample {
    /// Build a sample from a decoded response.
    ///
    /// A failure envelope carries no `result_code`; its `return_code` stands
    /// in so that the report request is complete.
    pub fn from_response(interface_url: &str, elapsed: Duration, response: &FieldMap) -> Self {
        let mut outcome: FieldMap = COPIED_FIELDS
            .iter()
            .filter_map(|name| response.get(name).map(|value| (*name, value)))
            .collect();
        if let Some(return_code) = response.get(FIELD_RETURN_CODE) {
            outcome.insert_if_unset(FIELD_RESULT_CODE, return_code);
        }

        Self {
            interface_url: interface_url.to_string(),
            execute_time_ms: elapsed.as_millis(),
            outcome,
        }
    }

    /// Endpoint URL of the reported call.
    pub fn interface_url(&self) -> &str {
        &self.interface_url
    }

    /// Wall-clock latency of the reported call in milliseconds.
    pub fn execute_time_ms(&self) -> u128 {
        self.execute_time_ms
    }

    /// Convert into the report request's caller fields.
    ///
    /// `user_ip` and `time` are filled in by the request builder.
    pub fn into_fields(self) -> FieldMap {
        let mut fields = self.outcome;
        fields.insert(FIELD_INTERFACE_URL, self.interface_url);
        fields.insert(FIELD_EXECUTE_TIME, self.execute_time_ms);
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(return_code: &str, result_code: &str) -> FieldMap {
        FieldMap::from([
            (FIELD_RETURN_CODE, return_code),
            (FIELD_RESULT_CODE, result_code),
        ])
    }

    #[test]
    fn test_report_level_gating() {
        let ok = response("SUCCESS", "SUCCESS");
        let biz_fail = response("SUCCESS", "FAIL");
        let comm_fail = response("FAIL", "");

        assert!(!ReportLevel::Off.should_report(&biz_fail));
        assert!(!ReportLevel::ErrorsOnly.should_report(&ok));
        assert!(ReportLevel::ErrorsOnly.should_report(&biz_fail));
        assert!(ReportLevel::ErrorsOnly.should_report(&comm_fail));
        assert!(ReportLevel::All.should_report(&ok));
    }

    #[test]
    fn test_report_level_numeric() {
        assert_eq!(ReportLevel::from_level(0), Some(ReportLevel::Off));
        assert_eq!(ReportLevel::from_level(1), Some(ReportLevel::ErrorsOnly));
        assert_eq!(ReportLevel::from_level(2), Some(ReportLevel::All));
        assert_eq!(ReportLevel::from_level(3), None);
        assert_eq!(ReportLevel::default(), ReportLevel::ErrorsOnly);
    }

    #[test]
    fn test_failure_envelope_sample_is_complete() {
        let resp = FieldMap::from([("return_code", "FAIL"), ("return_msg", "system busy")]);
        let fields = TelemetrySample::from_response(
            "https://api.mch.weixin.qq.com/pay/closeorder",
            Duration::from_millis(7),
            &resp,
        )
        .into_fields();

        assert_eq!(fields.get("return_code"), Some("FAIL"));
        assert_eq!(fields.get("result_code"), Some("FAIL"));
        assert_eq!(fields.get("return_msg"), Some("system busy"));
    }

    #[test]
    fn test_sample_copies_outcome_fields() {
        let resp = FieldMap::from([
            ("return_code", "SUCCESS"),
            ("result_code", "FAIL"),
            ("err_code", "ORDERPAID"),
            ("out_trade_no", "T1"),
            ("prepay_id", "wx201410272009395522657a690389285100"),
        ]);
        let sample = TelemetrySample::from_response(
            "https://api.mch.weixin.qq.com/pay/unifiedorder",
            Duration::from_millis(42),
            &resp,
        );
        assert_eq!(sample.execute_time_ms(), 42);

        let fields = sample.into_fields();
        assert_eq!(
            fields.get("interface_url"),
            Some("https://api.mch.weixin.qq.com/pay/unifiedorder")
        );
        assert_eq!(fields.get("execute_time_"), Some("42"));
        assert_eq!(fields.get("err_code"), Some("ORDERPAID"));
        assert_eq!(fields.get("out_trade_no"), Some("T1"));
        assert!(!fields.contains_key("prepay_id"));
        assert!(!fields.contains_key("return_msg"));
    }
}
