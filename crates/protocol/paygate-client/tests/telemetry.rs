//! Telemetry reporting behaviour.

use std::time::Duration;

use paygate_client::api::API_BASE;
use paygate_client::{FieldMap, GatewayError, ReportLevel};
use paygate_test_utils::*;

fn url(path: &str) -> String {
    format!("{}{}", API_BASE, path)
}

fn report_url() -> String {
    url("/payitil/report")
}

fn query() -> FieldMap {
    FieldMap::from([("out_trade_no", "T1")])
}

fn report_ok() -> Vec<u8> {
    encoded(&FieldMap::from([("return_code", "SUCCESS"), ("return_msg", "OK")]))
}

#[tokio::test]
async fn test_errors_only_skips_successful_calls() {
    let transport = MockTransport::new()
        .with_response(&url("/pay/orderquery"), success_response([("trade_state", "SUCCESS")]))
        .with_response(&report_url(), report_ok());
    let client = client_with(test_config().with_report_level(ReportLevel::ErrorsOnly), &transport);

    client.order_query(query()).await.unwrap();
    assert!(transport.requests_to(&report_url()).is_empty());
}

#[tokio::test]
async fn test_errors_only_reports_business_failure_once() {
    let transport = MockTransport::new()
        .with_response(&url("/pay/orderquery"), business_failure_response("ORDERNOTEXIST"))
        .with_response(&report_url(), report_ok());
    let client = client_with(test_config().with_report_level(ReportLevel::ErrorsOnly), &transport);

    let envelope = client.order_query(query()).await.unwrap();
    assert_eq!(envelope.get("err_code"), Some("ORDERNOTEXIST"));

    let reports = transport.requests_to(&report_url());
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.timeout, Duration::from_secs(1));

    let fields = report.fields();
    assert_eq!(fields.get("interface_url"), Some(url("/pay/orderquery").as_str()));
    assert_eq!(fields.get("return_code"), Some("SUCCESS"));
    assert_eq!(fields.get("result_code"), Some("FAIL"));
    assert_eq!(fields.get("err_code"), Some("ORDERNOTEXIST"));
    assert_eq!(fields.get("user_ip"), Some("127.0.0.1"));
    assert!(fields.is_set("execute_time_"));
    assert!(fields.is_set("time"));
    assert!(fields.is_set("sign"));
    assert_eq!(fields.get("appid"), Some(TEST_APP_ID));
}

#[tokio::test]
async fn test_errors_only_reports_provider_failure() {
    let transport = MockTransport::new()
        .with_response(&url("/pay/closeorder"), failure_envelope("system busy"))
        .with_response(&report_url(), report_ok());
    let client = client_with(test_config().with_report_level(ReportLevel::ErrorsOnly), &transport);

    let err = client.close_order(query()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Provider { .. }));

    let reports = transport.requests_to(&report_url());
    assert_eq!(reports.len(), 1);
    let fields = reports[0].fields();
    assert_eq!(fields.get("interface_url"), Some(url("/pay/closeorder").as_str()));
    assert_eq!(fields.get("return_code"), Some("FAIL"));
    assert_eq!(fields.get("result_code"), Some("FAIL"));
    assert_eq!(fields.get("return_msg"), Some("system busy"));
}

#[tokio::test]
async fn test_all_reports_successful_calls() {
    let transport = MockTransport::echoing(TEST_KEY);
    let client = client_with(test_config().with_report_level(ReportLevel::All), &transport);

    client.order_query(query()).await.unwrap();

    let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
    assert_eq!(urls, vec![url("/pay/orderquery"), report_url()]);
}

#[tokio::test]
async fn test_off_never_reports() {
    let transport = MockTransport::new()
        .with_response(&url("/pay/orderquery"), business_failure_response("SYSTEMERROR"));
    let client = client_with(test_config().with_report_level(ReportLevel::Off), &transport);

    client.order_query(query()).await.unwrap();
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_report_failure_does_not_alter_result() {
    let transport = MockTransport::new()
        .with_response(&url("/pay/orderquery"), business_failure_response("ORDERNOTEXIST"))
        .with_url_failure(&report_url());
    let client = client_with(test_config().with_report_level(ReportLevel::All), &transport);

    let envelope = client.order_query(query()).await.unwrap();
    assert_eq!(envelope.get("err_code"), Some("ORDERNOTEXIST"));
    assert_eq!(transport.requests_to(&report_url()).len(), 1);
}

#[tokio::test]
async fn test_garbled_report_response_does_not_alter_result() {
    let transport = MockTransport::new()
        .with_response(&url("/pay/orderquery"), success_response([("trade_state", "SUCCESS")]))
        .with_response(&report_url(), "not xml");
    let client = client_with(test_config().with_report_level(ReportLevel::All), &transport);

    let envelope = client.order_query(query()).await.unwrap();
    assert_eq!(envelope.get("trade_state"), Some("SUCCESS"));
    assert_eq!(transport.request_count(), 2);
}

#[tokio::test]
async fn test_report_failure_does_not_mask_verification_error() {
    let transport = MockTransport::new()
        .with_response(
            &url("/pay/orderquery"),
            signed_response(
                FieldMap::from([("return_code", "SUCCESS"), ("result_code", "FAIL")]),
                "wrong-key",
            ),
        )
        .with_url_failure(&report_url());
    let client = client_with(test_config().with_report_level(ReportLevel::All), &transport);

    let err = client.order_query(query()).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidSignature));
    assert!(transport.requests_to(&report_url()).is_empty());
}

#[tokio::test]
async fn test_forged_response_is_never_reported() {
    let transport = MockTransport::new()
        .with_response(
            &url("/pay/orderquery"),
            signed_response(
                FieldMap::from([
                    ("return_code", "SUCCESS"),
                    ("result_code", "FAIL"),
                    ("err_code", "FORGED"),
                    ("out_trade_no", "T-other"),
                ]),
                "wrong-key",
            ),
        )
        .with_response(&report_url(), report_ok());
    let client = client_with(test_config().with_report_level(ReportLevel::ErrorsOnly), &transport);

    let err = client.order_query(query()).await.unwrap_err();
    assert!(matches!(err, GatewayError::InvalidSignature));
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_each_failed_call_reports_once() {
    let transport = MockTransport::new()
        .with_next_response(&url("/pay/orderquery"), business_failure_response("SYSTEMERROR"))
        .with_response(&url("/pay/orderquery"), success_response([("trade_state", "SUCCESS")]))
        .with_response(&report_url(), report_ok());
    let client = client_with(test_config().with_report_level(ReportLevel::ErrorsOnly), &transport);

    let first = client.order_query(query()).await.unwrap();
    assert!(!first.is_business_success());
    let second = client.order_query(query()).await.unwrap();
    assert!(second.is_business_success());

    let reports = transport.requests_to(&report_url());
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].fields().get("err_code"), Some("SYSTEMERROR"));
}

#[tokio::test]
async fn test_transport_failure_is_not_reported() {
    let transport = MockTransport::new()
        .with_url_failure(&url("/pay/orderquery"))
        .with_response(&report_url(), report_ok());
    let client = client_with(test_config().with_report_level(ReportLevel::All), &transport);

    assert!(client.order_query(query()).await.is_err());
    assert!(transport.requests_to(&report_url()).is_empty());
}

#[tokio::test]
async fn test_unreachable_provider_sends_no_report() {
    let transport = MockTransport::new().with_failure();
    let client = client_with(test_config().with_report_level(ReportLevel::All), &transport);

    let err = client.order_query(query()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport { code: None, .. }));
    assert_eq!(transport.request_count(), 1);

    transport.set_should_fail(false);
    transport.set_response(&url("/pay/orderquery"), success_response([("trade_state", "SUCCESS")]));
    transport.set_response(&report_url(), report_ok());
    client.order_query(query()).await.unwrap();
    assert_eq!(transport.requests_to(&report_url()).len(), 1);
}

#[tokio::test]
async fn test_bill_download_is_not_reported() {
    let transport = MockTransport::new()
        .with_response(&url("/pay/downloadbill"), "Trade time,appid\r\n")
        .with_response(&report_url(), report_ok());
    let client = client_with(test_config().with_report_level(ReportLevel::All), &transport);

    client
        .download_bill(FieldMap::from([("bill_date", "20240101")]))
        .await
        .unwrap();
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn test_direct_report() {
    let transport = MockTransport::new().with_response(&report_url(), report_ok());
    let client = test_client(&transport);

    let response = client
        .report(FieldMap::from([
            ("interface_url", "https://api.mch.weixin.qq.com/pay/micropay"),
            ("return_code", "SUCCESS"),
            ("result_code", "SUCCESS"),
            ("execute_time_", "1000"),
            ("user_ip", "203.0.113.7"),
        ]))
        .await
        .unwrap();
    assert_eq!(response.get("return_code"), Some("SUCCESS"));

    let sent = transport.last_request().unwrap().fields();
    assert_eq!(sent.get("user_ip"), Some("203.0.113.7"));

    let err = client
        .report(FieldMap::from([("interface_url", "x")]))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::MissingRequiredField(ref f) if f == "return_code"));
}

#[tokio::test]
async fn test_direct_report_rejection() {
    let transport = MockTransport::new().with_response(&report_url(), failure_envelope("bad sign"));
    let client = test_client(&transport);

    let err = client
        .report(FieldMap::from([
            ("interface_url", "https://api.mch.weixin.qq.com/pay/micropay"),
            ("return_code", "SUCCESS"),
            ("result_code", "SUCCESS"),
            ("execute_time_", "1000"),
        ]))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Provider { .. }));
}
