//! Reconciliation bill download.

use paygate_client::api::API_BASE;
use paygate_client::{FieldMap, GatewayError};
use paygate_test_utils::*;

fn bill_url() -> String {
    format!("{}/pay/downloadbill", API_BASE)
}

fn bill_request() -> FieldMap {
    FieldMap::from([("bill_date", "20240101"), ("bill_type", "ALL")])
}

const REPORT: &str = "Trade time,appid,mch_id,Total fee\r\n\
                      `2024-01-01 10:00:00,`wxd930ea5d5a258f4f,`10000100,`0.01\r\n";

#[tokio::test]
async fn test_report_body_returned_verbatim() {
    let transport = MockTransport::new().with_response(&bill_url(), REPORT);
    let client = test_client(&transport);

    let bill = client.download_bill(bill_request()).await.unwrap();
    assert_eq!(bill, REPORT);

    let sent = transport.last_request().unwrap().fields();
    assert_eq!(sent.get("bill_date"), Some("20240101"));
    assert_eq!(sent.get("bill_type"), Some("ALL"));
    assert!(sent.is_set("sign"));
}

#[tokio::test]
async fn test_xml_envelope_yields_empty_result() {
    let transport =
        MockTransport::new().with_response(&bill_url(), failure_envelope("No Bill Exist"));
    let client = test_client(&transport);

    let bill = client.download_bill(bill_request()).await.unwrap();
    assert_eq!(bill, "");
}

#[tokio::test]
async fn test_any_xml_prefixed_body_yields_empty_result() {
    let transport = MockTransport::new().with_response(&bill_url(), "<xml>garbage");
    let client = test_client(&transport);

    assert_eq!(client.download_bill(bill_request()).await.unwrap(), "");
}

#[tokio::test]
async fn test_missing_bill_date() {
    let transport = MockTransport::new().with_response(&bill_url(), REPORT);
    let client = test_client(&transport);

    let err = client.download_bill(FieldMap::new()).await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingRequiredField(ref f) if f == "bill_date"));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_transport_error_propagates() {
    let transport = MockTransport::new().with_status(&bill_url(), 503);
    let client = test_client(&transport);

    let err = client.download_bill(bill_request()).await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport { code: Some(503), .. }));
}
