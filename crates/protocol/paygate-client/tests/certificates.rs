//! Certificate-gated methods.

use paygate_client::api::API_BASE;
use paygate_client::{FieldMap, GatewayError};
use paygate_test_utils::*;

fn refund_fields() -> FieldMap {
    FieldMap::from([
        ("out_trade_no", "T001"),
        ("out_refund_no", "R001"),
        ("total_fee", "100"),
        ("refund_fee", "100"),
        ("op_user_id", TEST_MCH_ID),
    ])
}

#[tokio::test]
async fn test_refund_without_certificate_sends_nothing() {
    let transport = MockTransport::echoing(TEST_KEY);
    let client = test_client(&transport);

    let err = client.refund(refund_fields()).await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingCertificate(_)));
    assert!(err.is_pre_dispatch());
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_reverse_with_missing_files_sends_nothing() {
    let transport = MockTransport::echoing(TEST_KEY);
    let config = test_config().with_certificate(
        "/nonexistent/paygate/apiclient_cert.pem",
        "/nonexistent/paygate/apiclient_key.pem",
    );
    let client = client_with(config, &transport);

    let err = client
        .reverse(FieldMap::from([("transaction_id", "4200000001")]))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::MissingCertificate(ref m) if m.contains("does not exist")));
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn test_validation_runs_before_certificate_check() {
    let transport = MockTransport::echoing(TEST_KEY);
    let client = test_client(&transport);

    let mut fields = refund_fields();
    fields.remove("op_user_id");
    let err = client.refund(fields).await.unwrap_err();
    assert!(matches!(err, GatewayError::MissingRequiredField(ref f) if f == "op_user_id"));
}

#[tokio::test]
async fn test_refund_with_certificate() {
    let (_dir, cert, key) = write_test_certificate();
    let transport = MockTransport::echoing(TEST_KEY);
    let client = client_with(test_config().with_certificate(cert, key), &transport);

    let envelope = client.refund(refund_fields()).await.unwrap();
    assert_eq!(envelope.get("out_refund_no"), Some("R001"));

    let sent = transport.last_request().unwrap();
    assert_eq!(sent.url, format!("{}/secapi/pay/refund", API_BASE));
    assert!(sent.had_client_cert);
}

#[tokio::test]
async fn test_certificate_read_per_call() {
    let (dir, cert, key) = write_test_certificate();
    let transport = MockTransport::echoing(TEST_KEY);
    let client = client_with(test_config().with_certificate(cert, key.clone()), &transport);

    client
        .reverse(FieldMap::from([("out_trade_no", "T1")]))
        .await
        .unwrap();

    std::fs::remove_file(&key).unwrap();
    let err = client
        .reverse(FieldMap::from([("out_trade_no", "T1")]))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::MissingCertificate(_)));
    assert_eq!(transport.request_count(), 1);
    drop(dir);
}

#[tokio::test]
async fn test_non_gated_calls_carry_no_certificate() {
    let (_dir, cert, key) = write_test_certificate();
    let transport = MockTransport::echoing(TEST_KEY);
    let client = client_with(test_config().with_certificate(cert, key), &transport);

    client
        .order_query(FieldMap::from([("out_trade_no", "T1")]))
        .await
        .unwrap();
    assert!(!transport.last_request().unwrap().had_client_cert);
}
