//! Call a provider method.

use std::time::Duration;

use paygate_client::{ApiMethod, GatewayClient};
use tracing::debug;

use crate::commands::parse_fields;
use crate::error::{CliError, CliResult};
use crate::output::{EnvelopeOutput, OutputFormat, Render};

/// Execute the call command.
pub async fn call(
    client: &GatewayClient,
    format: OutputFormat,
    method: &str,
    args: &[String],
    timeout_secs: Option<u64>,
) -> CliResult<String> {
    let method = ApiMethod::from_name(method).ok_or_else(|| {
        let known: Vec<&str> = ApiMethod::ALL.iter().map(|m| m.name()).collect();
        CliError::user(format!(
            "Unknown method '{}'. Known methods: {}",
            method,
            known.join(", ")
        ))
    })?;
    let fields = parse_fields(args)?;
    debug!(method = %method, fields = fields.len(), "Calling provider");

    let output = match method {
        ApiMethod::DownloadBill => {
            return Err(CliError::user("Use 'paygate bill' to download bills"));
        }
        ApiMethod::BizPayUrl => {
            return Err(CliError::user("Use 'paygate qr-url' to build QR URLs"));
        }
        ApiMethod::Report => {
            let response = client.report(fields).await?;
            EnvelopeOutput::new(method.name(), &response)
        }
        _ => {
            let envelope = client
                .call_with_timeout(method, fields, timeout_secs.map(Duration::from_secs))
                .await?;
            EnvelopeOutput::new(method.name(), envelope.fields())
        }
    };

    Ok(output.render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paygate_client::api::API_BASE;
    use paygate_test_utils::*;

    fn args(pairs: &[&str]) -> Vec<String> {
        pairs.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_call_order_query() {
        let transport = MockTransport::echoing(TEST_KEY);
        let client = test_client(&transport);

        let output = call(
            &client,
            OutputFormat::Json,
            "order-query",
            &args(&["out_trade_no=T1"]),
            Some(2),
        )
        .await
        .unwrap();

        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["method"], "order-query");
        assert_eq!(json["fields"]["out_trade_no"], "T1");

        let sent = transport.last_request().unwrap();
        assert_eq!(sent.url, format!("{}/pay/orderquery", API_BASE));
        assert_eq!(sent.timeout, Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let transport = MockTransport::new();
        let client = test_client(&transport);

        let err = call(&client, OutputFormat::Human, "pay", &[], None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unified-order"));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_bill_is_redirected() {
        let transport = MockTransport::new();
        let client = test_client(&transport);

        let err = call(&client, OutputFormat::Human, "download-bill", &[], None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("paygate bill"));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_field_sends_nothing() {
        let transport = MockTransport::echoing(TEST_KEY);
        let client = test_client(&transport);

        let err = call(&client, OutputFormat::Human, "refund-query", &[], None)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert_eq!(transport.request_count(), 0);
    }
}
