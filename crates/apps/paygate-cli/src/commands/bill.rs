//! Download a reconciliation bill.

use std::path::Path;

use paygate_client::{FieldMap, GatewayClient};
use tracing::info;

use crate::error::CliResult;
use crate::output::{BillOutput, OutputFormat, Render};

/// Execute the bill command.
pub async fn bill(
    client: &GatewayClient,
    format: OutputFormat,
    date: &str,
    bill_type: &str,
    output: Option<&Path>,
) -> CliResult<String> {
    let fields = FieldMap::from([("bill_date", date), ("bill_type", bill_type)]);
    let content = client.download_bill(fields).await?;
    let lines = content.lines().count();

    let path = match output {
        Some(path) if !content.is_empty() => {
            std::fs::write(path, &content)?;
            info!(path = %path.display(), lines, "Bill written");
            Some(path.display().to_string())
        }
        _ => None,
    };

    let output = BillOutput {
        bill_date: date.to_string(),
        lines,
        content: if path.is_none() { Some(content) } else { None },
        path,
    };
    Ok(output.render(format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use paygate_client::api::API_BASE;
    use paygate_test_utils::*;
    use tempfile::TempDir;

    const REPORT: &str = "Trade time,appid,total\n`2024-01-01 10:00:00,`wx1,`1.00\n";

    fn bill_url() -> String {
        format!("{}/pay/downloadbill", API_BASE)
    }

    #[tokio::test]
    async fn test_bill_to_stdout() {
        let transport = MockTransport::new().with_response(&bill_url(), REPORT);
        let client = test_client(&transport);

        let output = bill(&client, OutputFormat::Human, "20240101", "ALL", None)
            .await
            .unwrap();
        assert_eq!(output, REPORT);
        assert_eq!(
            transport.last_request().unwrap().fields().get("bill_type"),
            Some("ALL")
        );
    }

    #[tokio::test]
    async fn test_bill_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bill.csv");
        let transport = MockTransport::new().with_response(&bill_url(), REPORT);
        let client = test_client(&transport);

        let output = bill(&client, OutputFormat::Json, "20240101", "SUCCESS", Some(path.as_path()))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), REPORT);
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json["lines"], 2);
        assert!(json.get("content").is_none());
    }

    #[tokio::test]
    async fn test_no_bill_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bill.csv");
        let transport =
            MockTransport::new().with_response(&bill_url(), failure_envelope("No Bill Exist"));
        let client = test_client(&transport);

        let output = bill(&client, OutputFormat::Human, "20240101", "ALL", Some(path.as_path()))
            .await
            .unwrap();
        assert!(output.contains("no bill for 20240101"));
        assert!(!path.exists());
    }
}
