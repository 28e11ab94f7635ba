//! Build a mode-one QR payment URL.

use paygate_client::GatewayClient;

use crate::error::CliResult;
use crate::output::{OutputFormat, QrUrlOutput, Render};

/// Execute the qr-url command.
pub fn qr_url(client: &GatewayClient, format: OutputFormat, product_id: &str) -> CliResult<String> {
    let url = client.bizpay_url(product_id)?;

    let output = QrUrlOutput {
        product_id: product_id.to_string(),
        url,
    };
    Ok(output.render(format))
}
