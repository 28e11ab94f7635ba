//! Verify an inbound notification body.

use std::io::Read;
use std::path::Path;

use paygate_client::GatewayClient;

use crate::error::{CliError, CliResult};
use crate::output::{EnvelopeOutput, OutputFormat, Render};

/// Execute the verify-notify command.
///
/// `file` of `-` reads the body from standard input.
pub fn verify_notify(client: &GatewayClient, format: OutputFormat, file: &Path) -> CliResult<String> {
    let body = read_body(file)?;
    let envelope = client.verify_notification(&body)?;

    let output = EnvelopeOutput::new("notification", envelope.fields());
    Ok(output.render(format))
}

fn read_body(file: &Path) -> CliResult<Vec<u8>> {
    if file == Path::new("-") {
        let mut body = Vec::new();
        std::io::stdin().read_to_end(&mut body)?;
        return Ok(body);
    }
    if !file.exists() {
        return Err(CliError::FileNotFound(file.display().to_string()));
    }
    Ok(std::fs::read(file)?)
}
