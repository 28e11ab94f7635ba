//! Sign fields offline.

use paygate_client::request::sign_fields;
use paygate_client::{GatewayClient, GatewayError, SignType};
use paygate_crypto::SignScheme;

use crate::commands::parse_fields;
use crate::error::CliResult;
use crate::output::{OutputFormat, Render, SignOutput};

/// Execute the sign command.
///
/// Signs exactly the given fields with the configured key. No credentials
/// or nonce are injected.
pub fn sign(
    client: &GatewayClient,
    format: OutputFormat,
    args: &[String],
    sign_type: Option<SignType>,
) -> CliResult<String> {
    let config = client.config();
    let sign_type = sign_type.unwrap_or(config.sign_type);
    let scheme = SignScheme::resolve(sign_type, None).map_err(GatewayError::from)?;

    let mut fields = parse_fields(args)?;
    sign_fields(&mut fields, &config.key, &scheme)?;
    let xml = paygate_wire::encode(&fields).map_err(GatewayError::from)?;

    let output = SignOutput {
        sign_type: sign_type.to_string(),
        sign: fields.signature().unwrap_or_default().to_string(),
        xml: String::from_utf8_lossy(&xml).into_owned(),
    };
    Ok(output.render(format))
}
