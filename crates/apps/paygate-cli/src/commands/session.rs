//! Exchange a mini-program login code.

use paygate_client::GatewayClient;

use crate::error::CliResult;
use crate::output::{OutputFormat, Render, SessionOutput};

/// Execute the session command.
pub async fn session(client: &GatewayClient, format: OutputFormat, code: &str) -> CliResult<String> {
    let session = client.code_to_session(code).await?;

    let output = SessionOutput {
        openid: session.openid,
        unionid: session.unionid,
        has_session_key: session.session_key.is_some(),
    };
    Ok(output.render(format))
}
