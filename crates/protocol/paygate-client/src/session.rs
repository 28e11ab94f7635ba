//! Mini-program login session exchange.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::api::{SESSION_TIMEOUT, SESSION_URL};
use crate::client::GatewayClient;
use crate::error::{GatewayError, GatewayResult};

const GRANT_TYPE: &str = "authorization_code";

/// Result of exchanging a login code.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    #[serde(default)]
    pub openid: Option<String>,
    #[serde(default)]
    pub session_key: Option<String>,
    #[serde(default)]
    pub unionid: Option<String>,
    #[serde(default)]
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: Option<String>,
}

impl fmt::Debug for SessionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionInfo")
            .field("openid", &self.openid)
            .field("session_key", &self.session_key.as_ref().map(|_| "<redacted>"))
            .field("unionid", &self.unionid)
            .field("errcode", &self.errcode)
            .field("errmsg", &self.errmsg)
            .finish()
    }
}

impl GatewayClient {
    /// Exchange a mini-program login code for a session.
    ///
    /// Needs `app_secret` in the configuration. A non-zero `errcode` from
    /// the provider fails with [`GatewayError::Provider`].
    pub async fn code_to_session(&self, js_code: &str) -> GatewayResult<SessionInfo> {
        let config = self.config();
        let secret = config
            .app_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| GatewayError::config("app_secret is required for session exchange"))?;
        if js_code.is_empty() {
            return Err(GatewayError::missing_field("js_code"));
        }

        let query = [
            ("appid", config.app_id.as_str()),
            ("secret", secret),
            ("js_code", js_code),
            ("grant_type", GRANT_TYPE),
        ];
        debug!(url = SESSION_URL, "Exchanging login code");
        let body = self.transport().get(SESSION_URL, &query, SESSION_TIMEOUT).await?;

        let session: SessionInfo = serde_json::from_slice(&body)
            .map_err(|e| GatewayError::malformed(format!("invalid session response: {}", e)))?;
        if session.errcode != 0 {
            warn!(errcode = session.errcode, "Login code exchange refused");
            return Err(GatewayError::provider(
                session.errcode.to_string(),
                session.errmsg.unwrap_or_default(),
            ));
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_info_parses_success() {
        let info: SessionInfo = serde_json::from_str(
            r#"{"openid":"oUpF8uMuAJO_M2pxb1Q9zNjWeS6o","session_key":"tiihtNczf5v6AKRyjwEUhQ=="}"#,
        )
        .unwrap();
        assert_eq!(info.errcode, 0);
        assert_eq!(info.openid.as_deref(), Some("oUpF8uMuAJO_M2pxb1Q9zNjWeS6o"));
        assert!(!format!("{:?}", info).contains("tiihtNczf5v6AKRyjwEUhQ"));
    }

    #[test]
    fn test_session_info_parses_error() {
        let info: SessionInfo =
            serde_json::from_str(r#"{"errcode":40029,"errmsg":"invalid code"}"#).unwrap();
        assert_eq!(info.errcode, 40029);
        assert!(info.openid.is_none());
    }
}
