//! Service-account rate limits.

use serde::{Deserialize, Serialize};

use crate::core::client::Client;
use crate::core::command::Command;
use crate::core::decode;
use crate::error::{AuthError, Result};

/// Usage against one service-account rate limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// `token` or `account`.
    #[serde(rename = "type")]
    pub kind: String,
    /// `read`, `write` or `read_write`.
    pub action: String,
    pub limit: u64,
    pub used: u64,
    pub remaining: u64,
    /// Seconds until the limit resets.
    #[serde(default)]
    pub reset: i64,
}

impl Client {
    /// Current rate-limit usage of the signed-in service account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotServiceAccount` for interactive sessions.
    pub fn service_account_rate_limits(&self) -> Result<Vec<RateLimit>> {
        if !self.is_service_account() {
            return Err(AuthError::NotServiceAccount.into());
        }
        let output = self.run(Command::new(["service-account", "ratelimit"]))?;
        decode::decode(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rate_limits() {
        let json = r#"[
            {"type":"token","action":"write","limit":100,"used":0,"remaining":100,"reset":0},
            {"type":"account","action":"read_write","limit":1000,"used":4,"remaining":996,"reset":3600}
        ]"#;
        let limits: Vec<RateLimit> = serde_json::from_str(json).unwrap();
        assert_eq!(limits[1].remaining, 996);
        assert_eq!(limits[0].kind, "token");
    }

    #[test]
    fn test_requires_service_account() {
        let client = Client::builder().binary("/nonexistent/op").build().unwrap();
        assert!(matches!(
            client.service_account_rate_limits(),
            Err(crate::error::Error::Auth(AuthError::NotServiceAccount))
        ));
    }
}
