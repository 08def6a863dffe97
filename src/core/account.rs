//! Account type.
//!
//! One authenticated identity, as reported by `op account list`, plus the
//! client-side session bookkeeping stamped at sign-in.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::core::constants::SESSION_EXPIRY;

/// A 1Password account configured in the CLI.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub user_uuid: String,
    #[serde(default)]
    pub account_uuid: String,
    #[serde(skip)]
    session: Option<Session>,
}

#[derive(Clone)]
struct Session {
    signed_in_at: DateTime<Utc>,
    expires_after: chrono::Duration,
    token: Zeroizing<String>,
}

impl Account {
    /// An account known only by its user identifier.
    pub fn with_user_uuid(user_uuid: impl Into<String>) -> Self {
        Self {
            user_uuid: user_uuid.into(),
            ..Self::default()
        }
    }

    /// Record a successful sign-in at the current time.
    pub fn set_sign_in_info(&mut self, token: Zeroizing<String>) {
        self.set_sign_in_info_at(token, Utc::now());
    }

    /// Record a successful sign-in at `now`.
    ///
    /// Sessions expire after 30 minutes of inactivity; 29 minutes are
    /// tracked.
    pub fn set_sign_in_info_at(&mut self, token: Zeroizing<String>, now: DateTime<Utc>) {
        let expires_after = chrono::Duration::from_std(SESSION_EXPIRY)
            .unwrap_or_else(|_| chrono::Duration::minutes(29));
        self.session = Some(Session {
            signed_in_at: now,
            expires_after,
            token,
        });
    }

    pub fn is_session_valid(&self) -> bool {
        self.is_session_valid_at(Utc::now())
    }

    /// Valid while `now - signed_in_at < expiry`. Never-signed-in accounts
    /// are not valid.
    pub fn is_session_valid_at(&self, now: DateTime<Utc>) -> bool {
        match &self.session {
            Some(s) => now.signed_duration_since(s.signed_in_at) < s.expires_after,
            None => false,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        !self.is_session_valid()
    }

    pub fn signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.session.as_ref().map(|s| s.signed_in_at)
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.token.as_str())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("url", &self.url)
            .field("email", &self.email)
            .field("user_uuid", &self.user_uuid)
            .field("account_uuid", &self.account_uuid)
            .field("signed_in_at", &self.signed_in_at())
            .finish()
    }
}

/// Strip scheme and path, lowercase.
pub fn normalize_url(url: &str) -> String {
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let host = url.split('/').next().unwrap_or_default();
    host.to_lowercase()
}
