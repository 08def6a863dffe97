//! Users.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::client::Client;
use crate::core::command::Command;
use crate::core::decode::{Attach, ClientRef};
use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserType {
    Member,
    Guest,
    ServiceAccount,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserState {
    Active,
    TransferStarted,
    Suspended,
    TransferSuspended,
    #[serde(untagged)]
    Other(String),
}

/// A member of the 1Password account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<UserState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_auth_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    client: ClientRef,
}

impl Attach for User {
    fn attach(&mut self, client: &Client) {
        self.client.set(client);
    }
}

pub fn is_valid_email(email: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(email))
}

impl User {
    pub fn client(&self) -> Option<&Client> {
        self.client.get()
    }

    /// Confirm a user who accepted their invitation.
    pub fn confirm(&self) -> Result<User> {
        self.client
            .require()?
            .query(Command::new(["user", "confirm", self.id.as_str()]))
    }

    /// Suspend the user, returning the updated record.
    pub fn suspend(&self) -> Result<User> {
        self.client
            .require()?
            .query(Command::new(["user", "suspend", self.id.as_str()]))
    }

    pub fn reactivate(&self) -> Result<()> {
        self.client
            .require()?
            .run(Command::new(["user", "reactivate", self.id.as_str()]))?;
        Ok(())
    }

    pub fn delete(&self) -> Result<()> {
        self.client
            .require()?
            .run(Command::new(["user", "delete", self.id.as_str()]))?;
        Ok(())
    }

    pub fn set_travel_mode(&self, enabled: bool) -> Result<()> {
        let flag = format!("--travel-mode={enabled}");
        self.client
            .require()?
            .run(Command::new(["user", "edit", self.id.as_str(), flag.as_str()]))?;
        Ok(())
    }

    /// Rename the user, remotely and locally.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(ValidationError::Empty("name").into());
        }
        self.client
            .require()?
            .run(Command::new(["user", "edit", self.id.as_str(), "--name", name]))?;
        self.name = name.to_string();
        Ok(())
    }
}

impl Client {
    pub fn list_users(&self) -> Result<Vec<User>> {
        self.query_list(Command::new(["user", "list"]))
    }

    /// User by id, name or email.
    pub fn user(&self, identifier: &str) -> Result<User> {
        self.query(Command::new(["user", "get", identifier]))
    }

    pub fn user_by_email(&self, email: &str) -> Result<User> {
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()).into());
        }
        self.user(email)
    }

    /// The signed-in user (`op user get --me`).
    pub fn whoami(&self) -> Result<User> {
        self.query(Command::new(["user", "get", "--me"]))
    }

    /// Invite a new user. `language` defaults to `en`.
    pub fn provision_user(&self, name: &str, email: &str, language: Option<&str>) -> Result<User> {
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()).into());
        }
        if name.is_empty() {
            return Err(ValidationError::Empty("name").into());
        }
        let language = language.filter(|l| !l.is_empty()).unwrap_or("en");
        debug!(%email, "provisioning user");

        self.query(Command::new([
            "user",
            "provision",
            "--name",
            name,
            "--email",
            email,
            "--language",
            language,
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_decode_user() {
        let json = r#"{
            "id": "U1",
            "name": "Ada",
            "email": "ada@example.com",
            "type": "MEMBER",
            "state": "ACTIVE",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "last_auth_at": "0001-01-01T00:00:00Z"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.kind, Some(UserType::Member));
        assert_eq!(user.state, Some(UserState::Active));
        assert!(user.last_auth_at.is_some());
    }

    #[test]
    fn test_decode_unknown_state() {
        let json = r#"{"id":"U1","state":"RECOVERY_STARTED"}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(
            user.state,
            Some(UserState::Other("RECOVERY_STARTED".to_string()))
        );
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("ada@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.io"));
        assert!(!is_valid_email("ada"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn test_detached_user() {
        let mut user: User = serde_json::from_str(r#"{"id":"U1"}"#).unwrap();
        assert!(matches!(user.delete(), Err(Error::Detached)));
        assert!(matches!(user.set_name("x"), Err(Error::Detached)));
        assert_eq!(user.name, "");
    }
}
