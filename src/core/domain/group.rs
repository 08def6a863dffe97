//! Groups.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::client::Client;
use crate::core::command::Command;
use crate::core::decode::{Attach, ClientRef};
use crate::core::domain::user::User;
use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(skip)]
    client: ClientRef,
}

impl Attach for Group {
    fn attach(&mut self, client: &Client) {
        self.client.set(client);
    }
}

/// Role of a user within a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupRole {
    #[default]
    Member,
    Manager,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Member => "member",
            GroupRole::Manager => "manager",
        }
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupRole {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "member" => Ok(GroupRole::Member),
            "manager" => Ok(GroupRole::Manager),
            _ => Err(ValidationError::InvalidRole(s.to_string())),
        }
    }
}

impl Group {
    pub fn client(&self) -> Option<&Client> {
        self.client.get()
    }

    /// Add a user to this group.
    pub fn grant_user(&self, user_id: &str, role: GroupRole) -> Result<()> {
        self.client.require()?.run(Command::new([
            "group",
            "user",
            "grant",
            "--group",
            self.id.as_str(),
            "--user",
            user_id,
            "--role",
            role.as_str(),
        ]))?;
        Ok(())
    }

    pub fn revoke_user(&self, user_id: &str) -> Result<()> {
        self.client.require()?.run(Command::new([
            "group",
            "user",
            "revoke",
            "--group",
            self.id.as_str(),
            "--user",
            user_id,
        ]))?;
        Ok(())
    }

    /// Members of this group.
    pub fn users(&self) -> Result<Vec<User>> {
        self.client
            .require()?
            .query_list(Command::new(["group", "user", "list", self.id.as_str()]))
    }

    pub fn delete(&self) -> Result<()> {
        self.client
            .require()?
            .run(Command::new(["group", "delete", self.id.as_str()]))?;
        Ok(())
    }
}

impl Client {
    pub fn list_groups(&self) -> Result<Vec<Group>> {
        self.query_list(Command::new(["group", "list"]))
    }

    /// Group by id or name.
    pub fn group(&self, identifier: &str) -> Result<Group> {
        self.query(Command::new(["group", "get", identifier]))
    }

    pub fn create_group(&self, name: &str, description: Option<&str>) -> Result<Group> {
        if name.is_empty() {
            return Err(ValidationError::Empty("group name").into());
        }
        let mut cmd = Command::new(["group", "create", name]);
        if let Some(description) = description {
            cmd = cmd.args(["--description", description]);
        }
        self.query(cmd)
    }
}
