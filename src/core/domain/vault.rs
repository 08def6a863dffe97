//! Vaults.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::client::Client;
use crate::core::command::Command;
use crate::core::decode::{Attach, ClientRef};
use crate::core::domain::item::Item;
use crate::core::domain::permission::{self, Permission};
use crate::error::{Result, ValidationError};

const MAX_DESCRIPTION_LEN: usize = 500;

/// A 1Password vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vault {
    /// 26-character lowercase alphanumeric identifier.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub content_version: i64,
    #[serde(default)]
    pub attribute_version: i64,
    /// RFC 3339 timestamp.
    #[serde(default)]
    pub created_at: String,
    /// RFC 3339 timestamp.
    #[serde(default)]
    pub updated_at: String,
    /// Number of items stored in the vault.
    #[serde(default)]
    pub items: i64,
    #[serde(default)]
    pub description: String,
    /// `USER_CREATED`, `PERSONAL`, `EVERYONE`, `TRANSFER` or
    /// `SYSTEM_GENERATED`.
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(skip)]
    client: ClientRef,
}

impl Attach for Vault {
    fn attach(&mut self, client: &Client) {
        self.client.set(client);
    }
}

/// Check the vault id format (`^[a-z0-9]{26}$`).
pub fn validate_vault_id(id: &str) -> Result<()> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let valid = PATTERN
        .get_or_init(|| Regex::new(r"^[a-z0-9]{26}$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(id));
    if !valid {
        return Err(ValidationError::InvalidVaultId(id.to_string()).into());
    }
    Ok(())
}

impl Vault {
    pub fn client(&self) -> Option<&Client> {
        self.client.get()
    }

    /// Check every field for consistency.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<()> {
        validate_vault_id(&self.id)?;

        let invalid = |reason: &str| -> crate::error::Error {
            ValidationError::InvalidVault(reason.to_string()).into()
        };

        if self.name.is_empty() {
            return Err(invalid("name cannot be empty"));
        }
        if self.content_version < 0 {
            return Err(invalid("content version must be a non-negative integer"));
        }
        let created = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|_| invalid("created_at must be a valid ISO 8601 date"))?;
        let updated = DateTime::parse_from_rfc3339(&self.updated_at)
            .map_err(|_| invalid("updated_at must be a valid ISO 8601 date"))?;
        if updated < created {
            return Err(invalid("updated_at cannot be earlier than created_at"));
        }
        if self.items < 0 {
            return Err(invalid("items must be a non-negative integer"));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(invalid("description cannot exceed 500 characters"));
        }
        if !matches!(self.kind.as_str(), "USER_CREATED" | "SYSTEM_GENERATED") {
            return Err(invalid("type must be one of USER_CREATED or SYSTEM_GENERATED"));
        }
        Ok(())
    }

    /// Items stored in this vault.
    pub fn list_items(&self) -> Result<Vec<Item>> {
        self.client.require()?.list_items(Some(&self.id))
    }

    pub fn set_icon(&self, icon: VaultIcon) -> Result<()> {
        self.client.require()?.update_vault_icon(&self.id, icon)
    }

    /// Grant a group a permission (and everything it depends on).
    pub fn grant_group(&self, group_id: &str, permission: Permission) -> Result<()> {
        self.client
            .require()?
            .grant_vault_group(&self.id, group_id, permission)
    }

    pub fn revoke_group(&self, group_id: &str, permission: Permission) -> Result<()> {
        self.client
            .require()?
            .revoke_vault_group(&self.id, group_id, permission)
    }

    pub fn delete(&self) -> Result<()> {
        self.client
            .require()?
            .run(Command::new(["vault", "delete", self.id.as_str()]))?;
        Ok(())
    }
}

/// Icons a vault can be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VaultIcon {
    Airplane,
    Application,
    ArtSupplies,
    BankersBox,
    BrownBriefcase,
    BrownGate,
    Buildings,
    Cabin,
    Castle,
    CircleOfDots,
    Coffee,
    ColorWheel,
    CurtainedWindow,
    Document,
    Doughnut,
    Fence,
    Galaxy,
    Gears,
    Globe,
    GreenBackpack,
    GreenGem,
    Handshake,
    HeartWithMonitor,
    House,
    IdCard,
    Jet,
    LargeShip,
    Luggage,
    Plant,
    Porthole,
    Puzzle,
    Rainbow,
    Record,
    RoundDoor,
    Sandals,
    Scales,
    Screwdriver,
    Shop,
    TallWindow,
    TreasureChest,
    VaultDoor,
    Vehicle,
    Wallet,
    Wrench,
}

impl VaultIcon {
    pub const ALL: [VaultIcon; 44] = [
        Self::Airplane,
        Self::Application,
        Self::ArtSupplies,
        Self::BankersBox,
        Self::BrownBriefcase,
        Self::BrownGate,
        Self::Buildings,
        Self::Cabin,
        Self::Castle,
        Self::CircleOfDots,
        Self::Coffee,
        Self::ColorWheel,
        Self::CurtainedWindow,
        Self::Document,
        Self::Doughnut,
        Self::Fence,
        Self::Galaxy,
        Self::Gears,
        Self::Globe,
        Self::GreenBackpack,
        Self::GreenGem,
        Self::Handshake,
        Self::HeartWithMonitor,
        Self::House,
        Self::IdCard,
        Self::Jet,
        Self::LargeShip,
        Self::Luggage,
        Self::Plant,
        Self::Porthole,
        Self::Puzzle,
        Self::Rainbow,
        Self::Record,
        Self::RoundDoor,
        Self::Sandals,
        Self::Scales,
        Self::Screwdriver,
        Self::Shop,
        Self::TallWindow,
        Self::TreasureChest,
        Self::VaultDoor,
        Self::Vehicle,
        Self::Wallet,
        Self::Wrench,
    ];

    /// Name as accepted by `op vault edit --icon`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Airplane => "airplane",
            Self::Application => "application",
            Self::ArtSupplies => "art-supplies",
            Self::BankersBox => "bankers-box",
            Self::BrownBriefcase => "brown-briefcase",
            Self::BrownGate => "brown-gate",
            Self::Buildings => "buildings",
            Self::Cabin => "cabin",
            Self::Castle => "castle",
            Self::CircleOfDots => "circle-of-dots",
            Self::Coffee => "coffee",
            Self::ColorWheel => "color-wheel",
            Self::CurtainedWindow => "curtained-window",
            Self::Document => "document",
            Self::Doughnut => "doughnut",
            Self::Fence => "fence",
            Self::Galaxy => "galaxy",
            Self::Gears => "gears",
            Self::Globe => "globe",
            Self::GreenBackpack => "green-backpack",
            Self::GreenGem => "green-gem",
            Self::Handshake => "handshake",
            Self::HeartWithMonitor => "heart-with-monitor",
            Self::House => "house",
            Self::IdCard => "id-card",
            Self::Jet => "jet",
            Self::LargeShip => "large-ship",
            Self::Luggage => "luggage",
            Self::Plant => "plant",
            Self::Porthole => "porthole",
            Self::Puzzle => "puzzle",
            Self::Rainbow => "rainbow",
            Self::Record => "record",
            Self::RoundDoor => "round-door",
            Self::Sandals => "sandals",
            Self::Scales => "scales",
            Self::Screwdriver => "screwdriver",
            Self::Shop => "shop",
            Self::TallWindow => "tall-window",
            Self::TreasureChest => "treasure-chest",
            Self::VaultDoor => "vault-door",
            Self::Vehicle => "vehicle",
            Self::Wallet => "wallet",
            Self::Wrench => "wrench",
        }
    }
}

impl fmt::Display for VaultIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VaultIcon {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|icon| icon.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidVault(format!("invalid icon name: {}", s)))
    }
}

impl Client {
    pub fn list_vaults(&self) -> Result<Vec<Vault>> {
        self.query_list(Command::new(["vault", "list"]))
    }

    /// Vault by name or id.
    pub fn vault(&self, identifier: &str) -> Result<Vault> {
        self.query(Command::new(["vault", "get", identifier]))
    }

    pub fn vault_by_name(&self, name: &str) -> Result<Vault> {
        self.vault(name)
    }

    /// Vault by id. The id format is checked before running `op`.
    pub fn vault_by_id(&self, id: &str) -> Result<Vault> {
        validate_vault_id(id)?;
        self.vault(id)
    }

    pub fn create_vault(
        &self,
        name: &str,
        description: Option<&str>,
        icon: Option<VaultIcon>,
    ) -> Result<Vault> {
        if name.is_empty() {
            return Err(ValidationError::Empty("vault name").into());
        }
        let mut cmd = Command::new(["vault", "create", name]);
        if let Some(description) = description {
            cmd = cmd.args(["--description", description]);
        }
        if let Some(icon) = icon {
            cmd = cmd.args(["--icon", icon.as_str()]);
        }
        self.query(cmd)
    }

    pub fn update_vault_icon(&self, vault_id: &str, icon: VaultIcon) -> Result<()> {
        validate_vault_id(vault_id)?;
        debug!(vault = %vault_id, icon = %icon, "updating vault icon");
        self.run(Command::new(["vault", "edit", vault_id, "--icon", icon.as_str()]))?;
        Ok(())
    }

    /// Grant a group `permission` on a vault, with its dependencies.
    pub fn grant_vault_group(
        &self,
        vault_id: &str,
        group_id: &str,
        permission: Permission,
    ) -> Result<()> {
        let permissions = permission::resolve_joined(permission);
        self.run(Command::new([
            "vault",
            "group",
            "grant",
            "--vault",
            vault_id,
            "--group",
            group_id,
            "--permissions",
            permissions.as_str(),
        ]))?;
        Ok(())
    }

    pub fn revoke_vault_group(
        &self,
        vault_id: &str,
        group_id: &str,
        permission: Permission,
    ) -> Result<()> {
        self.run(Command::new([
            "vault",
            "group",
            "revoke",
            "--vault",
            vault_id,
            "--group",
            group_id,
            "--permissions",
            permission.as_str(),
        ]))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn vault() -> Vault {
        serde_json::from_str(
            r#"{
                "id": "abcdefghijklmnopqrstuvwxyz",
                "name": "Engineering",
                "content_version": 4,
                "attribute_version": 1,
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-02-01T00:00:00Z",
                "items": 12,
                "description": "team secrets",
                "type": "USER_CREATED"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_vault_id() {
        assert!(validate_vault_id("abcdefghijklmnopqrstuvwxyz").is_ok());
        assert!(validate_vault_id("0123456789abcdefghijklmnop").is_ok());
        assert!(validate_vault_id("ABCDEFGHIJKLMNOPQRSTUVWXYZ").is_err());
        assert!(validate_vault_id("short").is_err());
        assert!(validate_vault_id("abcdefghijklmnopqrstuvwxyz0").is_err());
    }

    #[test]
    fn test_validate_vault() {
        assert!(vault().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_time_travel() {
        let mut v = vault();
        v.updated_at = "2023-01-01T00:00:00Z".to_string();
        assert!(matches!(
            v.validate(),
            Err(Error::Validation(ValidationError::InvalidVault(_)))
        ));
    }

    #[test]
    fn test_validate_rejects_long_description() {
        let mut v = vault();
        v.description = "x".repeat(501);
        assert!(v.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_type() {
        let mut v = vault();
        v.kind = "PERSONAL".to_string();
        assert!(v.validate().is_err());
    }

    #[test]
    fn test_icon_names() {
        assert_eq!(VaultIcon::IdCard.as_str(), "id-card");
        assert_eq!("heart-with-monitor".parse::<VaultIcon>().unwrap(), VaultIcon::HeartWithMonitor);
        assert!("not-an-icon".parse::<VaultIcon>().is_err());
        for icon in VaultIcon::ALL {
            let json = serde_json::to_value(icon).unwrap();
            assert_eq!(json, icon.as_str());
        }
    }

    #[test]
    fn test_detached_vault() {
        assert!(matches!(vault().delete(), Err(Error::Detached)));
    }
}
