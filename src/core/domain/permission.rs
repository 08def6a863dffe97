//! Vault permissions and their dependencies.
//!
//! Granting a granular permission through `op` also requires the
//! permissions it builds on (editing items needs viewing them, and so on).
//! [`resolve`] expands a permission into the full set to grant.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // Granular
    ViewItems,
    CreateItems,
    EditItems,
    ArchiveItems,
    DeleteItems,
    ViewAndCopyPasswords,
    ViewItemHistory,
    ImportItems,
    ExportItems,
    CopyAndShareItems,
    PrintItems,
    ManageVault,

    // Broad
    AllowViewing,
    AllowEditing,
    AllowManaging,

    // Derived
    MoveItems,
}

impl Permission {
    pub const ALL: [Permission; 16] = [
        Self::ViewItems,
        Self::CreateItems,
        Self::EditItems,
        Self::ArchiveItems,
        Self::DeleteItems,
        Self::ViewAndCopyPasswords,
        Self::ViewItemHistory,
        Self::ImportItems,
        Self::ExportItems,
        Self::CopyAndShareItems,
        Self::PrintItems,
        Self::ManageVault,
        Self::AllowViewing,
        Self::AllowEditing,
        Self::AllowManaging,
        Self::MoveItems,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewItems => "view_items",
            Self::CreateItems => "create_items",
            Self::EditItems => "edit_items",
            Self::ArchiveItems => "archive_items",
            Self::DeleteItems => "delete_items",
            Self::ViewAndCopyPasswords => "view_and_copy_passwords",
            Self::ViewItemHistory => "view_item_history",
            Self::ImportItems => "import_items",
            Self::ExportItems => "export_items",
            Self::CopyAndShareItems => "copy_and_share_items",
            Self::PrintItems => "print_items",
            Self::ManageVault => "manage_vault",
            Self::AllowViewing => "allow_viewing",
            Self::AllowEditing => "allow_editing",
            Self::AllowManaging => "allow_managing",
            Self::MoveItems => "move_items",
        }
    }

    /// Permissions required alongside this one, itself included.
    ///
    /// Empty for permissions with no dependency entry.
    pub fn dependencies(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            CreateItems => &[CreateItems, ViewItems],
            ViewAndCopyPasswords => &[ViewItems, ViewAndCopyPasswords],
            EditItems => &[EditItems, ViewAndCopyPasswords, ViewItems],
            ArchiveItems => &[ArchiveItems, EditItems, ViewAndCopyPasswords, ViewItems],
            DeleteItems => &[DeleteItems, EditItems, ViewAndCopyPasswords, ViewItems],
            ViewItemHistory => &[ViewItemHistory, ViewAndCopyPasswords, ViewItems],
            ImportItems => &[ImportItems, CreateItems, ViewItems],
            ExportItems => &[ExportItems, ViewItemHistory, ViewAndCopyPasswords, ViewItems],
            CopyAndShareItems => &[
                CopyAndShareItems,
                ViewItemHistory,
                ViewAndCopyPasswords,
                ViewItems,
            ],
            PrintItems => &[PrintItems, ViewItemHistory, ViewAndCopyPasswords, ViewItems],
            _ => &[],
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s.trim())
            .ok_or_else(|| ValidationError::InvalidPermission(s.to_string()))
    }
}

/// The deduplicated set of permissions to grant for `permission`.
///
/// A permission without dependencies resolves to itself.
pub fn resolve(permission: Permission) -> BTreeSet<Permission> {
    let deps = permission.dependencies();
    if deps.is_empty() {
        return BTreeSet::from([permission]);
    }
    deps.iter().copied().collect()
}

/// [`resolve`] rendered as the comma-separated list `op` expects.
pub fn resolve_joined(permission: Permission) -> String {
    resolve(permission)
        .iter()
        .map(Permission::as_str)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(set: BTreeSet<Permission>) -> BTreeSet<&'static str> {
        set.iter().map(Permission::as_str).collect()
    }

    #[test]
    fn test_resolve_edit_items() {
        let resolved = resolve("edit_items".parse().unwrap());
        assert_eq!(
            names(resolved),
            BTreeSet::from(["edit_items", "view_and_copy_passwords", "view_items"])
        );
    }

    #[test]
    fn test_resolve_single_dependency() {
        assert_eq!(
            names(resolve(Permission::CreateItems)),
            BTreeSet::from(["create_items", "view_items"])
        );
    }

    #[test]
    fn test_resolve_without_dependencies() {
        assert_eq!(
            names(resolve(Permission::ManageVault)),
            BTreeSet::from(["manage_vault"])
        );
        assert_eq!(
            names(resolve(Permission::MoveItems)),
            BTreeSet::from(["move_items"])
        );
    }

    #[test]
    fn test_resolve_joined_has_no_duplicates() {
        let joined = resolve_joined(Permission::DeleteItems);
        let parts: Vec<_> = joined.split(',').collect();
        assert_eq!(parts.len(), 4);
        assert!(parts.contains(&"delete_items"));
    }

    #[test]
    fn test_parse_round_trip() {
        for p in Permission::ALL {
            assert_eq!(p.as_str().parse::<Permission>().unwrap(), p);
            assert_eq!(serde_json::to_value(p).unwrap(), p.as_str());
        }
        assert!("fly".parse::<Permission>().is_err());
    }
}
