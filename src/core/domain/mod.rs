//! Domain records exchanged with `op`.
//!
//! Records decoded through the client carry a back-reference to it, so
//! `item.save()` or `user.delete()` work without passing the client around.

pub mod group;
pub mod item;
pub mod permission;
pub mod service_account;
pub mod user;
pub mod vault;

pub use group::{Group, GroupRole};
pub use item::{
    Category, Field, FieldPurpose, FieldType, Item, ItemUrl, PasswordDetails, Section, VaultRef,
};
pub use permission::Permission;
pub use service_account::RateLimit;
pub use user::{User, UserState, UserType};
pub use vault::{Vault, VaultIcon};
