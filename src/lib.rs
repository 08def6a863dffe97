//! opcli - A typed Rust client for the 1Password command-line tool.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── commands      # Subcommand handlers
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── locate        # Find the op binary
//!     ├── command       # Argument lists and stdin payloads
//!     ├── exec          # Run op with timeouts and piped stdio
//!     ├── client        # Shared client handle and auth state
//!     ├── session       # Sign-in flows and account lookup
//!     ├── decode        # JSON decoding and client back-references
//!     ├── config        # opcli.toml
//!     └── domain/       # Vaults, items, users, groups, permissions
//! ```
//!
//! # Example
//!
//! ```no_run
//! use opcli::Client;
//!
//! # fn main() -> opcli::Result<()> {
//! let client = Client::new()?;
//! let account = client.resolve_account("me@example.com")?;
//! client.sign_in(account)?;
//!
//! for vault in client.list_vaults()? {
//!     println!("{} ({} items)", vault.name, vault.items);
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod core;
pub mod error;

pub use crate::core::account::Account;
pub use crate::core::client::{Client, ClientBuilder};
pub use crate::core::command::{Command, Mode};
pub use crate::core::config::Config;
pub use crate::core::domain::{
    Category, Field, FieldPurpose, FieldType, Group, GroupRole, Item, ItemUrl, Permission,
    RateLimit, Section, User, Vault, VaultIcon,
};
pub use crate::core::prompt::{PasswordPrompt, StaticPrompt, TerminalPrompt};
pub use crate::error::{Error, Result};
