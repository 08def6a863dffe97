//! Command-line interface.

pub mod directory;
pub mod output;
pub mod permissions;
pub mod session;
pub mod vault;

use clap::{Parser, Subcommand};

use crate::core::client::{Client, ClientBuilder};
use crate::core::config::Config;
use crate::error::Result;

/// opcli - A typed client for the 1Password CLI.
#[derive(Parser)]
#[command(
    name = "opcli",
    about = "A typed client for the 1Password CLI",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Account to sign in to (user UUID, email, or sign-in URL)
    #[arg(long, global = true, env = "OPCLI_ACCOUNT")]
    pub account: Option<String>,

    /// Sign in with a service account token instead of an account
    #[arg(
        long,
        global = true,
        env = "OP_SERVICE_ACCOUNT_TOKEN",
        hide_env_values = true
    )]
    pub service_account_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Sign in and show the connected account
    Signin,

    /// Show the signed-in user
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List accounts configured in the op CLI
    Accounts {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List vaults
    Vaults {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List items
    Items {
        /// Only list items in this vault (name or ID)
        #[arg(long)]
        vault: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List users
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List groups
    Groups {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the permissions granted along with a vault permission
    Permissions {
        /// Permission name (e.g., edit_items)
        permission: String,
    },

    /// Show service account rate-limit usage
    RateLimits {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the op binary in use and its version
    Version,
}

/// Connection settings shared by every command.
pub struct Context {
    pub config: Config,
    pub account: Option<String>,
    pub service_account_token: Option<String>,
}

impl Context {
    /// Context from parsed flags and the config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a config file exists but is invalid.
    pub fn load(account: Option<String>, service_account_token: Option<String>) -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
            account,
            service_account_token: service_account_token.filter(|t| !t.is_empty()),
        })
    }

    /// A client that is not signed in.
    pub fn client(&self) -> Result<Client> {
        ClientBuilder::from_config(&self.config).build()
    }

    /// Account selector from the flag, falling back to the config file.
    pub fn account_selector(&self) -> Option<&str> {
        self.account
            .as_deref()
            .or(self.config.account.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Execute a command.
pub fn execute(command: Command, ctx: &Context) -> Result<()> {
    use Command::*;

    match command {
        Signin => session::signin(ctx),
        Whoami { json } => session::whoami(ctx, json),
        Accounts { json } => session::accounts(ctx, json),
        Vaults { json } => vault::list_vaults(ctx, json),
        Items { vault, json } => vault::list_items(ctx, vault.as_deref(), json),
        Users { json } => directory::list_users(ctx, json),
        Groups { json } => directory::list_groups(ctx, json),
        Permissions { permission } => permissions::execute(&permission),
        RateLimits { json } => session::rate_limits(ctx, json),
        Version => session::version(ctx),
    }
}
