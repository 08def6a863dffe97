//! Password input for the sign-in fallback.

use std::io::{self, IsTerminal};

use dialoguer::Password;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::account::Account;
use crate::error::{AuthError, Result};

/// Source of the account password when passwordless sign-in is not
/// available.
pub trait PasswordPrompt: Send + Sync {
    fn read_password(&self, account: &Account) -> Result<Zeroizing<String>>;
}

/// Reads the password from the controlling terminal with echo disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn read_password(&self, account: &Account) -> Result<Zeroizing<String>> {
        debug!("prompting for 1Password password");

        if !io::stdin().is_terminal() {
            return Err(AuthError::NoTerminal.into());
        }

        let prompt = if account.email.is_empty() {
            "Enter your 1Password password".to_string()
        } else {
            format!("Enter the 1Password password for {}", account.email)
        };

        let password = Password::new()
            .with_prompt(prompt)
            .allow_empty_password(false)
            .interact()?;

        Ok(Zeroizing::new(password))
    }
}

/// Returns a fixed password. For non-interactive hosts and tests.
pub struct StaticPrompt(Zeroizing<String>);

impl StaticPrompt {
    pub fn new(password: impl Into<String>) -> Self {
        Self(Zeroizing::new(password.into()))
    }
}

impl PasswordPrompt for StaticPrompt {
    fn read_password(&self, _account: &Account) -> Result<Zeroizing<String>> {
        Ok(self.0.clone())
    }
}
