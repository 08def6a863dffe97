//! Sign-in and account discovery.
//!
//! Interactive sign-in tries the passwordless flow first (biometric unlock or
//! an existing desktop-app session) and falls back to piping the account
//! password on stdin when `op` asks for one. Service-account sign-in uses a
//! token and asks `op` who it is, since that flow returns no account record.

use tracing::{debug, error, info};
use zeroize::Zeroizing;

use crate::core::account::{normalize_url, Account};
use crate::core::client::{Auth, Client};
use crate::core::command::Command;
use crate::core::constants::{
    session_env_var, PASSWORD_PROMPT_PHRASES, SERVICE_ACCOUNT_TOKEN_ENV, SESSION_ENV_PREFIX,
};
use crate::core::decode;
use crate::core::domain::User;
use crate::core::exec::ChildEnv;
use crate::error::{AuthError, DecodeError, Error, Result};

impl Client {
    /// Sign in to an account.
    ///
    /// On success the session token is kept in the client's child
    /// environment as `OP_SESSION_<user_uuid>` and the account is stamped
    /// with the sign-in time.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingAccount` if the account has no user UUID,
    /// `AuthError::SignInFailed` with the stderr of `op` when sign-in is
    /// refused, or `AuthError::NoSessionToken` if the password flow printed
    /// no token.
    pub fn sign_in(&self, account: Account) -> Result<()> {
        if account.user_uuid.is_empty() {
            return Err(Error::MissingAccount);
        }
        debug!(account = %account.user_uuid, email = %account.email, "signing in to account");

        debug!("attempting passwordless signin");
        let env = self.signin_env();
        let attempt = self.spawn_with_env(
            &Command::signin(&account.user_uuid),
            &env,
            self.signin_timeout(),
        );

        let token = match attempt {
            Ok(stdout) => {
                let token = read_token(stdout)?;
                if token.is_empty() {
                    debug!("passwordless signin printed no token");
                    None
                } else {
                    Some(token)
                }
            }
            Err(Error::Command(e)) if e.timed_out || needs_password(&e.stderr) => {
                debug!(timed_out = e.timed_out, "password authentication required");
                None
            }
            Err(Error::Command(e)) => {
                error!(stderr = %e.stderr.trim(), "signin failed");
                return Err(AuthError::SignInFailed(e.to_string()).into());
            }
            Err(e) => return Err(e),
        };

        let token = match token {
            Some(token) => token,
            None => self.sign_in_with_password(&account, &env)?,
        };

        self.complete_sign_in(account, token);
        Ok(())
    }

    fn sign_in_with_password(
        &self,
        account: &Account,
        env: &ChildEnv,
    ) -> Result<Zeroizing<String>> {
        let password = self.prompt().read_password(account)?;
        let cmd = Command::signin(&account.user_uuid).secret(password);

        let stdout = self
            .spawn_with_env(&cmd, env, self.signin_timeout())
            .map_err(|e| match e {
                Error::Command(e) => {
                    error!(stderr = %e.stderr.trim(), "password signin failed");
                    AuthError::SignInFailed(e.to_string()).into()
                }
                other => other,
            })?;

        let token = read_token(stdout)?;
        if token.is_empty() {
            return Err(AuthError::NoSessionToken.into());
        }
        Ok(token)
    }

    /// Child environment for `op signin`: no service-account token and no
    /// earlier session tokens.
    fn signin_env(&self) -> ChildEnv {
        without_credentials(&self.state().env)
    }

    fn complete_sign_in(&self, mut account: Account, token: Zeroizing<String>) {
        account.set_sign_in_info(token.clone());
        info!(url = %account.url, email = %account.email, "connected to 1Password");

        let mut state = self.state_mut();
        state.env = without_credentials(&state.env);
        state
            .env
            .insert(session_env_var(&account.user_uuid), token);
        state.auth = Auth::Interactive(account);
    }

    /// Sign in with a service-account token.
    ///
    /// The token is handed to child processes as `OP_SERVICE_ACCOUNT_TOKEN`,
    /// then `op user get --me` fills in the account's user UUID and email.
    /// Any interactive session on this client is dropped.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ServiceAccount` if the self lookup fails; the
    /// client is left unauthenticated.
    pub fn sign_in_with_service_account(&self, token: impl Into<String>) -> Result<()> {
        let token = Zeroizing::new(token.into());
        debug!("signing in with service account token");

        {
            let mut state = self.state_mut();
            state.env.retain(|k, _| !k.starts_with(SESSION_ENV_PREFIX));
            state
                .env
                .insert(SERVICE_ACCOUNT_TOKEN_ENV.to_string(), token.clone());
            state.auth = Auth::ServiceAccount {
                token: token.clone(),
                account: Account::default(),
            };
        }

        let me = self
            .spawn(
                &Command::new(["user", "get", "--me"]).json(),
                self.command_timeout(),
            )
            .and_then(|out| decode::decode_one::<User>(self, &out));

        let mut state = self.state_mut();
        match me {
            Ok(user) => {
                info!(email = %user.email, "connected to 1Password as service account");
                let mut account = Account::with_user_uuid(user.id);
                account.email = user.email;
                state.auth = Auth::ServiceAccount { token, account };
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "service account lookup failed");
                state.env.remove(SERVICE_ACCOUNT_TOKEN_ENV);
                state.auth = Auth::Unauthenticated;
                Err(AuthError::ServiceAccount(e.to_string()).into())
            }
        }
    }

    /// Accounts configured in the CLI (`op account list`).
    ///
    /// Needs no sign-in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NoAccounts` if the list is empty.
    pub fn list_accounts(&self) -> Result<Vec<Account>> {
        debug!("retrieving 1Password account details");

        let output = self.spawn(
            &Command::new(["account", "list"]).json(),
            self.command_timeout(),
        )?;
        let accounts: Vec<Account> = decode::decode(&output)?;
        if accounts.is_empty() {
            error!("no 1Password accounts found");
            return Err(AuthError::NoAccounts.into());
        }
        Ok(accounts)
    }

    pub fn account_by_user_uuid(&self, user_uuid: &str) -> Result<Account> {
        self.find_account(user_uuid, |a| a.user_uuid == user_uuid)
    }

    pub fn account_by_account_uuid(&self, account_uuid: &str) -> Result<Account> {
        self.find_account(account_uuid, |a| a.account_uuid == account_uuid)
    }

    pub fn account_by_email(&self, email: &str) -> Result<Account> {
        self.find_account(email, |a| a.email.eq_ignore_ascii_case(email))
    }

    /// Account whose sign-in address matches `url`, ignoring scheme, path
    /// and case.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MultipleAccounts` if more than one account
    /// matches.
    pub fn account_by_url(&self, url: &str) -> Result<Account> {
        let wanted = normalize_url(url);
        let mut matching: Vec<Account> = self
            .list_accounts()?
            .into_iter()
            .filter(|a| normalize_url(&a.url) == wanted)
            .collect();

        match matching.len() {
            0 => Err(AuthError::AccountNotFound(url.to_string()).into()),
            1 => Ok(matching.remove(0)),
            _ => Err(AuthError::MultipleAccounts(url.to_string()).into()),
        }
    }

    /// Resolve an account by user UUID, email or URL.
    pub fn resolve_account(&self, selector: &str) -> Result<Account> {
        if selector.contains('@') {
            self.account_by_email(selector)
        } else if selector.contains('.') {
            self.account_by_url(selector)
        } else {
            self.account_by_user_uuid(selector)
        }
    }

    fn find_account(&self, label: &str, pred: impl Fn(&Account) -> bool) -> Result<Account> {
        self.list_accounts()?
            .into_iter()
            .find(|a| pred(a))
            .ok_or_else(|| AuthError::AccountNotFound(label.to_string()).into())
    }
}

fn without_credentials(env: &ChildEnv) -> ChildEnv {
    env.iter()
        .filter(|(k, _)| *k != SERVICE_ACCOUNT_TOKEN_ENV && !k.starts_with(SESSION_ENV_PREFIX))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn needs_password(stderr: &str) -> bool {
    let stderr = stderr.to_lowercase();
    PASSWORD_PROMPT_PHRASES.iter().any(|p| stderr.contains(p))
}

fn read_token(stdout: Vec<u8>) -> Result<Zeroizing<String>> {
    let stdout = Zeroizing::new(stdout);
    let raw = std::str::from_utf8(&stdout).map_err(DecodeError::Utf8)?;
    Ok(Zeroizing::new(raw.trim().to_string()))
}
