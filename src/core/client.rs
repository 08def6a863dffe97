//! The client handle.
//!
//! [`Client`] is the entry point for every operation. It owns the resolved
//! `op` path, the authentication state and the environment handed to child
//! processes. Cloning is cheap: clones share the same state, and every record
//! decoded from `op` output holds one so it can save or delete itself.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::account::Account;
use crate::core::command::{Command, Mode};
use crate::core::config::Config;
use crate::core::constants::DEFAULT_SIGNIN_TIMEOUT;
use crate::core::decode::{self, Attach};
use crate::core::exec::{ChildEnv, Executor};
use crate::core::locate;
use crate::core::prompt::{PasswordPrompt, TerminalPrompt};
use crate::error::{Error, Result, ValidationError};

/// Handle to the 1Password CLI.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

struct Inner {
    executor: Executor,
    prompt: Box<dyn PasswordPrompt>,
    signin_timeout: Option<Duration>,
    command_timeout: Option<Duration>,
    state: RwLock<State>,
}

#[derive(Default)]
pub(crate) struct State {
    pub(crate) auth: Auth,
    pub(crate) env: ChildEnv,
}

/// Authentication state. Interactive and service-account sessions never
/// coexist on one client.
#[derive(Default)]
pub(crate) enum Auth {
    #[default]
    Unauthenticated,
    Interactive(Account),
    ServiceAccount {
        #[allow(dead_code)]
        token: Zeroizing<String>,
        account: Account,
    },
}

impl Auth {
    pub(crate) fn account(&self) -> Option<&Account> {
        match self {
            Auth::Unauthenticated => None,
            Auth::Interactive(account) => Some(account),
            Auth::ServiceAccount { account, .. } => Some(account),
        }
    }
}

impl Client {
    /// Client for the `op` found on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `Error::NotFound` if `op` is not installed.
    pub fn new() -> Result<Self> {
        ClientBuilder::new().build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Path of the `op` binary in use.
    pub fn binary(&self) -> &Path {
        self.inner.executor.binary()
    }

    /// Whether two handles share the same state.
    pub fn ptr_eq(&self, other: &Client) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// The signed-in account, if any.
    pub fn account(&self) -> Option<Account> {
        self.state().auth.account().cloned()
    }

    pub fn is_service_account(&self) -> bool {
        matches!(self.state().auth, Auth::ServiceAccount { .. })
    }

    /// Whether the current session can still be used.
    ///
    /// Interactive sessions expire 29 minutes after sign-in. Service-account
    /// tokens are not tracked client-side.
    pub fn is_session_valid(&self) -> bool {
        match &self.state().auth {
            Auth::Unauthenticated => false,
            Auth::Interactive(account) => account.is_session_valid(),
            Auth::ServiceAccount { .. } => true,
        }
    }

    /// `op --version`.
    pub fn version(&self) -> Result<String> {
        locate::version(self.binary())
    }

    /// Add the account selector and output format to a command.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingAccount` if nobody is signed in.
    pub fn build(&self, cmd: Command) -> Result<Command> {
        let state = self.state();
        let user_uuid = state
            .auth
            .account()
            .map(|a| a.user_uuid.as_str())
            .filter(|id| !id.is_empty())
            .ok_or(Error::MissingAccount)?;
        Ok(cmd.for_account(user_uuid))
    }

    /// Run a domain command for the signed-in account and return stdout.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingAccount` before spawning anything if nobody is
    /// signed in, or `CommandError` if `op` fails.
    pub fn run(&self, cmd: Command) -> Result<Vec<u8>> {
        let cmd = self.build(cmd)?;
        self.spawn(&cmd, self.inner.command_timeout)
    }

    /// Run a command and decode a single record from its output.
    pub fn query<T>(&self, cmd: Command) -> Result<T>
    where
        T: DeserializeOwned + Attach,
    {
        let output = self.run(cmd)?;
        decode::decode_one(self, &output)
    }

    /// Run a command and decode a list of records from its output.
    pub fn query_list<T>(&self, cmd: Command) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Attach,
    {
        let output = self.run(cmd)?;
        decode::decode_list(self, &output)
    }

    /// Run raw `op` arguments.
    ///
    /// The mode follows the leading verb: `signin` prompts for the password
    /// and pipes it on stdin, `account` and `user` attach to the terminal,
    /// anything else is captured with `--format=json` appended. No account
    /// selector is added. Sign-in is bounded by the sign-in timeout, every
    /// other mode by the command timeout.
    pub fn execute<I, S>(&self, args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let cmd = Command::from_args(args);
        if cmd.argv().is_empty() {
            return Err(ValidationError::NoArguments.into());
        }

        let (cmd, timeout) = match cmd.mode() {
            Mode::SignIn => {
                let cmd = if cmd.stdin().is_none() {
                    let account = self.account().unwrap_or_default();
                    let password = self.inner.prompt.read_password(&account)?;
                    cmd.secret(password)
                } else {
                    cmd
                };
                (cmd, self.inner.signin_timeout)
            }
            Mode::Interactive => (cmd, self.inner.command_timeout),
            Mode::Capture => (cmd.json(), self.inner.command_timeout),
        };
        self.spawn(&cmd, timeout)
    }

    /// Run a command as-is with the client's child environment.
    pub(crate) fn spawn(&self, cmd: &Command, timeout: Option<Duration>) -> Result<Vec<u8>> {
        let env = self.state().env.clone();
        self.spawn_with_env(cmd, &env, timeout)
    }

    /// Run a command with an explicit child environment.
    pub(crate) fn spawn_with_env(
        &self,
        cmd: &Command,
        env: &ChildEnv,
        timeout: Option<Duration>,
    ) -> Result<Vec<u8>> {
        self.inner.executor.run(cmd, env, timeout)
    }

    pub(crate) fn prompt(&self) -> &dyn PasswordPrompt {
        self.inner.prompt.as_ref()
    }

    pub(crate) fn signin_timeout(&self) -> Option<Duration> {
        self.inner.signin_timeout
    }

    pub(crate) fn command_timeout(&self) -> Option<Duration> {
        self.inner.command_timeout
    }

    pub(crate) fn state(&self) -> RwLockReadGuard<'_, State> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn state_mut(&self) -> RwLockWriteGuard<'_, State> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Client")
            .field("binary", &self.binary())
            .field("account", &state.auth.account().map(|a| &a.user_uuid))
            .field(
                "service_account",
                &matches!(state.auth, Auth::ServiceAccount { .. }),
            )
            .finish()
    }
}

/// Configures a [`Client`].
pub struct ClientBuilder {
    binary: Option<PathBuf>,
    prompt: Box<dyn PasswordPrompt>,
    signin_timeout: Option<Duration>,
    command_timeout: Option<Duration>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            binary: None,
            prompt: Box::new(TerminalPrompt),
            signin_timeout: Some(DEFAULT_SIGNIN_TIMEOUT),
            command_timeout: None,
        }
    }

    /// Builder seeded from a loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        let mut builder = Self::new();
        builder.binary = config.binary.clone();
        builder.signin_timeout = config.signin_timeout();
        builder.command_timeout = config.command_timeout();
        builder
    }

    /// Use this `op` binary instead of searching `PATH`.
    pub fn binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.binary = Some(path.into());
        self
    }

    /// Where the sign-in fallback gets the password from.
    pub fn prompt(mut self, prompt: impl PasswordPrompt + 'static) -> Self {
        self.prompt = Box::new(prompt);
        self
    }

    /// Bound on sign-in attempts. `None` waits indefinitely.
    pub fn signin_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.signin_timeout = timeout;
        self
    }

    /// Bound on every other `op` invocation, interactive ones included.
    /// `None`, the default, waits indefinitely.
    pub fn command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// # Errors
    ///
    /// Returns `Error::NotFound` if no binary was given and `op` is not on
    /// `PATH`.
    pub fn build(self) -> Result<Client> {
        let binary = match self.binary {
            Some(path) => path,
            None => locate::locate()?,
        };
        debug!(binary = %binary.display(), "creating op client");

        Ok(Client {
            inner: Arc::new(Inner {
                executor: Executor::new(binary),
                prompt: self.prompt,
                signin_timeout: self.signin_timeout,
                command_timeout: self.command_timeout,
                state: RwLock::new(State::default()),
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
