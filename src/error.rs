//! Error types.
//!
//! A single top-level [`Error`] wraps the category errors so callers can
//! match on the failure kind: the `op` binary failed ([`CommandError`]), it
//! succeeded but printed something unexpected ([`DecodeError`]), sign-in went
//! wrong ([`AuthError`]), or a client-side check rejected the request
//! ([`ValidationError`]).

use std::fmt;
use std::process::ExitStatus;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no valid op executable found in PATH")]
    NotFound,

    #[error("account information is missing: sign in first")]
    MissingAccount,

    #[error("record is not attached to a client: fetch it through the client first")]
    Detached,

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stderr captured from the `op` process, when the failure came from it.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::Command(e) if !e.stderr.trim().is_empty() => Some(e.stderr.trim()),
            Error::Auth(AuthError::SignInFailed(stderr)) => Some(stderr),
            _ => None,
        }
    }
}

/// Sign-in failures.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("signin failed: {0}")]
    SignInFailed(String),

    #[error("no session token received from signin")]
    NoSessionToken,

    #[error("service account sign-in failed: {0}")]
    ServiceAccount(String),

    #[error("not authenticated as a service account")]
    NotServiceAccount,

    #[error("no accounts found")]
    NoAccounts,

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("multiple accounts found: URL {0}")]
    MultipleAccounts(String),

    #[error("{0} accounts configured: choose one with --account")]
    AccountRequired(usize),

    #[error("password input requires a terminal")]
    NoTerminal,
}

/// A non-zero exit (or failure to run) of the `op` process.
///
/// Display prefers the captured stderr, since it is what the tool itself
/// said went wrong.
#[derive(Debug)]
pub struct CommandError {
    /// Captured stderr, possibly empty.
    pub stderr: String,
    /// Exit status if the process ran to completion.
    pub status: Option<ExitStatus>,
    /// Spawn/wait failure, if the process could not be run at all.
    pub source: Option<std::io::Error>,
    /// Set when the process was killed after exceeding its timeout.
    pub timed_out: bool,
}

impl CommandError {
    /// Error built from captured stderr and an exit status.
    pub fn exited(stderr: impl Into<String>, status: ExitStatus) -> Self {
        Self {
            stderr: stderr.into(),
            status: Some(status),
            source: None,
            timed_out: false,
        }
    }

    /// Error for a process that could not be spawned or awaited.
    pub fn io(source: std::io::Error) -> Self {
        Self {
            stderr: String::new(),
            status: None,
            source: Some(source),
            timed_out: false,
        }
    }

    /// Error for a process killed after its deadline.
    pub fn timeout(stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            status: None,
            source: None,
            timed_out: true,
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return f.write_str(stderr);
        }
        if self.timed_out {
            return f.write_str("op command timed out");
        }
        match (&self.source, &self.status) {
            (Some(e), _) => write!(f, "failed to run op: {}", e),
            (None, Some(status)) => write!(f, "op exited with {}", status),
            (None, None) => f.write_str("op command failed"),
        }
    }
}

impl std::error::Error for CommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// The tool ran but its output did not have the expected shape.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to parse op output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("op output is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("failed to serialize request payload: {0}")]
    Encode(serde_json::Error),
}

/// Client-side checks performed before running `op`.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("invalid vault ID format: {0}")]
    InvalidVaultId(String),

    #[error("invalid vault: {0}")]
    InvalidVault(String),

    #[error("invalid email format: {0}")]
    InvalidEmail(String),

    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("item ID should be empty for new items")]
    ItemIdNotEmpty,

    #[error("cannot delete the only URL of an item: the op CLI does not support it")]
    LastUrl,

    #[error("URL not found on item: {0}")]
    UrlNotFound(String),

    #[error("section not found on item: {0}")]
    SectionNotFound(String),

    #[error("field not found in section: {0}")]
    FieldNotFound(String),

    #[error("unknown permission: {0}")]
    InvalidPermission(String),

    #[error("unknown group role: {0}")]
    InvalidRole(String),

    #[error("no arguments provided")]
    NoArguments,
}

/// Configuration file failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn failing_status() -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(1 << 8)
    }

    #[cfg(unix)]
    #[test]
    fn test_command_error_prefers_stderr() {
        let err = CommandError::exited("vault not found\n", failing_status());
        assert_eq!(err.to_string(), "vault not found");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_error_falls_back_to_status() {
        let err = CommandError::exited("  ", failing_status());
        assert!(err.to_string().contains("exited"));
    }

    #[test]
    fn test_command_error_io_source() {
        let err = CommandError::io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        assert!(err.to_string().contains("no such file"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_stderr_accessor() {
        let err: Error = CommandError::timeout("").into();
        assert_eq!(err.stderr(), None);
        assert_eq!(err.to_string(), "op command timed out");

        let err: Error = AuthError::SignInFailed("bad password".to_string()).into();
        assert_eq!(err.stderr(), Some("bad password"));
    }
}
