//! Constants used throughout opcli.
//!
//! Centralizes the `op` argument grammar and session parameters.

use std::time::Duration;

/// Name of the 1Password CLI executable.
#[cfg(not(windows))]
pub const BINARY_NAME: &str = "op";

/// Name of the 1Password CLI executable.
#[cfg(windows)]
pub const BINARY_NAME: &str = "op.exe";

/// Output format flag appended to every non-signin command.
pub const FORMAT_JSON: &str = "--format=json";

/// Account selector flag.
pub const ACCOUNT_FLAG: &str = "--account";

/// Raw output flag used by `op signin`.
pub const RAW_FLAG: &str = "--raw";

/// Verb for signing in.
pub const SIGNIN_VERB: &str = "signin";

/// Verbs that need a terminal or piped secret input.
pub const INTERACTIVE_VERBS: &[&str] = &["signin", "account", "user"];

/// Prefix of the per-account session variable (`OP_SESSION_<user_uuid>`).
pub const SESSION_ENV_PREFIX: &str = "OP_SESSION_";

/// Variable carrying a service-account token.
pub const SERVICE_ACCOUNT_TOKEN_ENV: &str = "OP_SERVICE_ACCOUNT_TOKEN";

/// Session lifetime tracked client-side.
///
/// `op` sessions expire after 30 minutes of inactivity; one minute of
/// buffer is kept.
pub const SESSION_EXPIRY: Duration = Duration::from_secs(1740);

/// Default bound on the passwordless sign-in attempt.
pub const DEFAULT_SIGNIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Stderr phrases (lowercase) meaning `op` wants a password.
pub const PASSWORD_PROMPT_PHRASES: &[&str] = &["enter the password for", "authentication"];

/// Configuration file name.
pub const CONFIG_FILE: &str = "opcli.toml";

/// Configuration directory relative to the user config dir.
pub const CONFIG_DIR: &str = "opcli";

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "OPCLI_LOG";

/// Session token variable name for a user.
pub fn session_env_var(user_uuid: &str) -> String {
    format!("{}{}", SESSION_ENV_PREFIX, user_uuid)
}
