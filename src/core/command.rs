//! Command descriptors and argument building.
//!
//! A [`Command`] carries its own execution [`Mode`] as data, so the executor
//! never re-derives interactivity from the verb string. Building a command
//! for a signed-in account injects `--account <id>` and `--format=json`
//! exactly once, no matter what the caller already supplied.

use std::fmt;

use serde::Serialize;
use zeroize::Zeroizing;

use crate::core::constants::{
    ACCOUNT_FLAG, FORMAT_JSON, INTERACTIVE_VERBS, RAW_FLAG, SIGNIN_VERB,
};
use crate::error::{DecodeError, Result};

/// How a command talks to the `op` process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Stdout/stderr captured; JSON output expected.
    Capture,
    /// `op signin`: raw token on stdout, optional secret piped on stdin.
    SignIn,
    /// Streams inherited from the calling process.
    Interactive,
}

impl Mode {
    /// Classify raw arguments by their leading verb.
    ///
    /// Used only for untyped commands; typed helpers choose the mode
    /// directly.
    pub fn classify<S: AsRef<str>>(args: &[S]) -> Self {
        match args.first().map(|a| a.as_ref()) {
            Some(SIGNIN_VERB) => Mode::SignIn,
            Some(verb) if INTERACTIVE_VERBS.contains(&verb) => Mode::Interactive,
            _ => Mode::Capture,
        }
    }
}

/// Bytes written to the child's stdin.
pub enum Stdin {
    /// A password or token; wiped from memory on drop.
    Secret(Zeroizing<String>),
    /// A serialized request document.
    Json(Vec<u8>),
}

impl Stdin {
    /// Bytes as written to the pipe. Secrets are newline-terminated.
    pub(crate) fn bytes(&self) -> Zeroizing<Vec<u8>> {
        match self {
            Stdin::Secret(secret) => {
                let mut bytes = Vec::with_capacity(secret.len() + 1);
                bytes.extend_from_slice(secret.as_bytes());
                bytes.push(b'\n');
                Zeroizing::new(bytes)
            }
            Stdin::Json(doc) => Zeroizing::new(doc.clone()),
        }
    }
}

impl fmt::Debug for Stdin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stdin::Secret(_) => f.write_str("Stdin::Secret(<redacted>)"),
            Stdin::Json(doc) => write!(f, "Stdin::Json({} bytes)", doc.len()),
        }
    }
}

/// One invocation of `op`.
#[derive(Debug)]
pub struct Command {
    args: Vec<String>,
    mode: Mode,
    stdin: Option<Stdin>,
}

impl Command {
    /// A captured command, e.g. `Command::new(["vault", "list"])`.
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
            mode: Mode::Capture,
            stdin: None,
        }
    }

    /// A command whose mode is derived from its leading verb.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cmd = Self::new(args);
        cmd.mode = Mode::classify(&cmd.args);
        if cmd.mode == Mode::SignIn {
            cmd.ensure_flag(RAW_FLAG);
        }
        cmd
    }

    /// `op signin --account <id> --raw`.
    pub fn signin(account: &str) -> Self {
        Self {
            args: vec![
                SIGNIN_VERB.to_string(),
                ACCOUNT_FLAG.to_string(),
                account.to_string(),
                RAW_FLAG.to_string(),
            ],
            mode: Mode::SignIn,
            stdin: None,
        }
    }

    /// A command attached to the calling terminal.
    pub fn interactive<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: Mode::Interactive,
            ..Self::new(args)
        }
    }

    /// Append arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Pipe a secret on stdin.
    pub fn secret(mut self, secret: Zeroizing<String>) -> Self {
        self.stdin = Some(Stdin::Secret(secret));
        self
    }

    /// Serialize a request document and pipe it on stdin.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::Encode` if serialization fails.
    pub fn payload<T: Serialize>(mut self, value: &T) -> Result<Self> {
        let doc = serde_json::to_vec(value).map_err(DecodeError::Encode)?;
        self.stdin = Some(Stdin::Json(doc));
        Ok(self)
    }

    /// Inject the account selector and, except for signin, the JSON format
    /// flag. Flags already present are left alone.
    pub fn for_account(mut self, user_uuid: &str) -> Self {
        if !self.has_flag_value(ACCOUNT_FLAG) {
            self.args.push(ACCOUNT_FLAG.to_string());
            self.args.push(user_uuid.to_string());
        }
        if self.mode != Mode::SignIn {
            self.ensure_flag(FORMAT_JSON);
        }
        self
    }

    /// Ensure the JSON format flag without selecting an account.
    pub fn json(mut self) -> Self {
        if self.mode != Mode::SignIn {
            self.ensure_flag(FORMAT_JSON);
        }
        self
    }

    fn ensure_flag(&mut self, flag: &str) {
        if !self.args.iter().any(|a| a == flag) {
            self.args.push(flag.to_string());
        }
    }

    fn has_flag_value(&self, flag: &str) -> bool {
        let prefix = format!("{}=", flag);
        self.args.iter().any(|a| a == flag || a.starts_with(&prefix))
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn stdin(&self) -> Option<&Stdin> {
        self.stdin.as_ref()
    }

    pub fn verb(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}
