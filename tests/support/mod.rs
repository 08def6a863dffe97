//! Test support: a scripted stand-in for the `op` binary.
//!
//! Each [`FakeOp`] lives in its own temp directory. The script logs every
//! invocation's arguments to `argv.log` (one line per call) and its `OP_*`
//! environment to `env.log` under a `## <args>` header, then runs the
//! test's `case` body. Bodies can write stdin to `$DIR/stdin.log` to
//! assert what was piped in.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::TempDir;

use opcli::{Client, StaticPrompt};

pub const ACCOUNTS_JSON: &str = r#"[
  {"url":"my.1password.com","email":"ada@example.com","user_uuid":"U1","account_uuid":"A1"},
  {"url":"team.1password.com","email":"bob@example.com","user_uuid":"U2","account_uuid":"A2"}
]"#;

pub const VAULTS_JSON: &str = r#"[
  {"id":"abcdefghijklmnopqrstuvwxyz","name":"Private","items":3,"type":"PERSONAL"},
  {"id":"bcdefghijklmnopqrstuvwxyza","name":"Shared","items":12,"type":"USER_CREATED"},
  {"id":"cdefghijklmnopqrstuvwxyzab","name":"Infra","items":0,"type":"USER_CREATED"}
]"#;

pub const ITEM_JSON: &str = r#"{
  "id":"item1","title":"GitHub","category":"LOGIN",
  "vault":{"id":"abcdefghijklmnopqrstuvwxyz","name":"Private"},
  "urls":[{"primary":true,"href":"https://github.com"}],
  "fields":[
    {"id":"username","type":"STRING","purpose":"USERNAME","label":"username","value":"ada"},
    {"id":"password","type":"CONCEALED","purpose":"PASSWORD","label":"password","value":"pw"}
  ]
}"#;

pub const ME_JSON: &str =
    r#"{"id":"SA1","name":"CI bot","email":"ci@example.com","type":"SERVICE_ACCOUNT","state":"ACTIVE"}"#;

pub struct FakeOp {
    pub dir: TempDir,
}

impl FakeOp {
    /// Install a fake `op` whose behavior is the given `case "$*" in ... esac`
    /// arms. Unmatched invocations fail with `unexpected call`.
    pub fn new(arms: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let script = format!(
            r#"#!/bin/sh
DIR="{dir}"
printf '%s\n' "$*" >> "$DIR/argv.log"
printf '## %s\n' "$*" >> "$DIR/env.log"
env | grep '^OP_' >> "$DIR/env.log"
case "$*" in
{arms}
*)
  echo "[ERROR] unexpected call: $*" >&2
  exit 1
  ;;
esac
"#,
            dir = dir.path().display(),
            arms = arms
        );

        let path = dir.path().join("op");
        fs::write(&path, script).expect("failed to write fake op");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("failed to make fake op executable");

        Self { dir }
    }

    pub fn binary(&self) -> PathBuf {
        self.dir.path().join("op")
    }

    /// Client using this fake with a fixed fallback password.
    pub fn client(&self) -> Client {
        Client::builder()
            .binary(self.binary())
            .prompt(StaticPrompt::new("hunter2"))
            .build()
            .expect("failed to build client")
    }

    /// Arguments of every invocation so far.
    pub fn calls(&self) -> Vec<String> {
        self.read("argv.log").lines().map(str::to_string).collect()
    }

    /// `OP_*` variables seen by child processes.
    pub fn env(&self) -> String {
        self.read("env.log")
    }

    /// `OP_*` variables seen by each invocation whose arguments start with
    /// `prefix`, in call order.
    pub fn env_of(&self, prefix: &str) -> Vec<String> {
        let log = self.read("env.log");
        let mut blocks = Vec::new();
        let mut current: Option<String> = None;
        for line in log.lines() {
            if let Some(args) = line.strip_prefix("## ") {
                blocks.extend(current.take());
                if args.starts_with(prefix) {
                    current = Some(String::new());
                }
            } else if let Some(block) = current.as_mut() {
                block.push_str(line);
                block.push('\n');
            }
        }
        blocks.extend(current);
        blocks
    }

    pub fn stdin(&self) -> String {
        self.read("stdin.log")
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.dir.path().join(name)).unwrap_or_default()
    }
}

/// Case arm printing `body` to stdout for invocations matching `pattern`.
pub fn respond(pattern: &str, body: &str) -> String {
    format!("{pattern})\n  cat <<'JSON'\n{body}\nJSON\n  ;;\n")
}

/// Case arm failing with `stderr` for invocations matching `pattern`.
pub fn fail(pattern: &str, stderr: &str) -> String {
    format!("{pattern})\n  echo '{stderr}' >&2\n  exit 1\n  ;;\n")
}
