//! opcli - A typed client for the 1Password CLI.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use opcli::cli::output;
use opcli::cli::{execute, Cli, Context};
use opcli::core::constants::LOG_ENV;
use opcli::error::{AuthError, Error};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("opcli=debug")
        } else {
            EnvFilter::new("opcli=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let result = Context::load(cli.account, cli.service_account_token)
        .and_then(|ctx| execute(cli.command, &ctx));

    if let Err(e) = result {
        let suggestion = match &e {
            Error::NotFound => Some("install the 1Password CLI or set `binary` in opcli.toml"),
            Error::Auth(AuthError::AccountRequired(_)) => Some("run: opcli accounts"),
            Error::Auth(AuthError::NoAccounts) => Some("run: op account add"),
            Error::Auth(AuthError::NotServiceAccount) => {
                Some("set OP_SERVICE_ACCOUNT_TOKEN to use a service account")
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(hint);
        }
        std::process::exit(1);
    }
}
