//! Sign-in and account commands.

use tracing::debug;

use crate::cli::{output, Context};
use crate::core::client::Client;
use crate::error::{AuthError, Result};

/// Sign in with the service account token if one is set, otherwise to the
/// selected account.
///
/// Without a selector the only configured account is used.
///
/// # Errors
///
/// Returns `AuthError::AccountRequired` if several accounts exist and none
/// was selected.
pub fn connect(ctx: &Context) -> Result<Client> {
    let client = ctx.client()?;

    if let Some(token) = &ctx.service_account_token {
        debug!("using service account token from environment");
        client.sign_in_with_service_account(token.as_str())?;
        return Ok(client);
    }

    let account = match ctx.account_selector() {
        Some(selector) => client.resolve_account(selector)?,
        None => {
            let mut accounts = client.list_accounts()?;
            if accounts.len() > 1 {
                return Err(AuthError::AccountRequired(accounts.len()).into());
            }
            accounts.remove(0)
        }
    };

    client.sign_in(account)?;
    Ok(client)
}

pub fn signin(ctx: &Context) -> Result<()> {
    let client = connect(ctx)?;
    if let Some(account) = client.account() {
        if client.is_service_account() {
            output::success(&format!("signed in as service account {}", account.email));
        } else {
            output::success(&format!("signed in as {}", account.email));
            output::kv("url:    ", &account.url);
        }
        output::kv("user id:", &account.user_uuid);
    }
    Ok(())
}

pub fn whoami(ctx: &Context, json: bool) -> Result<()> {
    let client = connect(ctx)?;
    let me = client.whoami()?;

    if json {
        return output::json(&me);
    }
    output::header(&me.name);
    output::kv("email:", &me.email);
    output::kv("id:   ", &me.id);
    Ok(())
}

pub fn accounts(ctx: &Context, json: bool) -> Result<()> {
    let accounts = ctx.client()?.list_accounts()?;

    if json {
        return output::json(&accounts);
    }
    let rows: Vec<Vec<String>> = accounts
        .iter()
        .map(|a| vec![a.url.clone(), a.email.clone(), a.user_uuid.clone()])
        .collect();
    output::table(&["URL", "EMAIL", "USER ID"], &rows);
    Ok(())
}

pub fn rate_limits(ctx: &Context, json: bool) -> Result<()> {
    let client = connect(ctx)?;
    let limits = client.service_account_rate_limits()?;

    if json {
        return output::json(&limits);
    }
    let rows: Vec<Vec<String>> = limits
        .iter()
        .map(|l| {
            vec![
                l.kind.clone(),
                l.action.clone(),
                l.limit.to_string(),
                l.used.to_string(),
                l.remaining.to_string(),
            ]
        })
        .collect();
    output::table(&["TYPE", "ACTION", "LIMIT", "USED", "REMAINING"], &rows);
    Ok(())
}

pub fn version(ctx: &Context) -> Result<()> {
    let client = ctx.client()?;
    output::kv("binary: ", client.binary().display());
    output::kv("version:", client.version()?);
    Ok(())
}
