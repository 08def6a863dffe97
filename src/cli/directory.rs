//! User and group listing.

use crate::cli::{output, session, Context};
use crate::core::domain::UserState;
use crate::error::Result;

pub fn list_users(ctx: &Context, json: bool) -> Result<()> {
    let client = session::connect(ctx)?;
    let users = client.list_users()?;

    if json {
        return output::json(&users);
    }
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            let state = match &u.state {
                Some(UserState::Active) => "active".to_string(),
                Some(UserState::Suspended) => "suspended".to_string(),
                Some(UserState::TransferStarted) => "transfer started".to_string(),
                Some(UserState::TransferSuspended) => "transfer suspended".to_string(),
                Some(UserState::Other(s)) => s.to_lowercase(),
                None => String::new(),
            };
            vec![u.id.clone(), u.name.clone(), u.email.clone(), state]
        })
        .collect();
    output::table(&["ID", "NAME", "EMAIL", "STATE"], &rows);
    Ok(())
}

pub fn list_groups(ctx: &Context, json: bool) -> Result<()> {
    let client = session::connect(ctx)?;
    let groups = client.list_groups()?;

    if json {
        return output::json(&groups);
    }
    let rows: Vec<Vec<String>> = groups
        .iter()
        .map(|g| vec![g.id.clone(), g.name.clone(), g.description.clone()])
        .collect();
    output::table(&["ID", "NAME", "DESCRIPTION"], &rows);
    Ok(())
}
