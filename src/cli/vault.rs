//! Vault and item listing.

use crate::cli::{output, session, Context};
use crate::error::Result;

pub fn list_vaults(ctx: &Context, json: bool) -> Result<()> {
    let client = session::connect(ctx)?;
    let vaults = client.list_vaults()?;

    if json {
        return output::json(&vaults);
    }
    if vaults.is_empty() {
        output::dimmed("no vaults found");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = vaults
        .iter()
        .map(|v| vec![v.id.clone(), v.name.clone(), v.items.to_string()])
        .collect();
    output::table(&["ID", "NAME", "ITEMS"], &rows);
    Ok(())
}

pub fn list_items(ctx: &Context, vault: Option<&str>, json: bool) -> Result<()> {
    let client = session::connect(ctx)?;
    let items = client.list_items(vault)?;

    if json {
        return output::json(&items);
    }
    if items.is_empty() {
        output::dimmed("no items found");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = items
        .iter()
        .map(|i| {
            vec![
                i.id.clone(),
                i.title.clone(),
                i.category.to_string(),
                i.vault.name.clone(),
            ]
        })
        .collect();
    output::table(&["ID", "TITLE", "CATEGORY", "VAULT"], &rows);
    Ok(())
}
