//! Permission resolution command. Runs no `op` process.

use crate::cli::output;
use crate::core::domain::permission::{self, Permission};
use crate::error::Result;

/// Print the permissions granted together with `name`, one per line.
pub fn execute(name: &str) -> Result<()> {
    let permission: Permission = name.parse()?;
    for p in permission::resolve(permission) {
        output::data(p.as_str());
    }
    Ok(())
}
