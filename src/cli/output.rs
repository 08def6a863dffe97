//! Shared CLI output helpers.
//!
//! Color scheme (respects NO_COLOR through `console`):
//! - Green: success
//! - Red: errors
//! - Cyan: hints
//! - Bold: headers
//! - Dimmed: secondary info

use console::style;
use std::fmt::Display;

/// Print a success message with checkmark (green).
///
/// Example: `✓ signed in as ada@example.com`
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green(), msg);
}

/// Print an error message to stderr (red).
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red(), msg);
}

/// Print a hint message to stderr (cyan).
///
/// Example: `→ run: opcli signin --account ada@example.com`
pub fn hint(msg: &str) {
    eprintln!("{} {}", style("→").cyan(), style(msg).cyan());
}

/// Print a bold header.
pub fn header(title: &str) {
    println!("{}", style(title).bold());
}

/// Print a key-value pair (label dimmed, value bold).
pub fn kv(label: &str, value: impl Display) {
    println!("  {}  {}", style(label).dim(), style(value).bold());
}

/// Print a dimmed/secondary message.
pub fn dimmed(msg: &str) {
    println!("{}", style(msg).dim());
}

/// Print raw data to stdout, uncolored, for piping.
pub fn data(msg: &str) {
    println!("{}", msg);
}

/// Print a value as pretty JSON.
pub fn json<T: serde::Serialize>(value: &T) -> crate::error::Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(crate::error::DecodeError::Encode)?;
    data(&text);
    Ok(())
}

/// Print rows as left-aligned columns under a header line.
pub fn table(headers: &[&str], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{:<width$}", c, width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    println!("{}", style(line(headers.to_vec())).bold());
    for row in rows {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}
