//! Report rendering.
//!
//! Turns an [`OrgReport`] into terminal tables, JSON or CSV, and writes
//! the result to stdout or a file.

pub mod csv;
pub mod json;
pub mod table;

pub use self::csv::render_csv;
pub use self::json::render_json;
pub use self::table::render_table;

use crate::cli::OutputFormat;
use crate::models::{OrgReport, SortKey};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Render a report in the requested format.
pub fn render(
    report: &OrgReport,
    format: OutputFormat,
    top_n: usize,
    sort_by: SortKey,
) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(report, top_n, sort_by)),
        OutputFormat::Json => render_json(report),
        OutputFormat::Csv => Ok(render_csv(report)),
    }
}

/// Write rendered content to a file, or to stdout when no path is given.
pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("Saved to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(content.as_bytes())
                .context("Failed to write report to stdout")?;
            if !content.ends_with('\n') {
                writeln!(stdout).context("Failed to write report to stdout")?;
            }
        }
    }
    Ok(())
}

/// Format an integer with thousands separators.
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out
}
