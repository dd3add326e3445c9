//! JSON rendering: a complete structural dump of the report.

use crate::models::OrgReport;
use anyhow::Result;

/// Render the whole report as pretty-printed JSON.
pub fn render_json(report: &OrgReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
