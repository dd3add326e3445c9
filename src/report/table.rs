//! Terminal table rendering.
//!
//! Builds the human-readable report: a banner, a summary block, and tables
//! for repositories, languages and top contributors.

use super::format_number;
use crate::models::{OrgReport, SortKey};
use tabled::builder::Builder;
use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::Table;

/// Languages shown in the distribution table.
const MAX_LANGUAGES: usize = 15;

/// Cells in a language bar.
const BAR_WIDTH: usize = 20;

/// Marker appended to the sorted column's header.
const SORT_MARKER: &str = "▼";

/// Render the full terminal report.
pub fn render_table(report: &OrgReport, top_n: usize, sort_by: SortKey) -> String {
    let mut output = String::new();

    output.push_str(&banner(report));
    output.push_str("\n\n");

    if report.is_partial() {
        output.push_str(&format!(
            "Warning: Failed to collect stats for {} repo(s): {}\n\n",
            report.failed_repos.len(),
            report.failed_repos.join(", ")
        ));
    }

    output.push_str("Summary\n");
    output.push_str(&summary_table(report));
    output.push_str("\n\n");

    if report.repos.len() > 1 {
        output.push_str("Repository Summary\n");
        output.push_str(&repo_table(report));
        output.push_str("\n\n");
    }

    if !report.languages.is_empty() {
        output.push_str("Language Distribution\n");
        output.push_str(&language_table(report));
        output.push_str("\n\n");
    }

    if !report.contributors.is_empty() {
        output.push_str(&format!("Top Contributors (top {})\n", top_n));
        output.push_str(&contributor_table(report, top_n, sort_by));
        output.push('\n');
    }

    output
}

fn banner(report: &OrgReport) -> String {
    let mut title = format!("vibe-stats: {}", report.org);
    if report.period_start.is_some() || report.period_end.is_some() {
        title.push_str(&format!(
            "\nPeriod: {} ~ {}",
            report.period_start.as_deref().unwrap_or("..."),
            report.period_end.as_deref().unwrap_or("...")
        ));
    }

    let mut builder = Builder::default();
    builder.push_record([title]);
    let mut table = builder.build();
    table.with(Style::rounded()).with(Alignment::center());
    table.to_string()
}

fn summary_table(report: &OrgReport) -> String {
    let rows = [
        ("Repositories", report.total_repos as u64),
        ("Total Commits", report.total_commits),
        ("Additions", report.total_additions),
        ("Deletions", report.total_deletions),
        ("Open PRs", report.total_open_prs),
        ("Merged PRs", report.total_merged_prs),
        ("Open Issues", report.total_open_issues),
    ];

    let mut builder = Builder::default();
    for (label, value) in rows {
        builder.push_record([label.to_string(), format_number(value)]);
    }

    let mut table = builder.build();
    table
        .with(Style::blank())
        .with(Modify::new(Columns::new(1..)).with(Alignment::right()));
    table.to_string()
}

fn repo_table(report: &OrgReport) -> String {
    let mut repos: Vec<_> = report.repos.iter().collect();
    repos.sort_by(|a, b| b.total_commits.cmp(&a.total_commits));

    let mut builder = Builder::default();
    builder.push_record([
        "Repo",
        "Commits",
        "Additions",
        "Deletions",
        "Top Language",
        "Contributors",
    ]);
    for repo in repos {
        builder.push_record([
            repo.name.clone(),
            format_number(repo.total_commits),
            format_number(repo.total_additions),
            format_number(repo.total_deletions),
            repo.languages
                .first()
                .map(|l| l.language.clone())
                .unwrap_or_else(|| "-".to_string()),
            repo.contributors.len().to_string(),
        ]);
    }

    finish(builder, &[1, 2, 3, 5])
}

fn language_table(report: &OrgReport) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Language", "Bar", "Percentage", "Bytes"]);
    for lang in report.languages.iter().take(MAX_LANGUAGES) {
        builder.push_record([
            lang.language.clone(),
            make_bar(lang.percentage, BAR_WIDTH),
            format!("{:.1}%", lang.percentage),
            format_number(lang.bytes),
        ]);
    }

    finish(builder, &[2, 3])
}

fn contributor_table(report: &OrgReport, top_n: usize, sort_by: SortKey) -> String {
    let with_lines = sort_by == SortKey::Lines;

    let mut header = vec!["#".to_string(), "Username".to_string()];
    for key in [SortKey::Commits, SortKey::Additions, SortKey::Deletions] {
        header.push(column_label(key, sort_by));
    }
    if with_lines {
        header.push(column_label(SortKey::Lines, sort_by));
    }

    let mut builder = Builder::default();
    builder.push_record(header);
    for (i, c) in report.contributors.iter().take(top_n).enumerate() {
        let mut row = vec![
            (i + 1).to_string(),
            c.username.clone(),
            format_number(c.commits),
            format_number(c.additions),
            format_number(c.deletions),
        ];
        if with_lines {
            row.push(format_number(c.lines()));
        }
        builder.push_record(row);
    }

    let numeric: Vec<usize> = if with_lines {
        vec![0, 2, 3, 4, 5]
    } else {
        vec![0, 2, 3, 4]
    };
    finish(builder, &numeric)
}

/// Header label for a sortable column.
fn column_label(column: SortKey, sort_by: SortKey) -> String {
    if column == sort_by {
        format!("{} {}", column, SORT_MARKER)
    } else {
        column.to_string()
    }
}

/// Apply the shared style and right-align the numeric columns.
fn finish(builder: Builder, numeric_columns: &[usize]) -> String {
    let mut table: Table = builder.build();
    table.with(Style::rounded());
    for &col in numeric_columns {
        table.with(Modify::new(Columns::single(col)).with(Alignment::right()));
    }
    table.to_string()
}

/// Horizontal bar of `width` cells for a percentage.
fn make_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage / 100.0 * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}
