//! CSV rendering of contributor rows.

use crate::models::OrgReport;

const HEADER: [&str; 4] = ["username", "commits", "additions", "deletions"];

/// Render contributors as CSV, header row first, in report order.
pub fn render_csv(report: &OrgReport) -> String {
    let mut output = String::new();
    output.push_str(&HEADER.join(","));
    output.push('\n');

    for c in &report.contributors {
        output.push_str(&format!(
            "{},{},{},{}\n",
            escape_field(&c.username),
            c.commits,
            c.additions,
            c.deletions
        ));
    }

    output
}

/// Quote a field when it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::make_report;

    #[test]
    fn test_render_csv() {
        let report = make_report();
        let csv = render_csv(&report);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "username,commits,additions,deletions");
        assert_eq!(lines[1], "alice,7,70,30");
        assert_eq!(lines[2], "bob,3,30,20");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_render_csv_empty() {
        let mut report = make_report();
        report.contributors.clear();
        assert_eq!(render_csv(&report), "username,commits,additions,deletions\n");
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("alice"), "alice");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
