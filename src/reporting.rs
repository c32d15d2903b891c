// Reporting and output for vulnpair
// CSV and Markdown export of scenario results

use crate::error::Result;
use chrono::Local;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One line of a report: a scenario run under one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub scenario: String,
    pub variant: String,
    pub verdict: String,
    pub detail: String,
}

impl ReportRow {
    pub fn new(
        scenario: impl Into<String>,
        variant: impl Into<String>,
        verdict: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            scenario: scenario.into(),
            variant: variant.into(),
            verdict: verdict.into(),
            detail: detail.into(),
        }
    }
}

/// Escape CSV field to prevent formula injection attacks
/// Cells starting with =, +, -, @, or tab are prefixed with single quote
fn escape_csv_field(field: &str) -> String {
    let Some(first_char) = field.chars().next() else {
        return String::new();
    };
    let needs_escaping = matches!(first_char, '=' | '+' | '-' | '@' | '\t');

    if needs_escaping {
        format!("\"'{}\"", field.replace('"', "\"\""))
    } else if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Markdown table cells cannot hold pipes or line breaks
fn escape_markdown_cell(field: &str) -> String {
    field.replace('|', "\\|").replace(['\r', '\n'], " ")
}

fn report_path(dir: &Path, extension: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S_%3f");
    dir.join(format!("vulnpair_report_{}.{}", timestamp, extension))
}

pub fn export_csv(rows: &[ReportRow], dir: &Path) -> Result<PathBuf> {
    let path = report_path(dir, "csv");
    let mut file = File::create(&path)?;

    writeln!(file, "Scenario,Variant,Verdict,Detail")?;
    for row in rows {
        writeln!(
            file,
            "{},{},{},{}",
            escape_csv_field(&row.scenario),
            escape_csv_field(&row.variant),
            escape_csv_field(&row.verdict),
            escape_csv_field(&row.detail)
        )?;
    }

    debug!(path = %path.display(), rows = rows.len(), "wrote CSV report");
    Ok(path)
}

pub fn export_markdown(rows: &[ReportRow], dir: &Path) -> Result<PathBuf> {
    let path = report_path(dir, "md");
    let mut file = File::create(&path)?;

    writeln!(file, "# vulnpair Report\n")?;
    writeln!(file, "| Scenario | Variant | Verdict | Detail |")?;
    writeln!(file, "|---|---|---|---|")?;
    for row in rows {
        writeln!(
            file,
            "| {} | {} | **{}** | {} |",
            escape_markdown_cell(&row.scenario),
            escape_markdown_cell(&row.variant),
            escape_markdown_cell(&row.verdict),
            escape_markdown_cell(&row.detail)
        )?;
    }

    debug!(path = %path.display(), rows = rows.len(), "wrote Markdown report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_prefix_is_quoted() {
        assert_eq!(escape_csv_field("=1+1"), "\"'=1+1\"");
        assert_eq!(escape_csv_field("-cmd"), "\"'-cmd\"");
        assert_eq!(escape_csv_field("@SUM(A1)"), "\"'@SUM(A1)\"");
    }

    #[test]
    fn plain_and_quoted_fields() {
        assert_eq!(escape_csv_field(""), "");
        assert_eq!(escape_csv_field("idor/user-profile"), "idor/user-profile");
        assert_eq!(escape_csv_field("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn markdown_cells_stay_on_one_line() {
        assert_eq!(escape_markdown_cell("a|b\nc"), "a\\|b c");
    }
}
