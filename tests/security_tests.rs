/// Security tests for vulnpair reports
/// Tests CSV formula-injection protection and report file handling

use std::fs;
use std::path::Path;
use vulnpair::reporting::{export_csv, export_markdown, ReportRow};

fn row(scenario: &str, variant: &str, verdict: &str, detail: &str) -> ReportRow {
    ReportRow::new(scenario, variant, verdict, detail)
}

#[test]
fn test_csv_injection_protection() {
    // Scenario outputs are attacker-controlled, so every cell is escaped
    let dir = tempfile::tempdir().unwrap();
    let rows = vec![
        row("injection/xss-html", "unsafe", "VULNERABLE", "=HYPERLINK(\"http://evil.com\")"),
        row("injection/command-concat", "unsafe", "VULNERABLE", "+cmd|'/C calc'!A1"),
        row("injection/file-read", "unsafe", "VULNERABLE", "-2+3+cmd|'/C calc'!A1"),
        row("injection/jsonp-callback", "unsafe", "VULNERABLE", "@SUM(1+1)*cmd|'/C calc'!A1"),
        row("headers/cors", "unsafe", "UNCERTAIN", "\t=1+1"),
    ];

    let csv_path = export_csv(&rows, dir.path()).expect("CSV export should succeed");
    let content = fs::read_to_string(&csv_path).expect("Should be able to read CSV file");

    assert!(content.contains("\"'=HYPERLINK"), "CSV should escape = prefix");
    assert!(content.contains("\"'+cmd"), "CSV should escape + prefix");
    assert!(content.contains("\"'-2+3"), "CSV should escape - prefix");
    assert!(content.contains("\"'@SUM"), "CSV should escape @ prefix");
    assert!(content.contains("\"'\t=1+1"), "CSV should escape tab prefix");

    assert!(content.starts_with("Scenario,Variant,Verdict,Detail\n"), "CSV header should be intact");
}

#[test]
fn test_csv_normal_content_not_escaped() {
    let dir = tempfile::tempdir().unwrap();
    let rows = vec![
        row("idor/user-profile", "safe", "SECURE", "ERROR: session is not authenticated"),
        row("crypto/pbkdf2-low-iteration", "unsafe", "VULNERABLE", "weak"),
    ];

    let csv_path = export_csv(&rows, dir.path()).expect("CSV export should succeed");
    let content = fs::read_to_string(&csv_path).unwrap();

    assert!(
        content.contains("idor/user-profile,safe,SECURE,ERROR: session is not authenticated"),
        "Normal content should not be unnecessarily escaped"
    );
}

#[test]
fn test_csv_comma_quote_and_newline_escaping() {
    let dir = tempfile::tempdir().unwrap();
    let rows = vec![row(
        "headers/security-headers",
        "safe",
        "UNCERTAIN",
        "{\"X-Frame-Options\":\"DENY\",\"Cache-Control\":\"no-store\"}",
    )];

    let csv_path = export_csv(&rows, dir.path()).unwrap();
    let content = fs::read_to_string(&csv_path).unwrap();

    assert!(
        content.contains("\"{\"\"X-Frame-Options\"\":\"\"DENY\"\",\"\"Cache-Control\"\":\"\"no-store\"\"}\""),
        "Quotes should be doubled inside a quoted field"
    );

    let multiline = vec![row("x", "unsafe", "VULNERABLE", "line one\nline two")];
    let content = fs::read_to_string(export_csv(&multiline, dir.path()).unwrap()).unwrap();
    assert!(content.contains("\"line one\nline two\""));
}

#[test]
fn test_csv_empty_fields() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = export_csv(&[row("", "", "", "")], dir.path()).unwrap();
    let content = fs::read_to_string(&csv_path).unwrap();

    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2, "Should have header and one data row");
    assert_eq!(lines[1], ",,,", "Empty fields should result in commas only");
}

#[test]
fn test_report_filenames_have_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let rows = vec![row("ssrf/fetch-remote", "safe", "SECURE", "")];

    let first = export_csv(&rows, dir.path()).unwrap();
    // Small delay to ensure a different millisecond timestamp
    std::thread::sleep(std::time::Duration::from_millis(20));
    let second = export_csv(&rows, dir.path()).unwrap();

    assert_ne!(first, second, "Subsequent exports should have different filenames");
    assert!(Path::new(&first).exists());
    assert!(Path::new(&second).exists());
}

#[test]
fn test_markdown_cells_cannot_break_the_table() {
    let dir = tempfile::tempdir().unwrap();
    let rows = vec![
        row("injection/xss-html", "unsafe", "VULNERABLE", "a | b\n# heading"),
        row("injection/xss-html", "safe", "SECURE", "<div>Welcome, &lt;b&gt;!</div>"),
    ];

    let md_path = export_markdown(&rows, dir.path()).unwrap();
    let content = fs::read_to_string(&md_path).unwrap();

    assert!(content.contains("a \\| b # heading"));
    assert!(!content.lines().any(|l| l.starts_with("# heading")));
    // header + separator + two rows
    assert_eq!(content.lines().filter(|l| l.starts_with('|')).count(), 4);
}
