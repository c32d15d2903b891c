use std::fs;
use vulnpair::reporting::{export_csv, export_markdown, ReportRow};

#[test]
fn reporting_exports_create_files() {
    let dir = tempfile::tempdir().unwrap();
    let rows = vec![ReportRow::new("idor/user-profile", "unsafe", "VULNERABLE", "{\"userId\":1}")];

    // Both exports return timestamped paths inside the target directory
    let csv_path = export_csv(&rows, dir.path()).expect("CSV export should succeed");
    let md_path = export_markdown(&rows, dir.path()).expect("Markdown export should succeed");

    assert!(csv_path.exists(), "CSV file should exist: {}", csv_path.display());
    assert!(md_path.exists(), "Markdown file should exist: {}", md_path.display());
    assert_eq!(csv_path.parent(), Some(dir.path()));

    let csv_name = csv_path.file_name().unwrap().to_string_lossy().to_string();
    let md_name = md_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(csv_name.starts_with("vulnpair_report_"));
    assert!(csv_name.ends_with(".csv"));
    assert!(md_name.starts_with("vulnpair_report_"));
    assert!(md_name.ends_with(".md"));

    let markdown = fs::read_to_string(&md_path).unwrap();
    assert!(markdown.starts_with("# vulnpair Report\n"));
    assert!(markdown.contains("| idor/user-profile | unsafe | **VULNERABLE** |"));
}

#[test]
fn reporting_to_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope");
    let rows = vec![ReportRow::new("a", "safe", "SECURE", "")];
    assert!(matches!(export_csv(&rows, &missing), Err(vulnpair::Error::Io(_))));
}
