use std::path::Path;
use std::process::{Command, Output};

fn run_cli(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sor_report"))
        .current_dir(dir)
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("spawn sor_report")
}

#[test]
fn missing_input_fails_without_outputs() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = run_cli(dir.path(), &["--input", "brak.csv"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("Error: "), "stderr was: {stderr}");
    assert!(stderr.contains("brak.csv"), "stderr was: {stderr}");
    assert!(stderr.contains("does not exist"), "stderr was: {stderr}");

    for name in [
        "boxplot_wait_times.png",
        "avg_wait_times.png",
        "raport_sor_symulacja.pdf",
    ] {
        assert!(!dir.path().join(name).exists(), "{name} should not exist");
    }
}

#[test]
fn report_subcommand_reports_missing_input() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = run_cli(dir.path(), &["report"]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("statystyki.csv"), "stderr was: {stderr}");
}

#[test]
fn simulate_writes_a_dataset() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = run_cli(
        dir.path(),
        &["simulate", "--seed", "5", "--output", "dane.csv"],
    );

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr was: {stderr}");
    let contents = std::fs::read_to_string(dir.path().join("dane.csv")).expect("dataset");
    let mut lines = contents.lines();
    assert_eq!(lines.next(), Some("Priority,WaitTime"));
    assert!(lines.all(|line| {
        let mut fields = line.split(',');
        let priority = fields.next();
        let wait = fields.next().map(str::parse::<u32>);
        matches!(priority, Some("High" | "Medium" | "Low")) && matches!(wait, Some(Ok(_)))
    }));
}

#[test]
fn report_writes_charts_and_pdf() {
    if !sor_report::fonts::default_fonts_available() {
        eprintln!("Skipping report_writes_charts_and_pdf: no font family available");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("dane.csv"),
        "Priority,WaitTime\nHigh,5\nHigh,7\nMedium,10\nLow,2\n",
    )
    .expect("write dataset");

    let output = run_cli(dir.path(), &["report", "--input", "dane.csv"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(output.status.success(), "stderr was: {stderr}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Generated "), "stdout was: {stdout}");
    assert!(stdout.contains("from 4 records"), "stdout was: {stdout}");
    for name in [
        "boxplot_wait_times.png",
        "avg_wait_times.png",
        "raport_sor_symulacja.pdf",
    ] {
        assert!(dir.path().join(name).is_file(), "{name} should exist");
    }
    let pdf = std::fs::read(dir.path().join("raport_sor_symulacja.pdf")).expect("read report");
    assert!(pdf.starts_with(b"%PDF"));
}

#[test]
fn invalid_delimiter_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");

    let output = run_cli(dir.path(), &["--delimiter", ";;"]);

    assert!(!output.status.success());
    assert!(!dir.path().join("raport_sor_symulacja.pdf").exists());
}
