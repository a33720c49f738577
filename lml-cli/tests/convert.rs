use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn convert_lml_to_markdown() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("doc.lml");
    fs::write(&input_path, "# Intro\n\nHello **bold** world.\n").unwrap();

    let mut cmd = cargo_bin_cmd!("lml");
    cmd.arg("convert")
        .arg(input_path.as_os_str())
        .arg("--to")
        .arg("markdown");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("# Intro"))
        .stdout(predicate::str::contains("**bold**"));
}

#[test]
fn convert_is_the_default_subcommand() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("doc.lml");
    fs::write(&input_path, "# Intro\n\nHello.\n").unwrap();

    let mut cmd = cargo_bin_cmd!("lml");
    cmd.arg(input_path.as_os_str()).arg("--to").arg("markdown");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("# Intro"));
}

#[test]
fn convert_imports_latex() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("paper.tex");
    fs::write(
        &input_path,
        "\\documentclass{article}\n\\title{A Paper}\n\\begin{document}\n\\section{Intro}\nHello there.\n\\end{document}\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("lml");
    cmd.arg("convert")
        .arg(input_path.as_os_str())
        .arg("--to")
        .arg("lml");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("title: A Paper"))
        .stdout(predicate::str::contains("# Intro"))
        .stdout(predicate::str::contains("Hello there."));
}

#[test]
fn convert_detects_target_from_output_extension() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("doc.lml");
    let output_path = dir.path().join("doc.md");
    fs::write(&input_path, "# Intro\n\nHello.\n").unwrap();

    let mut cmd = cargo_bin_cmd!("lml");
    cmd.arg("convert")
        .arg(input_path.as_os_str())
        .arg("-o")
        .arg(output_path.as_os_str());

    cmd.assert().success();

    let rendered = fs::read_to_string(&output_path).unwrap();
    assert!(rendered.contains("# Intro"));
}

#[test]
fn convert_rejects_unknown_target_format() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("doc.lml");
    fs::write(&input_path, "Hello.\n").unwrap();

    let mut cmd = cargo_bin_cmd!("lml");
    cmd.arg("convert")
        .arg(input_path.as_os_str())
        .arg("--to")
        .arg("pdf");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Format 'pdf' not found"));
}

#[test]
fn convert_rejects_export_only_source() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("doc.html");
    fs::write(&input_path, "<p>Hello</p>\n").unwrap();

    let mut cmd = cargo_bin_cmd!("lml");
    cmd.arg("convert")
        .arg(input_path.as_os_str())
        .arg("--to")
        .arg("lml");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("not supported"));
}

#[test]
fn convert_reports_missing_input_file() {
    let mut cmd = cargo_bin_cmd!("lml");
    cmd.arg("convert")
        .arg("does-not-exist.lml")
        .arg("--to")
        .arg("markdown");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error reading file"));
}
