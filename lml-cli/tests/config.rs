use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn canonical_output_respects_blank_lines_from_config() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("doc.lml");
    fs::write(&input_path, "# One\n\nFirst.\n\nSecond.\n").unwrap();

    let config_path = dir.path().join("lml.toml");
    fs::write(
        &config_path,
        r#"[serialize]
blank_lines_between = 2
"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("lml");
    cmd.arg("convert")
        .arg(input_path.as_os_str())
        .arg("--to")
        .arg("lml")
        .arg("--config")
        .arg(config_path.as_os_str());

    let output = cmd.assert().success().get_output().stdout.clone();
    let stdout = String::from_utf8(output).unwrap();
    assert!(stdout.contains("First.\n\n\nSecond.\n"));
}

#[test]
fn strict_import_from_config_fails_on_unknown_environments() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("paper.tex");
    fs::write(
        &input_path,
        "\\documentclass{article}\n\\begin{document}\n\\begin{tikzpicture}\nx\n\\end{tikzpicture}\n\\end{document}\n",
    )
    .unwrap();

    let config_path = dir.path().join("lml.toml");
    fs::write(
        &config_path,
        r#"[import]
strict_mode = true
"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("lml");
    cmd.arg("convert")
        .arg(input_path.as_os_str())
        .arg("--to")
        .arg("lml")
        .arg("--config")
        .arg(config_path.as_os_str());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("tikzpicture"));
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("doc.lml");
    fs::write(&input_path, "Hello.\n").unwrap();

    let mut cmd = cargo_bin_cmd!("lml");
    cmd.arg("validate")
        .arg(input_path.as_os_str())
        .arg("--config")
        .arg(dir.path().join("absent.toml").as_os_str());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}
