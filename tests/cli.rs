//! 命令行冒烟测试

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("pagetrans-{}-{}", std::process::id(), name))
}

#[test]
fn test_help_lists_options() {
    let output = Command::cargo_bin("pagetrans")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--lang"));
    assert!(stdout.contains("--api-url"));
    assert!(stdout.contains("--output"));
}

#[test]
fn test_env_docs() {
    let output = Command::cargo_bin("pagetrans")
        .unwrap()
        .arg("--env-docs")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("PAGETRANS_LOG_LEVEL"));
}

#[test]
fn test_missing_input_fails() {
    Command::cargo_bin("pagetrans").unwrap().assert().failure();

    let output = Command::cargo_bin("pagetrans")
        .unwrap()
        .arg(temp_path("does-not-exist.html"))
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error"));
}

#[test]
fn test_example_config_written() {
    let path = temp_path("example.toml");
    Command::cargo_bin("pagetrans")
        .unwrap()
        .arg("--example-config")
        .arg(&path)
        .assert()
        .success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("max_block_len = 600"));
    assert!(content.contains("source_lang = \"en\""));
    fs::remove_file(&path).ok();
}

#[test]
fn test_unreachable_service_keeps_document() {
    let input = temp_path("input.html");
    let output = temp_path("output.html");
    fs::write(&input, "<html><body><p>Hello world</p></body></html>").unwrap();

    Command::cargo_bin("pagetrans")
        .unwrap()
        .env("PAGETRANS_LOG_LEVEL", "error")
        .arg(&input)
        .args(["--lang", "en-fr", "--api-url", "http://127.0.0.1:9"])
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("<p>Hello world</p>"));

    fs::remove_file(&input).ok();
    fs::remove_file(&output).ok();
}
