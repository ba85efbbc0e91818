//! CLI integration tests for the graphgate command-line interface.
//!
//! These tests do not need an MCP server or a model endpoint; they cover
//! argument parsing, help output and the offline `config` command.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the graphgate binary with an isolated config dir.
fn graphgate(config_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("graphgate").unwrap();
    cmd.env("GRAPHGATE_CONFIG_DIR", config_dir.path())
        .env_remove("GRAPHGATE_MCP_URL")
        .env_remove("GRAPHGATE_PORT")
        .env_remove("GRAPHGATE_MODEL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let dir = TempDir::new().unwrap();
    graphgate(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("tools"))
        .stdout(predicate::str::contains("call"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_version_displays() {
    let dir = TempDir::new().unwrap();
    graphgate(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("graphgate"));
}

#[test]
fn test_config_prints_defaults() {
    let dir = TempDir::new().unwrap();
    graphgate(&dir)
        .current_dir(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("read_neo4j_cypher"))
        .stdout(predicate::str::contains("http://localhost:8005/mcp"));
}

#[test]
fn test_config_reads_user_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[server]\nport = 9321\n").unwrap();

    graphgate(&dir)
        .current_dir(dir.path())
        .args(["config", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("9321"));
}

#[test]
fn test_config_warning_reaches_log_file() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), "[llm]\napi_key = \"sk-test\"\n").unwrap();

    graphgate(&dir)
        .current_dir(dir.path())
        .arg("config")
        .assert()
        .success()
        .stderr(predicate::str::contains("plaintext"));

    let logged = std::fs::read_dir(dir.path().join("logs"))
        .unwrap()
        .filter_map(|entry| std::fs::read_to_string(entry.ok()?.path()).ok())
        .collect::<String>();
    assert!(logged.contains("plaintext"));
    assert!(logged.contains("\"level\":\"WARN\""));
}

#[test]
fn test_config_explicit_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    graphgate(&dir)
        .args(["config", "--config"])
        .arg(dir.path().join("missing.toml"))
        .assert()
        .failure();
}

#[test]
fn test_call_rejects_invalid_json_args() {
    let dir = TempDir::new().unwrap();
    graphgate(&dir)
        .args(["call", "read_neo4j_cypher", "--args", "{not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--args must be valid JSON"));
}

#[test]
fn test_start_fails_fast_without_mcp_server() {
    let dir = TempDir::new().unwrap();
    graphgate(&dir)
        .current_dir(dir.path())
        .args([
            "start",
            "--mcp-url",
            "http://127.0.0.1:1/mcp",
            "--base-url",
            "http://127.0.0.1:1/v1",
            "--port",
            "0",
        ])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to connect to MCP server"));
}
