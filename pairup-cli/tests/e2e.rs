//! End-to-end tests for the pairup binary
//!
//! Gated behind the `integration` feature flag. Run with:
//!
//! ```sh
//! cargo test -p pairup-cli --features integration
//! ```

#![cfg(feature = "integration")]

use std::process::Command;

fn pairup() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pairup"))
}

#[test]
fn pairup_help_lists_commands() {
    let output = pairup()
        .arg("--help")
        .output()
        .expect("Failed to run pairup --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("config"));
}

#[test]
fn pairup_serve_help_shows_overrides() {
    let output = pairup()
        .args(["serve", "--help"])
        .output()
        .expect("Failed to run pairup serve --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--host"));
    assert!(stdout.contains("--port"));
    assert!(stdout.contains("--grace-secs"));
}

#[test]
fn config_show_reads_project_config_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        "[matchmaking]\ngrace_period_secs = 42\n",
    )
    .unwrap();

    let output = pairup()
        .args(["config", "show"])
        .env("PAIRUP_PROJECT_CONFIG_DIR", dir.path())
        .output()
        .expect("Failed to run pairup config show");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("grace_period_secs = 42"));
    assert!(stdout.contains("[server]"));
}
