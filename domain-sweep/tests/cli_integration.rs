// domain-sweep/tests/cli_integration.rs

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a workspace with a bases file and a TLD table
fn create_workspace(bases: &[&str], tlds: &[&str]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("bases.txt"), bases.join("\n")).expect("Failed to write bases");

    let mut table = String::from("tld,note\n");
    for tld in tlds {
        table.push_str(&format!("{},\n", tld));
    }
    fs::write(dir.path().join("domain_extensions.csv"), table).expect("Failed to write tlds");
    dir
}

/// Command isolated from the user's config files and DS_* variables
fn sweep_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("domain-sweep").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join("xdg"))
        .env_remove("RUST_LOG");
    for key in [
        "DS_BATCH_SIZE",
        "DS_IDLE_TIMEOUT",
        "DS_NO_TLDS",
        "DS_URL",
        "DS_OUT",
        "DS_AVAILABLE_OUT",
        "DS_PRICED_OUT",
        "DS_ON_FAILURE",
        "DS_ON_TIMEOUT",
        "DS_TLDS",
        "DS_PRICES",
        "DS_CATEGORIES",
        "DS_CONFIG",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

fn write_ledger(dir: &Path, rows: &[&str]) {
    let mut content = String::from("domain,available,lookupType,extra_json\n");
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    fs::write(dir.join("ws_domain_status.csv"), content).unwrap();
}

#[test]
fn test_help_lists_flags() {
    let mut cmd = Command::cargo_bin("domain-sweep").unwrap();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--bases"))
        .stdout(predicate::str::contains("--batch-size"))
        .stdout(predicate::str::contains("--idle-timeout"))
        .stdout(predicate::str::contains("--no-tlds"))
        .stdout(predicate::str::contains("--priced-out"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_missing_bases_file_fails() {
    let dir = create_workspace(&["acme"], &["com"]);

    sweep_cmd(dir.path())
        .args(["--bases", "missing.txt", "--dry-run"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing.txt"));
}

#[test]
fn test_empty_tld_table_is_an_error() {
    let dir = create_workspace(&["acme"], &[]);

    sweep_cmd(dir.path())
        .args(["--bases", "bases.txt", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No TLDs found"));
}

#[test]
fn test_zero_batch_size_rejected() {
    let dir = create_workspace(&["acme"], &["com"]);

    sweep_cmd(dir.path())
        .args(["--bases", "bases.txt", "--batch-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Batch size must be at least 1"));
}

#[test]
fn test_non_websocket_url_rejected() {
    let dir = create_workspace(&["acme"], &["com"]);

    sweep_cmd(dir.path())
        .args(["--bases", "bases.txt", "--url", "https://example.com/ws"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ws://"));
}

#[test]
fn test_priced_out_requires_prices() {
    let dir = create_workspace(&["acme"], &["com"]);

    sweep_cmd(dir.path())
        .args(["--bases", "bases.txt", "--priced-out", "priced.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--prices"));
}

#[test]
fn test_dry_run_shows_resume_plan() {
    let dir = create_workspace(&["acme", "rocket"], &["com", "net", "io"]);
    write_ledger(
        dir.path(),
        &[
            "acme.com,false,whois,{}",
            "acme.net,true,whois,{}",
            "acme.io,false,whois,{}",
            "rocket.com,false,whois,{}",
        ],
    );

    sweep_cmd(dir.path())
        .args(["--bases", "bases.txt", "--batch-size", "2", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rocket"))
        .stdout(predicate::str::contains("1/3 recorded"))
        .stdout(predicate::str::contains(
            "2 bases: 1 pending, 1 complete | 3 domains to query in 2 requests",
        ));

    // a dry run never touches the ledger
    let ledger = fs::read_to_string(dir.path().join("ws_domain_status.csv")).unwrap();
    assert_eq!(ledger.lines().count(), 5);
}

#[test]
fn test_dry_run_without_tlds() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("names.txt"), "acme.com\nrocket.io\n").unwrap();

    sweep_cmd(dir.path())
        .args(["--bases", "names.txt", "--no-tlds", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "2 bases: 2 pending, 0 complete | 2 domains to query in 2 requests",
        ));
}

#[test]
fn test_config_file_batch_size() {
    let dir = create_workspace(&["acme"], &["com", "net", "io", "ai"]);
    let config_path = dir.path().join("sweep.toml");
    fs::write(
        &config_path,
        r#"
[defaults]
batch_size = 3
idle_timeout = "2s"
"#,
    )
    .unwrap();

    sweep_cmd(dir.path())
        .args(["--bases", "bases.txt", "--dry-run", "--config"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("4 domains to query in 2 requests"));
}

#[test]
fn test_precedence_cli_over_env() {
    let dir = create_workspace(&["acme"], &["com", "net", "io", "ai"]);

    sweep_cmd(dir.path())
        .env("DS_BATCH_SIZE", "1")
        .args(["--bases", "bases.txt", "--dry-run", "--batch-size", "4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("4 domains to query in 1 request"));
}

#[test]
fn test_env_tld_table_used() {
    let dir = create_workspace(&["acme"], &["com"]);
    fs::write(dir.path().join("other.csv"), "TLD\n.dev\n.app\n.dev\n").unwrap();

    sweep_cmd(dir.path())
        .env("DS_TLDS", "other.csv")
        .args(["--bases", "bases.txt", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 domains to query in 1 request"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = create_workspace(&["acme"], &["com"]);
    let config_path = dir.path().join("bad.toml");
    fs::write(&config_path, "[defaults]\nbatch_size = 0\n").unwrap();

    sweep_cmd(dir.path())
        .args(["--bases", "bases.txt", "--dry-run", "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config file"));
}
