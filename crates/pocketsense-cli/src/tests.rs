//! CLI tests: argument parsing plus commands run against the mock backend

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::{NamedTempFile, TempDir};

use crate::cli::{Cli, Commands};
use crate::commands;

/// Config file selecting the mock backend, with prompts pinned to an empty dir
fn mock_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("inference.toml");
    let prompts = dir.path().join("prompts");
    std::fs::write(
        &path,
        format!(
            "[backend]\nkind = \"mock\"\n\n[prompts]\ndir = {:?}\n",
            prompts.display().to_string()
        ),
    )
    .unwrap();
    path
}

fn snapshot_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

// ========== Argument Parsing ==========

#[test]
fn test_parse_serve_defaults() {
    let cli = Cli::try_parse_from(["pocketsense", "serve"]).unwrap();
    assert!(cli.config.is_none());
    assert!(!cli.verbose);
    match cli.command {
        Commands::Serve { port, host } => {
            assert_eq!(port, 8000);
            assert_eq!(host, "127.0.0.1");
        }
        _ => panic!("expected serve"),
    }
}

#[test]
fn test_parse_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from([
        "pocketsense",
        "categorize",
        "Uber to work",
        "--config",
        "/tmp/inference.toml",
        "-v",
    ])
    .unwrap();
    assert!(cli.verbose);
    assert_eq!(cli.config.as_deref(), Some(Path::new("/tmp/inference.toml")));
    match cli.command {
        Commands::Categorize { description } => assert_eq!(description, "Uber to work"),
        _ => panic!("expected categorize"),
    }
}

#[test]
fn test_parse_insights_requires_file() {
    assert!(Cli::try_parse_from(["pocketsense", "insights"]).is_err());

    let cli = Cli::try_parse_from(["pocketsense", "insights", "-f", "snap.json"]).unwrap();
    match cli.command {
        Commands::Insights { file } => assert_eq!(file, PathBuf::from("snap.json")),
        _ => panic!("expected insights"),
    }
}

#[test]
fn test_parse_categorize_requires_description() {
    assert!(Cli::try_parse_from(["pocketsense", "categorize"]).is_err());
}

// ========== Commands ==========

#[tokio::test]
async fn test_cmd_categorize_with_mock_backend() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir);

    let result = commands::cmd_categorize(Some(&config), "Netflix subscription").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_categorize_blank_description() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir);

    let result = commands::cmd_categorize(Some(&config), "  ").await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_insights_with_mock_backend() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir);
    let snapshot = snapshot_file(
        r#"{"transactions": [{"amount": 12.0, "category": "Food", "description": "Lunch",
            "date": "2024-03-01", "type": "expense"}],
            "budgets": [{"category": "Food", "allocated": 200.0, "spent": 12.0}]}"#,
    );

    let result = commands::cmd_insights(Some(&config), snapshot.path()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_cmd_insights_missing_file() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir);

    let result = commands::cmd_insights(Some(&config), &dir.path().join("nope.json")).await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to read snapshot file"));
}

#[test]
fn test_read_snapshot() {
    let snapshot = snapshot_file(r#"{"transactions": []}"#);
    let parsed = commands::read_snapshot(snapshot.path()).unwrap();
    assert!(parsed.transactions.is_empty());
    assert!(parsed.budgets.is_empty());

    let invalid = snapshot_file("[1, 2, 3]");
    assert!(commands::read_snapshot(invalid.path()).is_err());
}

#[tokio::test]
async fn test_cmd_health_with_mock_backend() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir);

    assert!(commands::cmd_health(Some(&config)).await.is_ok());
}

#[test]
fn test_cmd_config() {
    let dir = TempDir::new().unwrap();
    let config = mock_config(&dir);

    assert!(commands::cmd_config(Some(&config)).is_ok());
}

#[test]
fn test_cmd_config_missing_file() {
    let dir = TempDir::new().unwrap();
    let result = commands::cmd_config(Some(&dir.path().join("missing.toml")));
    assert!(result.is_err());
}
