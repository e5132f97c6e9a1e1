//! CLI tests for the `casefile` binary.
//!
//! Spawns the binary against a seeded temporary workspace and checks stdout
//! JSON and exit codes for queries and mutations.

use std::path::Path;
use std::process::{Command, Output};

use casefile::core::identifier::IdentifierPolicy;
use casefile::exit_codes;
use casefile::test_support::seeded_workspace;
use serde_json::Value;

fn casefile(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_casefile"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .expect("run casefile")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is json")
}

#[test]
fn init_writes_config_and_empty_store() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = temp.path().join("casefile.toml");

    let output = casefile(&config, &["init"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(config.exists());
    assert!(temp.path().join("casefile.json").exists());

    let listed = casefile(&config, &["agentes", "list"]);
    assert_eq!(listed.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout_json(&listed), Value::Array(Vec::new()));
}

#[test]
fn seed_then_list_with_filters() {
    let temp = tempfile::tempdir().expect("tempdir");
    let config = temp.path().join("casefile.toml");
    assert_eq!(
        casefile(&config, &["init"]).status.code(),
        Some(exit_codes::OK)
    );

    let seeded = casefile(&config, &["seed"]);
    assert_eq!(seeded.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout_json(&seeded)["agentes"], 9);

    let output = casefile(
        &config,
        &["agentes", "list", "--cargo", "agente", "--sort-by", "nome", "--order", "desc"],
    );
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let names: Vec<String> = stdout_json(&output)
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|agent| agent["nome"].as_str().map(str::to_string))
        .collect();
    assert_eq!(
        names,
        vec!["Patrícia Rocha", "Mariana Costa", "Carlos Souza"]
    );
}

#[test]
fn exit_codes_follow_outcome_classes() {
    let (_temp, config) = seeded_workspace(IdentifierPolicy::Sequential);

    let invalid = casefile(&config, &["agentes", "get", "abc"]);
    assert_eq!(invalid.status.code(), Some(exit_codes::INVALID));
    let stderr = String::from_utf8_lossy(&invalid.stderr);
    assert!(stderr.contains("invalid_identifier_format"), "{stderr}");

    let missing = casefile(&config, &["casos", "get", "9999"]);
    assert_eq!(missing.status.code(), Some(exit_codes::NOT_FOUND));

    let dangling = casefile(
        &config,
        &[
            "casos",
            "create",
            r#"{"titulo":"furto","descricao":"x","status":"aberto","agente_id":9999}"#,
        ],
    );
    assert_eq!(
        dangling.status.code(),
        Some(exit_codes::REFERENCED_NOT_FOUND)
    );

    let in_use = casefile(&config, &["agentes", "delete", "1"]);
    assert_eq!(in_use.status.code(), Some(exit_codes::CONFLICT));

    let malformed = casefile(&config, &["agentes", "create", "not json"]);
    assert_eq!(malformed.status.code(), Some(exit_codes::INVALID));
}

#[test]
fn mutations_persist_between_invocations() {
    let (_temp, config) = seeded_workspace(IdentifierPolicy::Sequential);

    let patched = casefile(&config, &["casos", "patch", "2", r#"{"status":"ABERTO"}"#]);
    assert_eq!(patched.status.code(), Some(exit_codes::OK));
    assert_eq!(stdout_json(&patched)["status"], "aberto");

    let fetched = casefile(&config, &["casos", "get", "2"]);
    assert_eq!(stdout_json(&fetched)["status"], "aberto");
    assert_eq!(stdout_json(&fetched)["titulo"], "furto");

    let deleted = casefile(&config, &["casos", "delete", "2"]);
    assert_eq!(deleted.status.code(), Some(exit_codes::OK));
    assert!(deleted.stdout.is_empty());

    let gone = casefile(&config, &["casos", "get", "2"]);
    assert_eq!(gone.status.code(), Some(exit_codes::NOT_FOUND));
}
