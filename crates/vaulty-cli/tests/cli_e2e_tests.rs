//! End-to-end tests for the vaulty binary.
//!
//! Every test runs the compiled binary inside a temporary project with an
//! isolated home directory, so the real store is never touched.

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use vaulty_test_utils::project::TestProject;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn vaulty(project: &TestProject) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("vaulty"));
    cmd.current_dir(project.root())
        .env("VAULTY_HOME", project.home())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn project_name(project: &TestProject) -> String {
    project
        .root()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned()
}

/// A vault serving secret `app` and accepting token `s.main`.
async fn vault() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/data/app"))
        .and(header("X-Vault-Token", "s.main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "data": {"user": "admin", "pass": "secret"},
                "metadata": {"created_time": "2024-01-01T00:00:00Z", "destroyed": false, "version": 1}
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/token/lookup-self"))
        .and(header("X-Vault-Token", "s.main"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lease_id": "",
            "data": {"expire_time": "2099-01-01T00:00:00Z", "renewable": false, "type": "service"}
        })))
        .mount(&server)
        .await;
    server
}

fn app_config(server: &MockServer) -> String {
    format!(
        "secrets:\n  app:\n    address: {}\n    path: app\n    token: main\n",
        server.uri()
    )
}

// ============================================================================
// Help and global behaviour
// ============================================================================

#[test]
fn help_lists_command_groups() {
    let project = TestProject::new();
    vaulty(&project)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("templates"))
        .stdout(predicate::str::contains("audit"));
}

#[test]
fn missing_project_root_fails() {
    let project = TestProject::bare();
    vaulty(&project)
        .args(["config", "show"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("No project found from"));
}

// ============================================================================
// Configuration and projects
// ============================================================================

#[test]
fn config_source_defaults_without_file() {
    let project = TestProject::new();
    vaulty(&project)
        .args(["config", "source"])
        .assert()
        .success()
        .stdout("default\n");
}

#[test]
fn config_show_json_reports_resolved_values() {
    let project = TestProject::new();
    project.write_config(".vaultyrc.yml", "extension: .tpl\ngitignore: false\n");

    let output = vaulty(&project)
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let config: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config["extension"], ".tpl");
    assert_eq!(config["gitignore"], false);
    assert!(config["source"].as_str().unwrap().ends_with(".vaultyrc.yml"));
}

#[test]
fn invalid_config_is_reported_by_audit() {
    let project = TestProject::new();
    project.write_config(".vaultyrc.yml", "extension: 42\nunknown: true\n");

    vaulty(&project)
        .args(["audit", "report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Invalid configuration file"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn projects_current_prints_root() {
    let project = TestProject::new();
    vaulty(&project)
        .args(["projects", "current"])
        .assert()
        .success()
        .stdout(predicate::str::contains(project_name(&project)));
}

// ============================================================================
// Store and tokens
// ============================================================================

#[test]
fn store_is_empty_until_tokens_are_saved() {
    let project = TestProject::new();
    vaulty(&project)
        .args(["store", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The store is empty"));

    vaulty(&project)
        .args(["tokens", "save", "main:s.abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 token saved"));

    let output = vaulty(&project)
        .args(["store", "show", "--json"])
        .output()
        .unwrap();
    let store: Value = serde_json::from_slice(&output.stdout).unwrap();
    let projects = store["projects"].as_object().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects.values().next().unwrap()["tokens"]["main"], "s.abc");

    vaulty(&project)
        .args(["projects", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(project_name(&project)));
}

#[test]
fn token_deletion_needs_force_without_terminal() {
    let project = TestProject::new();
    vaulty(&project)
        .args(["tokens", "save", "main:s.abc", "ci:s.def"])
        .assert()
        .success();

    vaulty(&project)
        .args(["tokens", "delete", "main"])
        .assert()
        .failure();

    vaulty(&project)
        .args(["tokens", "delete", "main", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 token deleted"));

    let store = std::fs::read_to_string(project.store_path()).unwrap();
    assert!(!store.contains("s.abc"));
    assert!(store.contains("s.def"));
}

#[test]
fn store_reset_with_force() {
    let project = TestProject::new();
    project.write_store("not: [valid\n", 0o600);

    vaulty(&project)
        .args(["store", "reset", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Store reset"));

    vaulty(&project)
        .args(["audit", "report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[test]
fn store_source_points_into_home() {
    let project = TestProject::new();
    vaulty(&project)
        .args(["store", "source"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".vaulty-store"));
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn templates_list_honours_patterns_and_ignore_files() {
    let project = TestProject::new();
    project.write_file(".env.vaulty", "");
    project.write_file("config/a.yml.vaulty", "");
    project.write_file("config/b.yml.vaulty", "");
    project.write_file("vendor/c.vaulty", "");
    project.write_file(".vaultyignore", "vendor/\n");

    vaulty(&project)
        .args(["templates", "list"])
        .assert()
        .success()
        .stdout(".env.vaulty\nconfig/a.yml.vaulty\nconfig/b.yml.vaulty\n");

    vaulty(&project)
        .args(["templates", "list", "config/** !**/b.*"])
        .assert()
        .success()
        .stdout("config/a.yml.vaulty\n");
}

#[test]
fn dry_run_writes_nothing() {
    let project = TestProject::new();
    project.write_file("notes.txt.vaulty", "static\n");

    vaulty(&project)
        .args(["templates", "write", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("would write"));

    project.assert_file_not_exists("notes.txt");
}

#[test]
fn render_failure_exits_with_issue_table() {
    let project = TestProject::new();
    project.write_file("digest.vaulty", "{{ 'x' | hash('md4') }}");

    vaulty(&project)
        .args(["render"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("hash filter: Digest method not supported"))
        .stdout(predicate::str::contains("1 issue (1 error, 0 warnings)"));
}

#[test]
fn audit_fix_renders_missing_outputs() {
    let project = TestProject::new();
    project.write_file("notes.txt.vaulty", "{{ 'abc' | base64encode }}\n");

    vaulty(&project)
        .args(["audit", "report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Output does not exist"))
        .stdout(predicate::str::contains("vaulty audit fix"));

    vaulty(&project)
        .args(["audit", "fix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 fix applied"));

    assert_eq!(project.read_file("notes.txt"), "YWJj\n");

    vaulty(&project)
        .args(["audit", "fix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to fix"));
}

#[test]
fn templates_delete_keeps_templates() {
    let project = TestProject::new();
    project.write_file(".env.vaulty", "A=1\n");
    project.write_file(".env", "A=1\n");

    vaulty(&project)
        .args(["templates", "delete"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 output deleted"));

    project.assert_file_not_exists(".env");
    project.assert_file_exists(".env.vaulty");
}

// ============================================================================
// Against a vault
// ============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn write_renders_remote_secrets() {
    let server = vault().await;
    let project = TestProject::new();
    project.write_config(".vaultyrc.yml", &app_config(&server));
    project.write_file(".env.vaulty", "{{ secrets.app | keyValue }}\n");

    vaulty(&project)
        .args(["templates", "write", "--tokens", "main:s.main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 output written"));

    assert_eq!(project.read_file(".env"), "user=admin\npass=secret\n");

    vaulty(&project)
        .args(["audit", "report", "--tokens", "main:s.main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_token_fails_the_write() {
    let server = vault().await;
    let project = TestProject::new();
    project.write_config(".vaultyrc.yml", &app_config(&server));
    project.write_file(".env.vaulty", "{{ secrets.app.user }}\n");

    vaulty(&project)
        .args(["templates", "write"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Token not found"))
        .stdout(predicate::str::contains("No outputs written"));

    project.assert_file_not_exists(".env");
}

#[tokio::test(flavor = "multi_thread")]
async fn secrets_show_prints_remote_data() {
    let server = vault().await;
    let project = TestProject::new();
    project.write_config(".vaultyrc.yml", &app_config(&server));

    vaulty(&project)
        .args(["secrets", "show", "--tokens", "main:s.main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("─ app"))
        .stdout(predicate::str::contains("\"user\": \"admin\""));
}

#[tokio::test(flavor = "multi_thread")]
async fn tokens_list_shows_origin_and_expiry() {
    let server = vault().await;
    let project = TestProject::new();
    project.write_config(".vaultyrc.yml", &app_config(&server));

    vaulty(&project)
        .args(["tokens", "list", "--tokens", "main:s.main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Option"))
        .stdout(predicate::str::contains("2099-01-01"));

    vaulty(&project)
        .args(["tokens", "renew", "--tokens", "main:s.main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No tokens to renew"));
}
