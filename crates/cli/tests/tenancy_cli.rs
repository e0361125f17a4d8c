use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

struct Env {
    dir: tempfile::TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn db(&self) -> String {
        self.dir.path().join("tenancy.db").display().to_string()
    }

    fn config(&self) -> String {
        self.dir.path().join("tenancy.toml").display().to_string()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_tenancy"))
            .args(["--config", &self.config(), "--db", &self.db()])
            .args(args)
            .env("HOME", self.dir.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("run tenancy")
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "{args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).expect("stdout json")
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn write_file(path: &Path, body: &str) {
    fs::write(path, body).expect("write file");
}

#[test]
fn schema_json_lists_tables_and_indexes() {
    let env = Env::new();
    let schema = env.json(&["schema"]);
    let tables = schema["tables"].as_array().expect("tables");
    let names: Vec<&str> = tables.iter().filter_map(|t| t["name"].as_str()).collect();
    assert_eq!(names, vec!["users", "workspaces", "workspaceMembers"]);

    let members = &tables[2];
    let indexes: Vec<&str> = members["indexes"]
        .as_array()
        .expect("indexes")
        .iter()
        .filter_map(|i| i["name"].as_str())
        .collect();
    assert_eq!(indexes, vec!["by_workspace", "by_user", "by_workspace_user"]);
}

#[test]
fn schema_sql_declares_every_index() {
    let env = Env::new();
    let output = env.run(&["schema", "--format", "sql"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let sql = String::from_utf8(output.stdout).expect("utf8");
    for index in [
        "users_by_email",
        "workspaces_by_owner",
        "workspaceMembers_by_workspace",
        "workspaceMembers_by_user",
        "workspaceMembers_by_workspace_user",
    ] {
        assert!(sql.contains(index), "missing {index} in\n{sql}");
    }
}

#[test]
fn migrate_is_idempotent() {
    let env = Env::new();
    let first = env.json(&["migrate"]);
    let second = env.json(&["migrate"]);
    assert_eq!(first["applied"], second["applied"]);
    assert_eq!(first["applied"][0], "0001_schema");
    assert!(Path::new(&env.db()).exists());
}

#[test]
fn workspace_lifecycle() {
    let env = Env::new();
    let owner = env.json(&["user", "add", "--name", "Ada", "--email", "ada@example.com"]);
    let owner_id = owner["_id"].as_str().expect("owner id").to_string();
    let bob = env.json(&["user", "add", "--email", "bob@example.com"]);
    let bob_id = bob["_id"].as_str().expect("bob id").to_string();

    let found = env.json(&["user", "find", "--email", "ada@example.com"]);
    assert_eq!(found.as_array().map(Vec::len), Some(1));

    let created = env.json(&[
        "workspace", "create", "Acme", "--owner", &owner_id, "--created-at", "1000",
    ]);
    let workspace_id = created["workspace"]["_id"]
        .as_str()
        .expect("workspace id")
        .to_string();
    assert_eq!(created["workspace"]["createdAt"], 1000);
    assert_eq!(created["ownerMembership"]["role"], "admin");

    let member = env.json(&[
        "member", "add", "--workspace", &workspace_id, "--user", &bob_id, "--joined-at", "2000",
    ]);
    assert_eq!(member["role"], "member");
    let member_id = member["_id"].as_str().expect("member id").to_string();

    let promoted = env.json(&["member", "role", &member_id, "admin"]);
    assert_eq!(promoted["role"], "admin");

    let listed = env.json(&["member", "list", "--workspace", &workspace_id]);
    assert_eq!(listed.as_array().map(Vec::len), Some(2));

    let duplicate = env.run(&[
        "member", "add", "--workspace", &workspace_id, "--user", &bob_id,
    ]);
    assert!(!duplicate.status.success());
    assert!(stderr(&duplicate).starts_with("Error:"), "{}", stderr(&duplicate));

    assert_eq!(env.json(&["audit"]), Value::Array(vec![]));

    env.json(&["workspace", "delete", &workspace_id]);
    let remaining = env.json(&["member", "list", "--user", &bob_id]);
    assert_eq!(remaining, Value::Array(vec![]));
}

#[test]
fn owner_membership_cannot_be_removed() {
    let env = Env::new();
    let owner = env.json(&["user", "add"]);
    let owner_id = owner["_id"].as_str().expect("owner id");
    let created = env.json(&["workspace", "create", "Solo", "--owner", owner_id]);
    let owner_member = created["ownerMembership"]["_id"]
        .as_str()
        .expect("membership id");

    let output = env.run(&["member", "remove", owner_member]);
    assert_eq!(output.status.code(), Some(1));
    let output = env.run(&["member", "role", owner_member, "member"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn workspace_owner_must_exist() {
    let env = Env::new();
    let output = env.run(&["workspace", "create", "Ghost", "--owner", "nobody"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("nobody"), "{}", stderr(&output));
}

#[test]
fn validate_reports_errors() {
    let env = Env::new();
    let good = env.dir.path().join("good.json");
    write_file(
        &good,
        r#"{"workspaceId": "w1", "userId": "u1", "role": "member", "joinedAt": 5}"#,
    );
    let report = env.json(&["validate", "workspaceMembers", &good.display().to_string()]);
    assert_eq!(report["valid"], true);

    let bad = env.dir.path().join("bad.json");
    write_file(
        &bad,
        r#"{"workspaceId": "w1", "userId": "u1", "role": "owner", "joinedAt": -5}"#,
    );
    let output = env.run(&["validate", "workspaceMembers", &bad.display().to_string()]);
    assert_eq!(output.status.code(), Some(1));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    assert_eq!(report["valid"], false);
    assert_eq!(report["errors"].as_array().map(Vec::len), Some(2));
}

#[test]
fn validate_reads_stdin() {
    let env = Env::new();
    let mut child = Command::new(env!("CARGO_BIN_EXE_tenancy"))
        .args(["--config", &env.config(), "validate", "users", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn tenancy");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(br#"{"email": "ada@example.com"}"#)
        .expect("write stdin");
    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success(), "{}", stderr(&output));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    assert_eq!(report["valid"], true);
}

#[test]
fn config_file_supplies_db_path() {
    let env = Env::new();
    let db = env.dir.path().join("from-config.db");
    write_file(
        Path::new(&env.config()),
        &format!("[database]\npath = {:?}\nwal = false\n", db.display().to_string()),
    );
    let output = Command::new(env!("CARGO_BIN_EXE_tenancy"))
        .args(["--config", &env.config(), "config"])
        .env_remove("RUST_LOG")
        .output()
        .expect("run tenancy");
    assert!(output.status.success(), "{}", stderr(&output));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    assert_eq!(report["db_path"], db.display().to_string());
    assert_eq!(report["config_exists"], true);
    assert_eq!(report["config"]["database"]["wal"], false);
}

#[test]
fn malformed_config_is_an_error() {
    let env = Env::new();
    write_file(Path::new(&env.config()), "[database\n");
    let output = env.run(&["config"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("tenancy.toml"), "{}", stderr(&output));
}

#[test]
fn schema_commands_ignore_broken_config() {
    let env = Env::new();
    write_file(Path::new(&env.config()), "[database\n");

    let schema = env.json(&["schema"]);
    assert!(schema["tables"].is_array());

    let doc = env.dir.path().join("user.json");
    write_file(&doc, r#"{"email": "ada@example.com"}"#);
    let report = env.json(&["validate", "users", &doc.display().to_string()]);
    assert_eq!(report["valid"], true);

    let output = env.run(&["audit"]);
    assert_eq!(output.status.code(), Some(1));
}
