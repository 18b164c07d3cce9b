use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn krm_kcl() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("krm-kcl"));
    cmd.env("KRM_KCL_LOG_CONSOLE", "none");
    cmd
}

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_help_lists_environment_variables() {
    krm_kcl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("SRC_URL_PASSWORD"))
        .stdout(predicate::str::contains("KCL_BIN"));
}

#[test]
fn test_version_flag() {
    krm_kcl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_validate_accepts_kclrun() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "kcl-run.yaml",
        r#"apiVersion: krm.kcl.dev/v1alpha1
kind: KCLRun
spec:
  source: github.com/kcl-lang/krm-kcl
  params:
    env: prod
  dependencies: |
    k8s = "1.28"
"#,
    );
    krm_kcl()
        .arg("validate")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("is valid"))
        .stdout(predicate::str::contains("name: kcl-function-run"))
        .stdout(predicate::str::contains("source: vcs"))
        .stdout(predicate::str::contains("dependencies: 1"));
}

#[test]
fn test_validate_rejects_wrong_kind() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "cm.yaml",
        "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: x\n",
    );
    krm_kcl()
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("KCL-CFG-002"));
}

#[test]
fn test_validate_rejects_missing_source() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "empty.yaml",
        "apiVersion: krm.kcl.dev/v1alpha1\nkind: KCLRun\nspec: {}\n",
    );
    krm_kcl()
        .arg("validate")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("`source` must not be empty"));
}

#[test]
fn test_split_prints_document_identities() {
    let dir = TempDir::new().unwrap();
    let file = write(
        &dir,
        "all.yaml",
        "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: a\n--- # next\napiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: prod\n",
    );
    krm_kcl()
        .arg("split")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("0: v1 ConfigMap/a"))
        .stdout(predicate::str::contains("1: apps/v1 Deployment/prod/web"));
}

#[test]
fn test_split_reports_malformed_separator() {
    let dir = TempDir::new().unwrap();
    let file = write(&dir, "bad.yaml", "a: 1\n--- nope\nb: 2\n");
    krm_kcl()
        .arg("split")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("KCL-YAML-001"));
}

#[test]
fn test_run_writes_error_result_for_bad_function_config() {
    let input = r#"apiVersion: config.kubernetes.io/v1
kind: ResourceList
items:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: keep-me
functionConfig:
  apiVersion: v1
  kind: ConfigMap
  metadata:
    name: not-a-kclrun
"#;
    let assert = krm_kcl()
        .arg("run")
        .arg("--kcl-bin")
        .arg("/nonexistent/kcl")
        .write_stdin(input)
        .assert()
        .failure();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let output: serde_yaml::Value = serde_yaml::from_str(&stdout).unwrap();
    assert_eq!(output["kind"], "ResourceList");
    assert_eq!(output["items"][0]["metadata"]["name"], "keep-me");
    assert_eq!(output["results"][0]["severity"], "error");
    assert!(output["results"][0]["message"]
        .as_str()
        .unwrap()
        .contains("KCL-CFG-002"));
}

#[test]
fn test_run_reports_missing_engine_binary() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "input.yaml",
        r#"apiVersion: config.kubernetes.io/v1
kind: ResourceList
items: []
functionConfig:
  apiVersion: krm.kcl.dev/v1alpha1
  kind: KCLRun
  spec:
    source: a = 1
"#,
    );
    let output = dir.path().join("output.yaml");
    krm_kcl()
        .arg("run")
        .arg("--input")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .arg("--kcl-bin")
        .arg("/nonexistent/kcl")
        .assert()
        .failure();

    let written = fs::read_to_string(&output).unwrap();
    assert!(written.contains("KCL-ENG-002"));
}

#[test]
fn test_run_rejects_non_resource_list_input() {
    krm_kcl()
        .arg("run")
        .write_stdin("apiVersion: v1\nkind: ConfigMap\n")
        .assert()
        .failure()
        .stdout(predicate::str::contains("KCL-DOC-005"));
}
