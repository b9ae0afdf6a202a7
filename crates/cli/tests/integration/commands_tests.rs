//! Integration tests for the standalone targets and informational commands.

use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

#[test]
#[serial]
fn check_passes_with_all_inputs() {
  let env = TestEnv::project();

  env
    .cmd()
    .arg("check")
    .assert()
    .success()
    .stdout(predicate::str::contains("All inputs present"));

  assert!(!env.join("build").exists());
}

#[test]
#[serial]
fn check_reports_every_missing_precondition() {
  let env = TestEnv::empty();

  env
    .cmd()
    .arg("check")
    .env("MICROPUB_STENCILA", env.join("nowhere/stencila"))
    .assert()
    .code(1)
    .stderr(predicate::str::contains("no *.smd template found"))
    .stderr(predicate::str::contains("data file not found"))
    .stderr(predicate::str::contains("stencila not found"));

  assert!(!env.join("build").exists());
}

#[test]
#[serial]
fn setup_provisions_once() {
  let env = TestEnv::empty();

  env
    .cmd()
    .arg("setup")
    .assert()
    .success()
    .stdout(predicate::str::contains("Environment ready: build/venv"));
  assert_eq!(env.calls().len(), 3);
  env.clear_calls();

  env
    .cmd()
    .arg("setup")
    .assert()
    .success()
    .stdout(predicate::str::contains("already provisioned"));
  assert!(env.calls().is_empty());
}

#[test]
#[serial]
fn deleting_marker_reprovisions() {
  let env = TestEnv::empty();

  env.cmd().arg("setup").assert().success();
  std::fs::remove_file(env.join("build/venv/.micropub-ready")).unwrap();
  env.clear_calls();

  env.cmd().arg("setup").assert().success();

  let calls = env.calls();
  assert_eq!(calls.len(), 2, "{calls:?}");
  assert_eq!(calls[1], "python -m pip install pandas matplotlib");
}

#[test]
#[serial]
fn init_data_creates_then_leaves_alone() {
  let env = TestEnv::empty();

  env
    .cmd()
    .arg("init-data")
    .assert()
    .success()
    .stdout(predicate::str::contains("Created data file: data.json"));
  assert_eq!(std::fs::read_to_string(env.join("data.json")).unwrap().trim(), "{}");

  env.write_file("data.json", r#"{"n": 1}"#);
  env
    .cmd()
    .arg("init-data")
    .assert()
    .success()
    .stdout(predicate::str::contains("already exists"));
  assert_eq!(std::fs::read_to_string(env.join("data.json")).unwrap(), r#"{"n": 1}"#);
}

#[test]
#[serial]
fn clean_without_build_dir() {
  let env = TestEnv::empty();

  env
    .cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Nothing to clean"));
}

#[test]
#[serial]
fn clean_refuses_the_project_directory() {
  let env = TestEnv::project();

  env
    .cmd()
    .args(["clean", "--build-dir", "."])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("contains the working directory"))
    .stderr(predicate::str::contains("--build-dir inside the project"));

  assert!(env.join("t.smd").is_file());
  assert!(env.join("data.json").is_file());
}

#[test]
#[serial]
fn run_single_file_target() {
  let env = TestEnv::project();

  env
    .cmd()
    .args(["run", "build/DNF.json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Built build/DNF.json"));

  assert_eq!(env.calls().len(), 1);
  assert!(!env.join("build/venv").exists());
}

#[test]
#[serial]
fn run_unknown_target_fails_with_hint() {
  let env = TestEnv::project();

  env
    .cmd()
    .args(["run", "publish"])
    .assert()
    .code(1)
    .stderr(predicate::str::contains("unknown target: publish"))
    .stderr(predicate::str::contains("micropub targets"));
}

#[test]
#[serial]
fn targets_lists_the_pipeline() {
  let env = TestEnv::project();

  env
    .cmd()
    .arg("targets")
    .assert()
    .success()
    .stdout(predicate::str::contains("compile"))
    .stdout(predicate::str::contains("build/DNF_eval.json"))
    .stdout(predicate::str::contains("stencila-install"));
}

#[test]
#[serial]
fn info_json_reports_detected_paths() {
  let env = TestEnv::project();

  let output = env.cmd().args(["info", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(info["template"], "t.smd");
  assert_eq!(info["data"], "data.json");
  assert_eq!(info["build_dir"], "build");
  assert_eq!(info["environment_ready"], false);
}

#[test]
#[serial]
fn bare_invocation_prints_usage_and_configuration() {
  let env = TestEnv::project();

  env
    .cmd()
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"))
    .stdout(predicate::str::contains("Detected configuration"))
    .stdout(predicate::str::contains("t.smd"));
}

#[test]
#[serial]
fn template_env_var_is_honoured() {
  let env = TestEnv::project();
  env.write_file("other.smd", "# Other\n");

  let output = env
    .cmd()
    .args(["info", "-o", "json"])
    .env("MICROPUB_TEMPLATE", "other.smd")
    .output()
    .unwrap();

  let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(info["template"], "other.smd");
}
