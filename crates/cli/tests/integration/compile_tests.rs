//! Compile pipeline integration tests.

use predicates::prelude::*;
use serial_test::serial;

use super::common::TestEnv;

#[test]
#[serial]
fn compile_builds_artifacts_in_order() {
  let env = TestEnv::project();

  env
    .cmd()
    .arg("compile")
    .assert()
    .success()
    .stdout(predicate::str::contains(
      "Compiled micropublication: build/micropublication.html",
    ));

  assert!(env.join("build/DNF.json").is_file());
  assert!(env.join("build/DNF_eval.json").is_file());
  assert!(env.join("build/micropublication.html").is_file());
  assert!(env.join("build/venv/.micropub-ready").is_file());

  let calls = env.calls();
  assert_eq!(calls.len(), 6, "{calls:?}");
  assert!(calls[0].starts_with("python -m venv"));
  assert_eq!(calls[1], "python -m pip install --upgrade pip");
  assert_eq!(calls[2], "python -m pip install pandas matplotlib");
  assert!(calls[3].starts_with("stencila convert") && calls[3].ends_with("build/DNF.json"));
  assert!(calls[4].starts_with("stencila render") && calls[4].ends_with("build/DNF_eval.json"));
  assert!(calls[5].ends_with("build/micropublication.html --standalone"));
}

#[test]
#[serial]
fn second_compile_runs_nothing() {
  let env = TestEnv::project();

  env.cmd().arg("compile").assert().success();
  env.clear_calls();

  env
    .cmd()
    .arg("compile")
    .assert()
    .success()
    .stdout(predicate::str::contains("already up to date"))
    .stdout(predicate::str::contains("Targets rebuilt: 0"));

  assert!(env.calls().is_empty());
}

#[test]
#[serial]
fn deleted_intermediate_regenerates_downstream_only() {
  let env = TestEnv::project();

  env.cmd().arg("compile").assert().success();
  std::fs::remove_file(env.join("build/DNF_eval.json")).unwrap();
  env.clear_calls();

  env.cmd().arg("compile").assert().success();

  let calls = env.calls();
  assert_eq!(calls.len(), 2, "{calls:?}");
  assert!(calls[0].starts_with("stencila render"));
  assert!(calls[1].ends_with("--standalone"));
}

#[test]
#[serial]
fn missing_data_file_fails_before_anything_runs() {
  let env = TestEnv::empty();
  env.write_file("t.smd", "# Results\n");

  env
    .cmd()
    .arg("compile")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("data file not found"))
    .stderr(predicate::str::contains("micropub init-data"));

  assert!(!env.join("build").exists());
  assert!(env.calls().is_empty());
}

#[test]
#[serial]
fn missing_template_fails_before_anything_runs() {
  let env = TestEnv::empty();
  env.write_file("data.json", "{}");

  env
    .cmd()
    .arg("compile")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("no *.smd template found"));

  assert!(!env.join("build").exists());
  assert!(env.calls().is_empty());
}

#[test]
#[serial]
fn failing_step_exits_with_target_name() {
  let env = TestEnv::project();

  env
    .cmd()
    .arg("compile")
    .env("FAKE_STENCILA_FAIL", "render")
    .assert()
    .code(1)
    .stderr(predicate::str::contains("build/DNF_eval.json"))
    .stderr(predicate::str::contains("exit code 2"));

  assert!(env.join("build/DNF.json").is_file());
  assert!(!env.join("build/micropublication.html").exists());
}

#[test]
#[serial]
fn dry_run_lists_targets_without_running() {
  let env = TestEnv::project();

  env
    .cmd()
    .args(["compile", "--dry-run"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Dry run"))
    .stdout(predicate::str::contains("build/micropublication.html"));

  assert!(!env.join("build").exists());
  assert!(env.calls().is_empty());
}

#[test]
#[serial]
fn always_make_rebuilds_the_pipeline() {
  let env = TestEnv::project();

  env.cmd().arg("compile").assert().success();
  env.clear_calls();

  env.cmd().args(["compile", "-B"]).assert().success();

  let calls = env.calls();
  assert_eq!(calls.len(), 3, "{calls:?}");
  assert!(calls.iter().all(|c| c.starts_with("stencila")));
}

#[test]
#[serial]
fn clean_then_compile_starts_over() {
  let env = TestEnv::project();

  env.cmd().arg("compile").assert().success();

  env
    .cmd()
    .arg("clean")
    .assert()
    .success()
    .stdout(predicate::str::contains("Removed build"));
  assert!(!env.join("build").exists());

  env.clear_calls();
  env.cmd().arg("compile").assert().success();

  assert_eq!(env.calls().len(), 6);
  assert!(env.join("build/micropublication.html").is_file());
}

#[test]
#[serial]
fn custom_build_dir_and_data_file() {
  let env = TestEnv::empty();
  env.write_file("paper.smd", "# Paper\n");
  env.write_file("inputs/values.json", "{}");

  env
    .cmd()
    .args(["compile", "--build-dir", "out", "--data", "inputs/values.json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("Compiled micropublication: out/micropublication.html"));

  assert!(env.join("out/micropublication.html").is_file());
  assert!(!env.join("build").exists());
}

#[test]
#[serial]
fn json_report_lists_outcomes() {
  let env = TestEnv::project();

  let output = env.cmd().args(["compile", "-o", "json"]).output().unwrap();
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["target"], "compile");
  let statuses: Vec<&str> = report["outcomes"]
    .as_array()
    .unwrap()
    .iter()
    .map(|o| o["status"].as_str().unwrap())
    .collect();
  assert_eq!(statuses, vec!["ran"; 6]);
}
