//! Termination signals must reach the running tool and stop the pipeline.

use std::time::{Duration, Instant};

use serial_test::serial;

use super::common::{TestEnv, pid_alive, send_signal, wait_for_pid};

fn assert_gone(pid: &str) {
  let deadline = Instant::now() + Duration::from_secs(5);
  while pid_alive(pid) {
    assert!(Instant::now() < deadline, "tool process {pid} still running");
    std::thread::sleep(Duration::from_millis(20));
  }
}

fn stop_running_tool(signal: &str) {
  let env = TestEnv::project();
  let pid_file = env.join("stencila.pid");

  let mut micropub = env.spawn(&["run", "build/DNF.json"], &[("FAKE_STENCILA_HANG", pid_file.as_path())]);
  let tool_pid = wait_for_pid(&pid_file);

  send_signal(signal, &micropub.id().to_string());
  let output = micropub.wait_with_output().unwrap();

  assert_eq!(output.status.code(), Some(130));
  assert!(String::from_utf8_lossy(&output.stderr).contains("interrupted while building build/DNF.json"));
  assert_gone(&tool_pid);
  assert!(!env.join("build/DNF.json").exists());
}

#[test]
#[serial]
fn sigterm_kills_the_running_tool() {
  stop_running_tool("TERM");
}

#[test]
#[serial]
fn sigint_kills_the_running_tool() {
  stop_running_tool("INT");
}
