//! Shared test helpers for CLI integration tests.

use std::ffi::OsString;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::time::{Duration, Instant};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Stand-in for stencila. Logs its arguments and writes `{}` to the output
/// path of `convert`/`render`. Exits 2 when its subcommand equals
/// `$FAKE_STENCILA_FAIL`. With `$FAKE_STENCILA_HANG` set, writes its pid there
/// and sleeps instead.
const FAKE_STENCILA: &str = r#"#!/bin/sh
echo "stencila $*" >> "$MICROPUB_TEST_LOG"
if [ -n "$FAKE_STENCILA_HANG" ]; then
  echo $$ > "$FAKE_STENCILA_HANG"
  exec sleep 30
fi
if [ -n "$FAKE_STENCILA_FAIL" ] && [ "$1" = "$FAKE_STENCILA_FAIL" ]; then
  echo "fake stencila: $1 failed" >&2
  exit 2
fi
case "$1" in
  convert|render)
    mkdir -p "$(dirname "$3")"
    echo '{}' > "$3"
    ;;
esac
"#;

/// Stand-in for python3. `-m venv DIR` copies this script into the new
/// environment; everything else is only logged.
const FAKE_PYTHON: &str = r#"#!/bin/sh
echo "python $*" >> "$MICROPUB_TEST_LOG"
if [ "$1" = "-m" ] && [ "$2" = "venv" ]; then
  mkdir -p "$3/bin"
  cp "$0" "$3/bin/python"
  chmod +x "$3/bin/python"
fi
"#;

/// Isolated project directory with fake tools.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// A project with `t.smd`, `data.json` containing `{}` and fake tools.
  pub fn project() -> Self {
    let env = Self::empty();
    env.write_file("t.smd", "# Results\n");
    env.write_file("data.json", "{}");
    env
  }

  /// A directory with fake tools but no inputs.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let env = Self { temp };
    env.write_script("tools/stencila", FAKE_STENCILA);
    env.write_script("tools/python3", FAKE_PYTHON);
    env
  }

  pub fn path(&self) -> &Path {
    self.temp.path()
  }

  pub fn join(&self, relative_path: &str) -> PathBuf {
    self.temp.path().join(relative_path)
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.join(relative_path);
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
  }

  fn write_script(&self, relative_path: &str, content: &str) {
    self.write_file(relative_path, content);
    fs::set_permissions(self.join(relative_path), fs::Permissions::from_mode(0o755)).unwrap();
  }

  fn log_path(&self) -> PathBuf {
    self.join("calls.log")
  }

  /// Commands the fake tools received, oldest first.
  pub fn calls(&self) -> Vec<String> {
    fs::read_to_string(self.log_path())
      .map(|log| log.lines().map(|line| line.to_string()).collect())
      .unwrap_or_default()
  }

  pub fn clear_calls(&self) {
    let _ = fs::remove_file(self.log_path());
  }

  fn vars(&self) -> Vec<(&'static str, OsString)> {
    vec![
      ("MICROPUB_STENCILA", self.join("tools/stencila").into()),
      ("MICROPUB_PYTHON", self.join("tools/python3").into()),
      ("MICROPUB_TEST_LOG", self.log_path().into()),
      ("RUST_LOG", "warn".into()),
    ]
  }

  const CLEARED: [&'static str; 5] = [
    "MICROPUB_TEMPLATE",
    "MICROPUB_DATA",
    "MICROPUB_BUILD_DIR",
    "FAKE_STENCILA_FAIL",
    "FAKE_STENCILA_HANG",
  ];

  /// Get a pre-configured Command for the micropub binary.
  ///
  /// Runs inside the project directory with the fake tools configured
  /// through `MICROPUB_STENCILA` and `MICROPUB_PYTHON`. Other configuration
  /// variables are cleared.
  pub fn cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("micropub");
    cmd.current_dir(self.path());
    for (key, value) in self.vars() {
      cmd.env(key, value);
    }
    for key in Self::CLEARED {
      cmd.env_remove(key);
    }
    cmd
  }

  /// Start micropub in the background with the same setup as [`TestEnv::cmd`].
  pub fn spawn(&self, args: &[&str], extra: &[(&str, &Path)]) -> Child {
    let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_micropub"));
    cmd.current_dir(self.path()).args(args).stdout(Stdio::null()).stderr(Stdio::piped());
    for (key, value) in self.vars() {
      cmd.env(key, value);
    }
    for key in Self::CLEARED {
      cmd.env_remove(key);
    }
    for (key, value) in extra {
      cmd.env(key, value);
    }
    cmd.spawn().unwrap()
  }
}

/// Wait for a file holding a pid to appear and return the pid.
pub fn wait_for_pid(path: &Path) -> String {
  let deadline = Instant::now() + Duration::from_secs(10);
  loop {
    if let Ok(content) = fs::read_to_string(path)
      && let Ok(pid) = content.trim().parse::<u32>()
    {
      return pid.to_string();
    }
    assert!(Instant::now() < deadline, "no pid written to {}", path.display());
    std::thread::sleep(Duration::from_millis(20));
  }
}

/// Deliver `signal` (e.g. `TERM`) to `pid` through kill(1).
pub fn send_signal(signal: &str, pid: &str) {
  let status = std::process::Command::new("kill")
    .arg(format!("-{signal}"))
    .arg(pid)
    .status()
    .unwrap();
  assert!(status.success(), "kill -{signal} {pid} failed");
}

pub fn pid_alive(pid: &str) -> bool {
  std::process::Command::new("kill")
    .args(["-0", pid])
    .stderr(Stdio::null())
    .status()
    .map(|s| s.success())
    .unwrap_or(false)
}
