//! Process invocation.
//!
//! Every external command the pipeline runs goes through a [`ProcessRunner`].
//! Environment changes are carried explicitly on each [`Invocation`] as
//! [`EnvOverrides`]; the process-wide environment is never mutated.

mod interrupt;
mod system;

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub use interrupt::Interrupt;
pub use system::SystemRunner;

/// Errors raised while running an external command.
///
/// A non-zero exit status is not an error at this level; it is reported
/// through [`ProcessResult`] and judged by the caller.
#[derive(Debug, Error)]
pub enum ProcessError {
  #[error("failed to start {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed waiting for {program}: {source}")]
  Wait {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("interrupted while running {program}")]
  Interrupted { program: String },

  #[error("invalid search path entry: {0}")]
  SearchPath(#[from] std::env::JoinPathsError),
}

/// Environment changes applied to a single invocation on top of the
/// inherited environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
  /// Directories placed in front of the inherited `PATH`, in order.
  pub path_prefix: Vec<PathBuf>,
  pub vars: BTreeMap<String, OsString>,
}

impl EnvOverrides {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn prepend_path(mut self, dir: impl Into<PathBuf>) -> Self {
    self.path_prefix.push(dir.into());
    self
  }

  pub fn var(mut self, key: impl Into<String>, value: impl Into<OsString>) -> Self {
    self.vars.insert(key.into(), value.into());
    self
  }

  pub fn is_empty(&self) -> bool {
    self.path_prefix.is_empty() && self.vars.is_empty()
  }

  /// Compute the `PATH` value for the child from the inherited one.
  ///
  /// Returns `None` when there is nothing to prepend, in which case the
  /// inherited value passes through untouched.
  pub fn search_path(&self, inherited: Option<&OsStr>) -> Result<Option<OsString>, ProcessError> {
    if self.path_prefix.is_empty() {
      return Ok(None);
    }

    let mut entries = self.path_prefix.clone();
    if let Some(inherited) = inherited {
      entries.extend(std::env::split_paths(inherited));
    }

    Ok(Some(std::env::join_paths(entries)?))
  }
}

/// A single external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
  pub program: PathBuf,
  pub args: Vec<OsString>,
  pub env: EnvOverrides,
}

impl Invocation {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      env: EnvOverrides::default(),
    }
  }

  /// Run `script` through the platform shell.
  pub fn shell(script: &str) -> Self {
    let (shell, args) = shell_command();
    Self::new(shell).args(args).arg(script)
  }

  pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, S>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn with_env(mut self, env: EnvOverrides) -> Self {
    self.env = env;
    self
  }

  /// The program's display name, used in logs and errors.
  pub fn program_name(&self) -> String {
    self.program.display().to_string()
  }
}

impl fmt::Display for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.program.display())?;
    for arg in &self.args {
      write!(f, " {}", arg.to_string_lossy())?;
    }
    Ok(())
  }
}

/// Exit status of a finished command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessResult {
  /// Exit code, or -1 when the process was terminated by a signal.
  pub code: i32,
}

impl ProcessResult {
  pub fn success(&self) -> bool {
    self.code == 0
  }
}

impl From<std::process::ExitStatus> for ProcessResult {
  fn from(status: std::process::ExitStatus) -> Self {
    Self {
      code: status.code().unwrap_or(-1),
    }
  }
}

/// Runs external commands.
///
/// The pipeline only ever talks to the outside world through this trait, so
/// tests can substitute a recording runner for real subprocesses.
#[allow(async_fn_in_trait)]
pub trait ProcessRunner {
  async fn invoke(&self, invocation: &Invocation) -> Result<ProcessResult, ProcessError>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
  async fn invoke(&self, invocation: &Invocation) -> Result<ProcessResult, ProcessError> {
    (**self).invoke(invocation).await
  }
}

/// Shell binary and the flags that precede the script argument.
#[cfg(unix)]
fn shell_command() -> (&'static str, Vec<&'static str>) {
  ("/bin/sh", vec!["-c"])
}

#[cfg(windows)]
fn shell_command() -> (&'static str, Vec<&'static str>) {
  ("powershell.exe", vec!["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command"])
}
