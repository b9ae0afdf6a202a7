//! Subprocess runner backed by `tokio::process`.

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{Interrupt, Invocation, ProcessError, ProcessResult, ProcessRunner};

/// Runs commands as real child processes.
///
/// Standard streams are inherited so the tool's own output reaches the user
/// live. When the [`Interrupt`] is raised the running child is killed and the
/// call surfaces as [`ProcessError::Interrupted`]; once raised, no further
/// command is started.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
  interrupt: Interrupt,
}

impl SystemRunner {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
    self.interrupt = interrupt;
    self
  }

  fn command(invocation: &Invocation) -> Result<Command, ProcessError> {
    let mut command = Command::new(&invocation.program);
    command
      .args(&invocation.args)
      .stdin(Stdio::inherit())
      .stdout(Stdio::inherit())
      .stderr(Stdio::inherit())
      .kill_on_drop(true);

    let inherited = std::env::var_os("PATH");
    if let Some(path) = invocation.env.search_path(inherited.as_deref())? {
      debug!(path = ?path, "prepending search path");
      command.env("PATH", path);
    }

    for (key, value) in &invocation.env.vars {
      command.env(key, value);
    }

    Ok(command)
  }
}

impl ProcessRunner for SystemRunner {
  async fn invoke(&self, invocation: &Invocation) -> Result<ProcessResult, ProcessError> {
    info!(cmd = %invocation, "executing command");

    let program = invocation.program_name();
    if self.interrupt.is_triggered() {
      return Err(ProcessError::Interrupted { program });
    }

    let mut child = Self::command(invocation)?
      .spawn()
      .map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
      })?;

    let status = tokio::select! {
      status = child.wait() => status.map_err(|source| ProcessError::Wait { program: program.clone(), source })?,
      _ = self.interrupt.triggered() => {
        warn!(program = %program, "interrupt received, stopping command");
        if let Err(e) = child.kill().await {
          warn!(error = %e, "failed to kill child process");
        }
        return Err(ProcessError::Interrupted { program });
      }
    };

    let result = ProcessResult::from(status);
    debug!(program = %program, code = result.code, "command finished");
    Ok(result)
  }
}
