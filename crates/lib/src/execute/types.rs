//! Types for target execution.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::clean::{CleanError, CleanStats};
use crate::context::ContextError;
use crate::graph::GraphError;
use crate::init::{InitDataOutcome, InitError};
use crate::process::ProcessError;
use crate::provision::{ProvisionError, ProvisionOutcome};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum ExecuteError {
  #[error(transparent)]
  Graph(#[from] GraphError),

  /// One or more preconditions are unmet. Nothing has been touched.
  #[error("{}", join_problems(problems))]
  Preflight { problems: Vec<ContextError> },

  /// An external command exited non-zero.
  #[error("{target}: command failed with exit code {code}: {command}")]
  Execution { target: String, command: String, code: i32 },

  /// An external command could not be run at all.
  #[error("{target}: {source}")]
  Process {
    target: String,
    #[source]
    source: ProcessError,
  },

  #[error("{target}: {source}")]
  Provision {
    target: String,
    #[source]
    source: ProvisionError,
  },

  #[error("{target}: {source}")]
  Clean {
    target: String,
    #[source]
    source: CleanError,
  },

  #[error("{target}: {source}")]
  InitData {
    target: String,
    #[source]
    source: InitError,
  },

  #[error("{target}: failed to create {}: {source}", path.display())]
  CreateDir {
    target: String,
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("interrupted while building {target}")]
  Interrupted { target: String },
}

impl ExecuteError {
  pub fn is_interrupted(&self) -> bool {
    matches!(self, ExecuteError::Interrupted { .. })
  }

  /// Name of the target that failed, when the failure belongs to one.
  pub fn target(&self) -> Option<&str> {
    match self {
      ExecuteError::Execution { target, .. }
      | ExecuteError::Process { target, .. }
      | ExecuteError::Provision { target, .. }
      | ExecuteError::Clean { target, .. }
      | ExecuteError::InitData { target, .. }
      | ExecuteError::CreateDir { target, .. }
      | ExecuteError::Interrupted { target } => Some(target),
      ExecuteError::Graph(_) | ExecuteError::Preflight { .. } => None,
    }
  }
}

fn join_problems(problems: &[ContextError]) -> String {
  problems.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Options controlling a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
  /// Report what would run without running it.
  pub dry_run: bool,
  /// Treat every file target as stale.
  pub always_make: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetStatus {
  Ran,
  UpToDate,
  WouldRun,
}

/// What an action did beyond running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionDetail {
  Cleaned(CleanStats),
  DataFile(InitDataOutcome),
  Environment(ProvisionOutcome),
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetOutcome {
  pub name: String,
  pub kind: &'static str,
  pub status: TargetStatus,
  /// Why the target was considered stale or fresh.
  pub reason: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub detail: Option<ActionDetail>,
}

/// Result of running one requested target.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub target: String,
  pub dry_run: bool,
  pub outcomes: Vec<TargetOutcome>,
  #[serde(skip)]
  pub elapsed: Duration,
}

impl RunReport {
  pub fn count(&self, status: TargetStatus) -> usize {
    self.outcomes.iter().filter(|o| o.status == status).count()
  }

  pub fn outcome(&self, name: &str) -> Option<&TargetOutcome> {
    self.outcomes.iter().find(|o| o.name == name)
  }

  /// Whether any file or environment target was rebuilt.
  pub fn did_work(&self) -> bool {
    self
      .outcomes
      .iter()
      .any(|o| o.status == TargetStatus::Ran && o.kind != "phony")
  }

  pub fn detail(&self, name: &str) -> Option<ActionDetail> {
    self.outcome(name).and_then(|o| o.detail)
  }
}
