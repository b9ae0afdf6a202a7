//! Target definitions.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::context::Requirement;

/// What a target produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
  /// No output file; always runs when requested.
  Phony,
  /// Produces `output`; skipped while the output is up to date.
  File { output: PathBuf },
  /// Provisions an environment; skipped while its marker reports ready.
  Environment { env_dir: PathBuf },
}

impl TargetKind {
  pub fn label(&self) -> &'static str {
    match self {
      TargetKind::Phony => "phony",
      TargetKind::File { .. } => "file",
      TargetKind::Environment { .. } => "environment",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prerequisite {
  /// Another target in the graph.
  Target(String),
  /// A source file that no target produces.
  File(PathBuf),
}

/// One invocation of the external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
  pub args: Vec<OsString>,
}

impl Step {
  pub fn tool<I, S>(args: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
  {
    Self {
      args: args.into_iter().map(Into::into).collect(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  /// Check inputs and tool availability.
  Validate,
  /// Make the isolated environment ready.
  Provision,
  /// Run the external tool once per step, in order.
  Invoke(Vec<Step>),
  /// Create an empty data file if none exists.
  InitData,
  /// Remove the build directory.
  Clean,
  /// Run a script through the platform shell.
  Shell(String),
  /// Aggregate target with no work of its own.
  Nothing,
}

impl Action {
  /// Preconditions that must hold before the action may run.
  pub fn requirements(&self) -> &'static [Requirement] {
    match self {
      Action::Validate | Action::Invoke(_) => &[Requirement::Template, Requirement::DataFile, Requirement::Tool],
      Action::Provision => &[Requirement::Interpreter],
      Action::InitData | Action::Clean | Action::Shell(_) | Action::Nothing => &[],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
  pub name: String,
  pub kind: TargetKind,
  pub prerequisites: Vec<Prerequisite>,
  pub action: Action,
  pub description: String,
}

impl Target {
  pub fn phony(name: impl Into<String>, action: Action) -> Self {
    Self::new(name.into(), TargetKind::Phony, action)
  }

  pub fn file(name: impl Into<String>, output: impl Into<PathBuf>, action: Action) -> Self {
    Self::new(name.into(), TargetKind::File { output: output.into() }, action)
  }

  pub fn environment(name: impl Into<String>, env_dir: impl Into<PathBuf>) -> Self {
    Self::new(
      name.into(),
      TargetKind::Environment {
        env_dir: env_dir.into(),
      },
      Action::Provision,
    )
  }

  fn new(name: String, kind: TargetKind, action: Action) -> Self {
    Self {
      name,
      kind,
      prerequisites: Vec::new(),
      action,
      description: String::new(),
    }
  }

  pub fn requires(mut self, target: impl Into<String>) -> Self {
    self.prerequisites.push(Prerequisite::Target(target.into()));
    self
  }

  pub fn requires_file(mut self, path: impl Into<PathBuf>) -> Self {
    self.prerequisites.push(Prerequisite::File(path.into()));
    self
  }

  pub fn describe(mut self, description: impl Into<String>) -> Self {
    self.description = description.into();
    self
  }

  pub fn output(&self) -> Option<&Path> {
    match &self.kind {
      TargetKind::File { output } => Some(output),
      _ => None,
    }
  }

  pub fn is_phony(&self) -> bool {
    matches!(self.kind, TargetKind::Phony)
  }

  pub fn target_prerequisites(&self) -> impl Iterator<Item = &str> {
    self.prerequisites.iter().filter_map(|p| match p {
      Prerequisite::Target(name) => Some(name.as_str()),
      Prerequisite::File(_) => None,
    })
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.name)
  }
}

/// Serializable listing entry for a target.
#[derive(Debug, Clone, Serialize)]
pub struct TargetSummary {
  pub name: String,
  pub kind: &'static str,
  pub prerequisites: Vec<String>,
  pub description: String,
}

impl From<&Target> for TargetSummary {
  fn from(target: &Target) -> Self {
    Self {
      name: target.name.clone(),
      kind: target.kind.label(),
      prerequisites: target
        .prerequisites
        .iter()
        .map(|p| match p {
          Prerequisite::Target(name) => name.clone(),
          Prerequisite::File(path) => path.display().to_string(),
        })
        .collect(),
      description: target.description.clone(),
    }
  }
}
