//! Build configuration resolved once per invocation.
//!
//! Every value follows the same precedence: explicit override (CLI flag),
//! then environment variable, then a computed default. The resulting
//! [`BuildContext`] is read-only for the rest of the run.

pub mod discover;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::consts::{
  DEFAULT_BUILD_DIR, DEFAULT_DATA_FILE, DNF_EVAL_JSON, DNF_JSON, ENV_BUILD_DIR, ENV_DATA, ENV_DIR, ENV_PYTHON,
  ENV_STENCILA, ENV_TEMPLATE, HTML_OUTPUT, INTERPRETER_CANDIDATES, TEMPLATE_EXTENSION, TOOL_NAME,
};
use crate::process::EnvOverrides;
use crate::provision::marker::EnvironmentMarker;

use discover::{ToolLookup, discover_template, find_executable, well_known_dirs};

/// Inputs the pipeline reads but never produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputKind {
  Template,
  DataFile,
}

impl fmt::Display for InputKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      InputKind::Template => write!(f, "template"),
      InputKind::DataFile => write!(f, "data file"),
    }
  }
}

/// A precondition that must hold before an action may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Requirement {
  Template,
  DataFile,
  Tool,
  Interpreter,
}

/// Missing preconditions detected during validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContextError {
  #[error("no *.{} template found in {}", TEMPLATE_EXTENSION, dir.display())]
  NoTemplate { dir: PathBuf },

  #[error("{input} not found: {}", path.display())]
  MissingInput { input: InputKind, path: PathBuf },

  #[error("{tool} not found on PATH{}", searched_suffix(searched))]
  ToolNotFound { tool: String, searched: Vec<PathBuf> },
}

impl ContextError {
  pub fn is_missing_input(&self) -> bool {
    matches!(self, ContextError::NoTemplate { .. } | ContextError::MissingInput { .. })
  }
}

fn searched_suffix(searched: &[PathBuf]) -> String {
  if searched.is_empty() {
    return String::new();
  }
  let dirs: Vec<String> = searched.iter().map(|d| d.display().to_string()).collect();
  format!(" or in {}", dirs.join(", "))
}

/// Values supplied explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct ContextOverrides {
  pub template: Option<PathBuf>,
  pub data: Option<PathBuf>,
  pub build_dir: Option<PathBuf>,
  pub stencila: Option<PathBuf>,
  pub python: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildContext {
  workdir: PathBuf,
  template: Option<PathBuf>,
  data: PathBuf,
  build_dir: PathBuf,
  interpreter: Option<PathBuf>,
  tool: Option<PathBuf>,
  #[serde(skip)]
  tool_searched: Vec<PathBuf>,
}

impl BuildContext {
  /// Resolve the context for a run rooted at `workdir`.
  pub fn resolve(overrides: &ContextOverrides, workdir: &Path) -> Self {
    let workdir = workdir.to_path_buf();
    let under = |p: PathBuf| if p.is_absolute() { p } else { workdir.join(p) };

    let template = overrides
      .template
      .clone()
      .or_else(|| env_path(ENV_TEMPLATE))
      .map(under)
      .or_else(|| discover_template(&workdir));

    let data = under(
      overrides
        .data
        .clone()
        .or_else(|| env_path(ENV_DATA))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE)),
    );

    let build_dir = under(
      overrides
        .build_dir
        .clone()
        .or_else(|| env_path(ENV_BUILD_DIR))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR)),
    );

    let search_path = std::env::var_os("PATH");

    let tool_lookup = match overrides.stencila.clone().or_else(|| env_path(ENV_STENCILA)) {
      Some(explicit) => locate_explicit(&explicit, &workdir, search_path.as_deref()),
      None => {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        find_executable(
          TOOL_NAME,
          search_path.as_deref(),
          &workdir,
          &well_known_dirs(home.as_deref()),
        )
      }
    };

    let interpreter = match overrides.python.clone().or_else(|| env_path(ENV_PYTHON)) {
      Some(explicit) => locate_explicit(&explicit, &workdir, search_path.as_deref()).found,
      None => INTERPRETER_CANDIDATES
        .iter()
        .find_map(|name| find_executable(name, search_path.as_deref(), &workdir, &[]).found),
    };

    let context = Self {
      template,
      data,
      build_dir,
      interpreter,
      tool: tool_lookup.found,
      tool_searched: tool_lookup.searched,
      workdir,
    };

    debug!(
      template = ?context.template,
      data = %context.data.display(),
      build_dir = %context.build_dir.display(),
      tool = ?context.tool,
      interpreter = ?context.interpreter,
      "resolved build context"
    );

    context
  }

  pub fn workdir(&self) -> &Path {
    &self.workdir
  }

  pub fn template(&self) -> Option<&Path> {
    self.template.as_deref()
  }

  pub fn data(&self) -> &Path {
    &self.data
  }

  pub fn build_dir(&self) -> &Path {
    &self.build_dir
  }

  pub fn tool(&self) -> Option<&Path> {
    self.tool.as_deref()
  }

  pub fn interpreter(&self) -> Option<&Path> {
    self.interpreter.as_deref()
  }

  pub fn env_dir(&self) -> PathBuf {
    self.build_dir.join(ENV_DIR)
  }

  pub fn marker(&self) -> EnvironmentMarker {
    EnvironmentMarker::new(self.env_dir())
  }

  pub fn dnf_json(&self) -> PathBuf {
    self.build_dir.join(DNF_JSON)
  }

  pub fn dnf_eval_json(&self) -> PathBuf {
    self.build_dir.join(DNF_EVAL_JSON)
  }

  pub fn html_output(&self) -> PathBuf {
    self.build_dir.join(HTML_OUTPUT)
  }

  /// `path` relative to the working directory when it lies inside it.
  pub fn relative(&self, path: &Path) -> PathBuf {
    path.strip_prefix(&self.workdir).map(Path::to_path_buf).unwrap_or_else(|_| path.to_path_buf())
  }

  pub fn require_tool(&self) -> Result<&Path, ContextError> {
    self.tool().ok_or_else(|| self.tool_not_found())
  }

  pub fn require_interpreter(&self) -> Result<&Path, ContextError> {
    self.interpreter().ok_or_else(|| ContextError::ToolNotFound {
      tool: INTERPRETER_CANDIDATES[0].to_string(),
      searched: Vec::new(),
    })
  }

  fn tool_not_found(&self) -> ContextError {
    ContextError::ToolNotFound {
      tool: TOOL_NAME.to_string(),
      searched: self.tool_searched.clone(),
    }
  }

  /// Check `requirements`, returning every unmet one in order.
  pub fn check(&self, requirements: &[Requirement]) -> Vec<ContextError> {
    let mut problems = Vec::new();

    for requirement in requirements {
      let problem = match requirement {
        Requirement::Template => match &self.template {
          None => Some(ContextError::NoTemplate {
            dir: self.workdir.clone(),
          }),
          Some(path) if !path.is_file() => Some(ContextError::MissingInput {
            input: InputKind::Template,
            path: path.clone(),
          }),
          Some(_) => None,
        },
        Requirement::DataFile => (!self.data.is_file()).then(|| ContextError::MissingInput {
          input: InputKind::DataFile,
          path: self.data.clone(),
        }),
        Requirement::Tool => self.require_tool().err(),
        Requirement::Interpreter => self.require_interpreter().err(),
      };

      problems.extend(problem);
    }

    problems
  }

  /// Environment for external tool steps.
  ///
  /// The provisioned environment's executables come first on `PATH` so any
  /// interpreter the tool spawns resolves to the isolated environment.
  pub fn tool_env(&self) -> EnvOverrides {
    let marker = self.marker();
    let data = dunce::canonicalize(&self.data).unwrap_or_else(|_| self.data.clone());

    EnvOverrides::new()
      .prepend_path(marker.bin_dir())
      .var("VIRTUAL_ENV", marker.env_dir().as_os_str())
      .var(ENV_DATA, data.as_os_str())
  }
}

fn env_path(key: &str) -> Option<PathBuf> {
  std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Resolve an explicitly configured executable.
///
/// Values with a directory component are taken as paths; bare names are
/// looked up on the search path.
fn locate_explicit(value: &Path, workdir: &Path, search_path: Option<&std::ffi::OsStr>) -> ToolLookup {
  let is_bare = value.components().count() == 1 && !value.is_absolute();

  if is_bare {
    return find_executable(&value.to_string_lossy(), search_path, workdir, &[]);
  }

  let path = if value.is_absolute() { value.to_path_buf() } else { workdir.join(value) };
  ToolLookup {
    found: path.is_file().then_some(path),
    searched: Vec::new(),
  }
}
