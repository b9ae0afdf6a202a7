//! Remediation hints shown under error messages.

use micropub_lib::clean::CleanError;
use micropub_lib::consts::TOOL_NAME;
use micropub_lib::context::{ContextError, InputKind};
use micropub_lib::execute::ExecuteError;
use micropub_lib::graph::GraphError;

pub fn for_context(err: &ContextError) -> Option<&'static str> {
  match err {
    ContextError::NoTemplate { .. } => Some("create a .smd template here, or pass --template"),
    ContextError::MissingInput {
      input: InputKind::Template,
      ..
    } => Some("check --template or MICROPUB_TEMPLATE"),
    ContextError::MissingInput {
      input: InputKind::DataFile,
      ..
    } => Some("run `micropub init-data` to create an empty data file, or pass --data"),
    ContextError::ToolNotFound { tool, .. } if tool == TOOL_NAME => {
      Some("run `micropub stencila-install`, or pass --stencila")
    }
    ContextError::ToolNotFound { .. } => Some("install Python 3, or pass --python"),
  }
}

pub fn for_graph(err: &GraphError) -> Option<&'static str> {
  match err {
    GraphError::UnknownTarget { .. } => Some("run `micropub targets` to list available targets"),
    _ => None,
  }
}

pub fn for_execute(err: &ExecuteError) -> Option<&'static str> {
  match err {
    ExecuteError::Graph(err) => for_graph(err),
    ExecuteError::Execution { .. } => Some("see the stencila output above"),
    ExecuteError::Provision { .. } => {
      Some("see the pip output above; provisioning starts over on the next run")
    }
    ExecuteError::Process { .. } => Some("check that the configured executable can be run"),
    ExecuteError::Clean {
      source: CleanError::ContainsWorkdir { .. },
      ..
    } => Some("pass a --build-dir inside the project"),
    _ => None,
  }
}
