//! Test helpers shared across the crate.
//!
//! [`FakeRunner`] records invocations instead of spawning processes. It
//! simulates just enough of the real tools for the pipeline to make
//! progress: creating a virtual environment writes its interpreter, and a
//! `convert`/`render` step writes its output file.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::context::{BuildContext, ContextOverrides};
use crate::process::{Invocation, ProcessError, ProcessResult, ProcessRunner};
use crate::provision::marker::EnvironmentMarker;

type FailWhen = Box<dyn Fn(&Invocation) -> bool>;

#[derive(Default)]
pub struct FakeRunner {
  calls: RefCell<Vec<Invocation>>,
  fail_when: Option<FailWhen>,
}

impl FakeRunner {
  pub fn new() -> Self {
    Self::default()
  }

  /// Exit with code 1, without side effects, for matching invocations.
  pub fn failing_when(predicate: impl Fn(&Invocation) -> bool + 'static) -> Self {
    Self {
      calls: RefCell::default(),
      fail_when: Some(Box::new(predicate)),
    }
  }

  pub fn calls(&self) -> Vec<Invocation> {
    self.calls.borrow().clone()
  }

  /// Recorded invocations rendered as command lines.
  pub fn commands(&self) -> Vec<String> {
    self.calls.borrow().iter().map(ToString::to_string).collect()
  }

  pub fn call_count(&self) -> usize {
    self.calls.borrow().len()
  }

  pub fn reset(&self) {
    self.calls.borrow_mut().clear();
  }

  fn simulate(invocation: &Invocation) {
    let args: Vec<String> = invocation.args.iter().map(|a| a.to_string_lossy().into_owned()).collect();

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
      ["-m", "venv", env_dir] => {
        let python = EnvironmentMarker::new(*env_dir).python();
        write_file(&python, "");
      }
      ["convert" | "render", _, output, ..] => write_file(Path::new(output), "{}"),
      _ => {}
    }
  }
}

impl ProcessRunner for FakeRunner {
  async fn invoke(&self, invocation: &Invocation) -> Result<ProcessResult, ProcessError> {
    self.calls.borrow_mut().push(invocation.clone());

    if self.fail_when.as_ref().is_some_and(|fail| fail(invocation)) {
      return Ok(ProcessResult { code: 1 });
    }

    Self::simulate(invocation);
    Ok(ProcessResult { code: 0 })
  }
}

fn write_file(path: &Path, content: &str) {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).unwrap();
  }
  fs::write(path, content).unwrap();
}

fn write_inputs(root: &Path) {
  fs::write(root.join("t.smd"), "# Title\n").unwrap();
  fs::write(root.join("data.json"), "{}").unwrap();
}

fn resolve(root: &Path, stencila: PathBuf, python: PathBuf) -> BuildContext {
  let overrides = ContextOverrides {
    template: Some(root.join("t.smd")),
    data: Some(root.join("data.json")),
    build_dir: Some(root.join("build")),
    stencila: Some(stencila),
    python: Some(python),
  };
  BuildContext::resolve(&overrides, root)
}

/// A context rooted at `root` with a template, a data file and stand-in
/// executables for the tool and the interpreter.
pub fn test_context(root: &Path) -> BuildContext {
  write_inputs(root);

  let bin = root.join("bin");
  fs::create_dir_all(&bin).unwrap();
  let stencila = bin.join("stencila");
  let python = bin.join("python3");
  fs::write(&stencila, "").unwrap();
  fs::write(&python, "").unwrap();

  resolve(root, stencila, python)
}

/// Like [`test_context`] but neither executable exists.
pub fn test_context_without_tools(root: &Path) -> BuildContext {
  write_inputs(root);
  resolve(root, root.join("missing").join("stencila"), root.join("missing").join("python3"))
}
