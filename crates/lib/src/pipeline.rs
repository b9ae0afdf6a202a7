//! The micropublication target set.
//!
//! ```text
//! compile
//! ├── check
//! ├── setup
//! └── build/micropublication.html
//!     └── build/DNF_eval.json
//!         ├── build/DNF.json
//!         │   └── <template>.smd
//!         ├── data.json
//!         └── setup
//! ```
//!
//! `init-data`, `clean` and `stencila-install` stand alone.

use std::ffi::OsString;
use std::path::Path;

use crate::consts::{TEMPLATE_EXTENSION, TOOL_INSTALL_SCRIPT};
use crate::context::BuildContext;
use crate::graph::{Action, GraphError, Step, Target, TargetGraph};

pub const COMPILE: &str = "compile";
pub const SETUP: &str = "setup";
pub const CHECK: &str = "check";
pub const INIT_DATA: &str = "init-data";
pub const CLEAN: &str = "clean";
pub const TOOL_INSTALL: &str = "stencila-install";

pub const DEFAULT_TARGET: &str = COMPILE;

fn target_name(ctx: &BuildContext, path: &Path) -> String {
  ctx.relative(path).display().to_string()
}

/// Build the target graph for `ctx`.
pub fn standard_graph(ctx: &BuildContext) -> Result<TargetGraph, GraphError> {
  let dnf = ctx.dnf_json();
  let dnf_eval = ctx.dnf_eval_json();
  let html = ctx.html_output();

  let dnf_name = target_name(ctx, &dnf);
  let dnf_eval_name = target_name(ctx, &dnf_eval);
  let html_name = target_name(ctx, &html);

  // Without a template the convert step can never run: pre-flight rejects it.
  let template: OsString = match ctx.template() {
    Some(path) => path.as_os_str().to_owned(),
    None => format!("*.{}", TEMPLATE_EXTENSION).into(),
  };

  let mut convert = Target::file(
    &dnf_name,
    &dnf,
    Action::Invoke(vec![Step::tool([OsString::from("convert"), template, dnf.clone().into()])]),
  )
  .describe("Convert the template into a document tree");
  if let Some(path) = ctx.template() {
    convert = convert.requires_file(path);
  }

  let targets = vec![
    Target::phony(COMPILE, Action::Nothing)
      .requires(CHECK)
      .requires(SETUP)
      .requires(&html_name)
      .describe("Build the standalone HTML micropublication"),
    Target::phony(CHECK, Action::Validate).describe("Check that the template, data file and stencila are available"),
    Target::environment(SETUP, ctx.env_dir()).describe("Provision the Python environment"),
    convert,
    Target::file(
      &dnf_eval_name,
      &dnf_eval,
      Action::Invoke(vec![Step::tool([
        OsString::from("render"),
        dnf.clone().into(),
        dnf_eval.clone().into(),
      ])]),
    )
    .requires(&dnf_name)
    .requires_file(ctx.data())
    .requires(SETUP)
    .describe("Execute the document's code against the data file"),
    Target::file(
      &html_name,
      &html,
      Action::Invoke(vec![Step::tool([
        OsString::from("convert"),
        dnf_eval.clone().into(),
        html.clone().into(),
        OsString::from("--standalone"),
      ])]),
    )
    .requires(&dnf_eval_name)
    .describe("Render the evaluated document to HTML"),
    Target::phony(INIT_DATA, Action::InitData).describe("Create an empty data file if none exists"),
    Target::phony(CLEAN, Action::Clean).describe("Remove the build directory"),
    Target::phony(TOOL_INSTALL, Action::Shell(TOOL_INSTALL_SCRIPT.to_string())).describe("Install stencila"),
  ];

  TargetGraph::new(targets)
}
