use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use micropub_lib::context::BuildContext;

use crate::output::{OutputFormat, print_json, print_stat};

/// Detected configuration, as shown by `info` and the bare invocation.
#[derive(Debug, Serialize)]
pub struct ConfigInfo {
  pub workdir: PathBuf,
  pub template: Option<PathBuf>,
  pub data: PathBuf,
  pub build_dir: PathBuf,
  pub stencila: Option<PathBuf>,
  pub python: Option<PathBuf>,
  pub environment_ready: bool,
}

impl From<&BuildContext> for ConfigInfo {
  fn from(ctx: &BuildContext) -> Self {
    Self {
      workdir: ctx.workdir().to_path_buf(),
      template: ctx.template().map(|p| ctx.relative(p)),
      data: ctx.relative(ctx.data()),
      build_dir: ctx.relative(ctx.build_dir()),
      stencila: ctx.tool().map(PathBuf::from),
      python: ctx.interpreter().map(PathBuf::from),
      environment_ready: ctx.marker().is_ready(),
    }
  }
}

fn display_or(path: Option<&PathBuf>, missing: &str) -> String {
  path.map(|p| p.display().to_string()).unwrap_or_else(|| missing.to_string())
}

pub fn print_config(ctx: &BuildContext) {
  let info = ConfigInfo::from(ctx);

  print_stat("Template", &display_or(info.template.as_ref(), "none found"));
  print_stat("Data file", &info.data.display().to_string());
  print_stat("Build dir", &info.build_dir.display().to_string());
  print_stat("Stencila", &display_or(info.stencila.as_ref(), "not found"));
  print_stat("Python", &display_or(info.python.as_ref(), "not found"));
  print_stat(
    "Environment",
    if info.environment_ready { "ready" } else { "not provisioned" },
  );
}

pub fn cmd_info(ctx: &BuildContext, output: OutputFormat) -> Result<()> {
  if output.is_json() {
    print_json(&ConfigInfo::from(ctx))?;
  } else {
    println!("Configuration:");
    print_config(ctx);
  }
  Ok(())
}
