//! Implementation of the target commands (`compile`, `setup`, `check`,
//! `init-data`, `clean`, `stencila-install` and `run`).

use anyhow::{Context, Result};

use micropub_lib::context::BuildContext;
use micropub_lib::execute::{ActionDetail, ExecuteOptions, Executor, RunReport, TargetStatus};
use micropub_lib::init::InitDataOutcome;
use micropub_lib::pipeline::{self, standard_graph};
use micropub_lib::process::{Interrupt, SystemRunner};
use micropub_lib::provision::ProvisionOutcome;

use crate::output::{
  OutputFormat, format_bytes, format_duration, print_info, print_item, print_json, print_stat, print_success,
};

/// Bring `target` up to date and print what happened.
pub fn cmd_run(ctx: &BuildContext, target: &str, options: ExecuteOptions, output: OutputFormat) -> Result<()> {
  let graph = standard_graph(ctx)?;

  let rt = tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")?;

  let report = rt.block_on(async {
    let interrupt = Interrupt::new();
    interrupt.listen().context("Failed to install signal handlers")?;
    let runner = SystemRunner::new().with_interrupt(interrupt.clone());

    Executor::new(&graph, ctx, &runner)
      .with_options(options)
      .with_interrupt(interrupt)
      .run(target)
      .await
      .map_err(anyhow::Error::from)
  })?;

  if output.is_json() {
    print_json(&report)?;
  } else if report.dry_run {
    print_dry_run(&report);
  } else {
    print_report(ctx, &report);
  }

  Ok(())
}

fn print_dry_run(report: &RunReport) {
  print_info("Dry run - no changes made");
  let pending: Vec<_> = report
    .outcomes
    .iter()
    .filter(|o| o.status == TargetStatus::WouldRun)
    .collect();

  if pending.is_empty() {
    print_stat("Would run", "nothing");
  }
  for outcome in pending {
    print_item(&outcome.name, &outcome.reason);
  }
}

fn print_report(ctx: &BuildContext, report: &RunReport) {
  let relative = |path: &std::path::Path| ctx.relative(path).display().to_string();

  match report.target.as_str() {
    pipeline::COMPILE => {
      print_success(&format!("Compiled micropublication: {}", relative(&ctx.html_output())));
      if !report.did_work() {
        print_stat("Status", "already up to date");
      }
      print_stat("Targets rebuilt", &rebuilt(report).to_string());
      print_stat("Duration", &format_duration(report.elapsed));
    }
    pipeline::SETUP => match report.detail(pipeline::SETUP) {
      Some(ActionDetail::Environment(ProvisionOutcome::Provisioned)) => {
        print_success(&format!("Environment ready: {}", relative(&ctx.env_dir())));
        print_stat("Duration", &format_duration(report.elapsed));
      }
      _ => print_info(&format!("Environment already provisioned: {}", relative(&ctx.env_dir()))),
    },
    pipeline::CHECK => {
      print_success("All inputs present");
      if let Some(template) = ctx.template() {
        print_stat("Template", &relative(template));
      }
      print_stat("Data file", &relative(ctx.data()));
      if let Some(tool) = ctx.tool() {
        print_stat("Stencila", &tool.display().to_string());
      }
    }
    pipeline::INIT_DATA => match report.detail(pipeline::INIT_DATA) {
      Some(ActionDetail::DataFile(InitDataOutcome::Created)) => {
        print_success(&format!("Created data file: {}", relative(ctx.data())))
      }
      _ => print_info(&format!("Data file already exists: {}", relative(ctx.data()))),
    },
    pipeline::CLEAN => match report.detail(pipeline::CLEAN) {
      Some(ActionDetail::Cleaned(stats)) if !stats.is_empty() => {
        print_success(&format!("Removed {}", relative(ctx.build_dir())));
        print_stat("Files removed", &stats.files_removed.to_string());
        print_stat("Space freed", &format_bytes(stats.bytes_freed));
      }
      _ => print_info("Nothing to clean"),
    },
    pipeline::TOOL_INSTALL => print_success("stencila installed"),
    name => match report.outcome(name).map(|o| o.status) {
      Some(TargetStatus::UpToDate) => print_info(&format!("{} is up to date", name)),
      _ => {
        print_success(&format!("Built {}", name));
        print_stat("Targets rebuilt", &rebuilt(report).to_string());
      }
    },
  }
}

/// File and environment targets that ran.
fn rebuilt(report: &RunReport) -> usize {
  report
    .outcomes
    .iter()
    .filter(|o| o.status == TargetStatus::Ran && o.kind != "phony")
    .count()
}
