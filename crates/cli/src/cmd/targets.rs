use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use micropub_lib::context::BuildContext;
use micropub_lib::graph::TargetSummary;
use micropub_lib::pipeline::standard_graph;

use crate::output::{OutputFormat, print_json};

pub fn cmd_targets(ctx: &BuildContext, output: OutputFormat) -> Result<()> {
  let graph = standard_graph(ctx)?;
  let summaries: Vec<TargetSummary> = graph.targets().map(TargetSummary::from).collect();

  if output.is_json() {
    return print_json(&summaries);
  }

  let width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0);
  for summary in &summaries {
    println!(
      "  {:<width$}  {:<11}  {}",
      summary.name,
      summary.kind.if_supports_color(Stream::Stdout, |s| s.dimmed()),
      summary.description,
      width = width
    );
  }
  Ok(())
}
