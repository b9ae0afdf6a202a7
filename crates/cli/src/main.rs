mod cmd;
mod hints;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use micropub_lib::context::{BuildContext, ContextOverrides};
use micropub_lib::execute::{ExecuteError, ExecuteOptions};
use micropub_lib::graph::GraphError;
use micropub_lib::pipeline;

use cmd::{cmd_info, cmd_run, cmd_targets, print_config};
use output::{OutputFormat, print_error, print_hint, print_warning};

/// Exit code for a run stopped by Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

/// Compile a micropublication from a template and a data file
#[derive(Parser)]
#[command(name = "micropub")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Template document (default: first *.smd in the current directory)
  #[arg(long, global = true, value_name = "PATH")]
  template: Option<PathBuf>,

  /// JSON data file (default: data.json)
  #[arg(long, global = true, value_name = "PATH")]
  data: Option<PathBuf>,

  /// Build output directory (default: build)
  #[arg(long, global = true, value_name = "DIR")]
  build_dir: Option<PathBuf>,

  /// stencila executable
  #[arg(long, global = true, value_name = "PATH")]
  stencila: Option<PathBuf>,

  /// Python interpreter used to create the environment
  #[arg(long, global = true, value_name = "PATH")]
  python: Option<PathBuf>,

  /// Show what would run without running it
  #[arg(short = 'n', long, global = true)]
  dry_run: bool,

  /// Rebuild every file target regardless of timestamps
  #[arg(short = 'B', long, global = true)]
  always_make: bool,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  output: OutputFormat,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Validate inputs, provision the environment and build the HTML page
  Compile,
  /// Provision the Python environment
  Setup,
  /// Check that the template, data file and stencila are available
  Check,
  /// Create an empty data file if none exists
  InitData,
  /// Remove the build directory
  Clean,
  /// Install stencila with the upstream install script
  StencilaInstall,
  /// Run a target by name
  Run {
    #[arg(default_value = pipeline::DEFAULT_TARGET)]
    target: String,
  },
  /// List available targets
  Targets,
  /// Show the detected configuration
  Info,
}

impl Cli {
  fn overrides(&self) -> ContextOverrides {
    ContextOverrides {
      template: self.template.clone(),
      data: self.data.clone(),
      build_dir: self.build_dir.clone(),
      stencila: self.stencila.clone(),
      python: self.python.clone(),
    }
  }

  fn execute_options(&self) -> ExecuteOptions {
    ExecuteOptions {
      dry_run: self.dry_run,
      always_make: self.always_make,
    }
  }
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match run(cli) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => report(&err),
  }
}

fn run(cli: Cli) -> Result<()> {
  let workdir = std::env::current_dir().context("Failed to determine the current directory")?;
  let ctx = BuildContext::resolve(&cli.overrides(), &workdir);
  let options = cli.execute_options();
  let output = cli.output;

  let target = match &cli.command {
    None => {
      Cli::command().print_help()?;
      println!();
      println!("Detected configuration:");
      print_config(&ctx);
      return Ok(());
    }
    Some(Commands::Targets) => return cmd_targets(&ctx, output),
    Some(Commands::Info) => return cmd_info(&ctx, output),
    Some(Commands::Compile) => pipeline::COMPILE,
    Some(Commands::Setup) => pipeline::SETUP,
    Some(Commands::Check) => pipeline::CHECK,
    Some(Commands::InitData) => pipeline::INIT_DATA,
    Some(Commands::Clean) => pipeline::CLEAN,
    Some(Commands::StencilaInstall) => pipeline::TOOL_INSTALL,
    Some(Commands::Run { target }) => target.as_str(),
  };

  debug!(target_name = target, workdir = %workdir.display(), "dispatching");
  cmd_run(&ctx, target, options, output)
}

/// Print `err` with a remediation hint and pick the exit code.
fn report(err: &anyhow::Error) -> ExitCode {
  if let Some(err) = err.downcast_ref::<ExecuteError>() {
    match err {
      ExecuteError::Preflight { problems } => {
        for problem in problems {
          print_error(&problem.to_string());
          if let Some(hint) = hints::for_context(problem) {
            print_hint(hint);
          }
        }
      }
      ExecuteError::Interrupted { .. } => {
        print_warning(&err.to_string());
        return ExitCode::from(EXIT_INTERRUPTED);
      }
      _ => {
        print_error(&err.to_string());
        if let Some(hint) = hints::for_execute(err) {
          print_hint(hint);
        }
      }
    }
    return ExitCode::FAILURE;
  }

  if let Some(err) = err.downcast_ref::<GraphError>() {
    print_error(&err.to_string());
    if let Some(hint) = hints::for_graph(err) {
      print_hint(hint);
    }
    return ExitCode::FAILURE;
  }

  print_error(&format!("{:#}", err));
  ExitCode::FAILURE
}
