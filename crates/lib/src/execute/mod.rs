//! Target execution.
//!
//! The [`Executor`] runs one requested target and everything it depends on:
//! - resolves the dependency order through the [`TargetGraph`]
//! - validates every precondition of the plan before touching anything
//! - skips targets the [`StalenessChecker`] reports fresh
//! - runs the rest strictly in order, aborting on the first failure
//! - stops before the next target once the run's [`Interrupt`] is raised

pub mod types;

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use tracing::{debug, error, info};

use crate::clean::clean;
use crate::context::{BuildContext, Requirement};
use crate::graph::{Action, Target, TargetGraph, TargetKind};
use crate::init::init_data;
use crate::process::{Interrupt, Invocation, ProcessError, ProcessRunner};
use crate::provision::EnvironmentProvisioner;
use crate::provision::marker::EnvironmentMarker;
use crate::stale::StalenessChecker;

pub use types::{ActionDetail, ExecuteError, ExecuteOptions, RunReport, TargetOutcome, TargetStatus};

pub struct Executor<'a, R> {
  graph: &'a TargetGraph,
  context: &'a BuildContext,
  runner: &'a R,
  options: ExecuteOptions,
  interrupt: Interrupt,
}

impl<'a, R: ProcessRunner> Executor<'a, R> {
  pub fn new(graph: &'a TargetGraph, context: &'a BuildContext, runner: &'a R) -> Self {
    Self {
      graph,
      context,
      runner,
      options: ExecuteOptions::default(),
      interrupt: Interrupt::new(),
    }
  }

  pub fn with_options(mut self, options: ExecuteOptions) -> Self {
    self.options = options;
    self
  }

  /// Share the run's interrupt flag, typically the one the runner races against.
  pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
    self.interrupt = interrupt;
    self
  }

  /// Every precondition of `plan`, deduplicated, in a stable order.
  ///
  /// The interpreter is only needed while some environment in the plan is
  /// not yet provisioned.
  pub fn requirements(&self, plan: &[&Target]) -> Vec<Requirement> {
    let mut requirements = BTreeSet::new();

    for target in plan {
      if let TargetKind::Environment { env_dir } = &target.kind
        && EnvironmentMarker::new(env_dir).is_ready()
      {
        continue;
      }
      requirements.extend(target.action.requirements().iter().copied());
    }

    requirements.into_iter().collect()
  }

  /// Check the preconditions of every target in `plan`.
  ///
  /// # Errors
  ///
  /// Returns [`ExecuteError::Preflight`] listing every unmet precondition.
  pub fn preflight(&self, plan: &[&Target]) -> Result<(), ExecuteError> {
    let problems = self.context.check(&self.requirements(plan));

    if problems.is_empty() {
      return Ok(());
    }

    for problem in &problems {
      debug!(problem = %problem, "pre-flight check failed");
    }
    Err(ExecuteError::Preflight { problems })
  }

  /// Bring `name` up to date.
  ///
  /// # Errors
  ///
  /// Fails on an unknown target or a cycle, on unmet preconditions (before
  /// any side effect), and on the first target whose action fails.
  pub async fn run(&self, name: &str) -> Result<RunReport, ExecuteError> {
    let start = Instant::now();
    let plan = self.graph.resolve(name)?;

    info!(target_name = name, targets = plan.len(), dry_run = self.options.dry_run, "starting run");

    self.preflight(&plan)?;

    let checker = StalenessChecker::new().always_make(self.options.always_make);
    let mut rebuilt: HashSet<String> = HashSet::new();
    let mut outcomes = Vec::with_capacity(plan.len());

    for target in plan {
      if self.interrupt.received().await {
        info!(name = %target.name, "interrupted, not starting target");
        return Err(ExecuteError::Interrupted {
          target: target.name.clone(),
        });
      }

      let staleness = checker.check(target, self.graph, &rebuilt);

      let mut outcome = TargetOutcome {
        name: target.name.clone(),
        kind: target.kind.label(),
        status: TargetStatus::UpToDate,
        reason: staleness.to_string(),
        detail: None,
      };

      if !staleness.is_stale() {
        debug!(name = %target.name, "up to date, skipping");
        outcomes.push(outcome);
        continue;
      }

      if self.options.dry_run {
        info!(name = %target.name, reason = %staleness, "would run");
        outcome.status = TargetStatus::WouldRun;
      } else {
        info!(name = %target.name, reason = %staleness, "running target");
        outcome.detail = self.perform(target).await.inspect_err(|e| {
          error!(name = %target.name, error = %e, "target failed");
        })?;
        outcome.status = TargetStatus::Ran;
      }

      if matches!(target.kind, TargetKind::File { .. }) {
        rebuilt.insert(target.name.clone());
      }
      outcomes.push(outcome);
    }

    let report = RunReport {
      target: name.to_string(),
      dry_run: self.options.dry_run,
      outcomes,
      elapsed: start.elapsed(),
    };

    info!(
      target_name = name,
      ran = report.count(TargetStatus::Ran),
      up_to_date = report.count(TargetStatus::UpToDate),
      would_run = report.count(TargetStatus::WouldRun),
      "run complete"
    );
    Ok(report)
  }

  async fn perform(&self, target: &Target) -> Result<Option<ActionDetail>, ExecuteError> {
    if let Some(parent) = target.output().and_then(|output| output.parent()) {
      std::fs::create_dir_all(parent).map_err(|source| ExecuteError::CreateDir {
        target: target.name.clone(),
        path: parent.to_path_buf(),
        source,
      })?;
    }

    match &target.action {
      Action::Validate => {
        let problems = self.context.check(target.action.requirements());
        if !problems.is_empty() {
          return Err(ExecuteError::Preflight { problems });
        }
        info!("inputs and tool available");
        Ok(None)
      }

      Action::Provision => {
        let mut provisioner = EnvironmentProvisioner::new(self.context, self.runner);
        if let TargetKind::Environment { env_dir } = &target.kind {
          provisioner = provisioner.with_env_dir(env_dir);
        }

        let outcome = provisioner.ensure_ready().await.map_err(|source| {
          if source.is_interrupted() {
            ExecuteError::Interrupted {
              target: target.name.clone(),
            }
          } else {
            ExecuteError::Provision {
              target: target.name.clone(),
              source,
            }
          }
        })?;
        Ok(Some(ActionDetail::Environment(outcome)))
      }

      Action::Invoke(steps) => {
        let tool = self
          .context
          .require_tool()
          .map_err(|e| ExecuteError::Preflight { problems: vec![e] })?;

        for step in steps {
          let invocation = Invocation::new(tool)
            .args(step.args.iter().cloned())
            .with_env(self.context.tool_env());
          self.invoke(target, &invocation).await?;
        }
        Ok(None)
      }

      Action::InitData => {
        let outcome = init_data(self.context.data()).map_err(|source| ExecuteError::InitData {
          target: target.name.clone(),
          source,
        })?;
        Ok(Some(ActionDetail::DataFile(outcome)))
      }

      Action::Clean => {
        let stats = clean(self.context.build_dir(), self.context.workdir()).map_err(|source| ExecuteError::Clean {
          target: target.name.clone(),
          source,
        })?;
        Ok(Some(ActionDetail::Cleaned(stats)))
      }

      Action::Shell(script) => {
        self.invoke(target, &Invocation::shell(script)).await?;
        Ok(None)
      }

      Action::Nothing => Ok(None),
    }
  }

  async fn invoke(&self, target: &Target, invocation: &Invocation) -> Result<(), ExecuteError> {
    let result = self.runner.invoke(invocation).await.map_err(|source| match source {
      ProcessError::Interrupted { .. } => ExecuteError::Interrupted {
        target: target.name.clone(),
      },
      source => ExecuteError::Process {
        target: target.name.clone(),
        source,
      },
    })?;

    if !result.success() {
      return Err(ExecuteError::Execution {
        target: target.name.clone(),
        command: invocation.to_string(),
        code: result.code,
      });
    }
    Ok(())
  }
}
