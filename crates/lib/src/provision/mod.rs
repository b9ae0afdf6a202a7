//! Isolated environment provisioning.
//!
//! The environment is a Python virtual environment inside the build
//! directory. Provisioning is gated by an [`EnvironmentMarker`]: once the
//! marker reports ready, [`EnvironmentProvisioner::ensure_ready`] returns
//! without side effects. The marker is only written after every install
//! step succeeded, so a failed run is retried from scratch next time.

pub mod marker;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::consts::REQUIRED_PACKAGES;
use crate::context::{BuildContext, ContextError};
use crate::process::{Invocation, ProcessError, ProcessRunner};

use marker::EnvironmentMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStep {
  CreateEnvironment,
  UpgradePackageManager,
  InstallPackages,
}

impl fmt::Display for ProvisionStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ProvisionStep::CreateEnvironment => write!(f, "create environment"),
      ProvisionStep::UpgradePackageManager => write!(f, "upgrade pip"),
      ProvisionStep::InstallPackages => write!(f, "install packages"),
    }
  }
}

#[derive(Debug, Error)]
pub enum ProvisionError {
  #[error(transparent)]
  Interpreter(#[from] ContextError),

  #[error("{step} failed with exit code {code}")]
  StepFailed { step: ProvisionStep, code: i32 },

  #[error("{step} failed: {source}")]
  Process {
    step: ProvisionStep,
    #[source]
    source: ProcessError,
  },

  #[error("failed to prepare {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

impl ProvisionError {
  pub fn is_interrupted(&self) -> bool {
    matches!(
      self,
      ProvisionError::Process {
        source: ProcessError::Interrupted { .. },
        ..
      }
    )
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProvisionOutcome {
  AlreadyReady,
  Provisioned,
}

pub struct EnvironmentProvisioner<'a, R> {
  context: &'a BuildContext,
  marker: EnvironmentMarker,
  packages: &'a [&'a str],
  runner: &'a R,
}

impl<'a, R: ProcessRunner> EnvironmentProvisioner<'a, R> {
  pub fn new(ctx: &'a BuildContext, runner: &'a R) -> Self {
    Self {
      context: ctx,
      marker: ctx.marker(),
      packages: REQUIRED_PACKAGES,
      runner,
    }
  }

  pub fn with_packages(mut self, packages: &'a [&'a str]) -> Self {
    self.packages = packages;
    self
  }

  /// Provision `env_dir` instead of the context's default environment.
  pub fn with_env_dir(mut self, env_dir: &Path) -> Self {
    self.marker = EnvironmentMarker::new(env_dir);
    self
  }

  pub fn marker(&self) -> &EnvironmentMarker {
    &self.marker
  }

  pub async fn ensure_ready(&self) -> Result<ProvisionOutcome, ProvisionError> {
    if self.marker.is_ready() {
      debug!(env = %self.marker.env_dir().display(), "environment already provisioned");
      return Ok(ProvisionOutcome::AlreadyReady);
    }

    info!(env = %self.marker.env_dir().display(), "provisioning environment");

    // A marker left next to a broken environment must not survive a retry.
    self.marker.clear().map_err(|source| ProvisionError::Io {
      path: self.marker.path(),
      source,
    })?;

    let env_dir = self.marker.env_dir();
    if let Some(parent) = env_dir.parent() {
      std::fs::create_dir_all(parent).map_err(|source| ProvisionError::Io {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    let env_python = self.marker.python();

    if !env_python.exists() {
      let interpreter = self.context.require_interpreter()?;

      self
        .run(
          ProvisionStep::CreateEnvironment,
          Invocation::new(interpreter).args(["-m", "venv"]).arg(env_dir.as_os_str()),
        )
        .await?;
    } else {
      debug!(python = %env_python.display(), "reusing existing environment");
    }

    self
      .run(
        ProvisionStep::UpgradePackageManager,
        Invocation::new(&env_python).args(["-m", "pip", "install", "--upgrade", "pip"]),
      )
      .await?;

    self
      .run(
        ProvisionStep::InstallPackages,
        Invocation::new(&env_python)
          .args(["-m", "pip", "install"])
          .args(self.packages.iter().copied()),
      )
      .await?;

    self.marker.write(self.packages).map_err(|source| ProvisionError::Io {
      path: self.marker.path(),
      source,
    })?;

    info!(packages = ?self.packages, "environment ready");
    Ok(ProvisionOutcome::Provisioned)
  }

  async fn run(&self, step: ProvisionStep, invocation: Invocation) -> Result<(), ProvisionError> {
    debug!(%step, "running provisioning step");

    let result = self
      .runner
      .invoke(&invocation)
      .await
      .map_err(|source| ProvisionError::Process { step, source })?;

    if !result.success() {
      return Err(ProvisionError::StepFailed {
        step,
        code: result.code,
      });
    }
    Ok(())
  }
}
