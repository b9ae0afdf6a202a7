//! Readiness sentinel for the isolated environment.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::consts::ENV_MARKER;

/// Informational marker content. Never read back for readiness.
#[derive(Debug, Serialize, Deserialize)]
pub struct MarkerMetadata {
  pub version: u32,
  pub packages: Vec<String>,
  pub provisioned_at_unix: u64,
}

/// Sentinel tied to one environment directory.
///
/// The environment counts as ready only when the marker file, the
/// environment directory and the environment's interpreter all exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentMarker {
  env_dir: PathBuf,
}

impl EnvironmentMarker {
  pub fn new(env_dir: impl Into<PathBuf>) -> Self {
    Self { env_dir: env_dir.into() }
  }

  pub fn env_dir(&self) -> &Path {
    &self.env_dir
  }

  pub fn path(&self) -> PathBuf {
    self.env_dir.join(ENV_MARKER)
  }

  /// Directory holding the environment's executables.
  #[cfg(windows)]
  pub fn bin_dir(&self) -> PathBuf {
    self.env_dir.join("Scripts")
  }

  /// Directory holding the environment's executables.
  #[cfg(not(windows))]
  pub fn bin_dir(&self) -> PathBuf {
    self.env_dir.join("bin")
  }

  #[cfg(windows)]
  pub fn python(&self) -> PathBuf {
    self.bin_dir().join("python.exe")
  }

  #[cfg(not(windows))]
  pub fn python(&self) -> PathBuf {
    self.bin_dir().join("python")
  }

  pub fn is_ready(&self) -> bool {
    self.path().is_file() && self.env_dir.is_dir() && self.python().exists()
  }

  pub fn write(&self, packages: &[&str]) -> io::Result<()> {
    let metadata = MarkerMetadata {
      version: 1,
      packages: packages.iter().map(|p| p.to_string()).collect(),
      provisioned_at_unix: SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs(),
    };

    let content = serde_json::to_string(&metadata).map_err(io::Error::other)?;
    fs::write(self.path(), format!("{}\n", content))
  }

  /// Remove the marker if present.
  pub fn clear(&self) -> io::Result<()> {
    match fs::remove_file(self.path()) {
      Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
      _ => Ok(()),
    }
  }
}
