//! Staleness decisions.
//!
//! Decisions fail open: whenever the answer is uncertain (a missing
//! prerequisite, an unreadable timestamp) the target is treated as stale.
//! Equal timestamps count as up to date.

use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use crate::graph::{Prerequisite, Target, TargetGraph, TargetKind};
use crate::provision::marker::EnvironmentMarker;

/// Why a target does or does not need to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
  UpToDate,
  Phony,
  Forced,
  MissingOutput(PathBuf),
  MissingPrerequisite(PathBuf),
  NewerPrerequisite(PathBuf),
  PrerequisiteRebuilt(String),
  UnreadableTimestamp(PathBuf),
  NotProvisioned,
}

impl Staleness {
  pub fn is_stale(&self) -> bool {
    !matches!(self, Staleness::UpToDate)
  }
}

impl fmt::Display for Staleness {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Staleness::UpToDate => write!(f, "up to date"),
      Staleness::Phony => write!(f, "phony target"),
      Staleness::Forced => write!(f, "forced rebuild"),
      Staleness::MissingOutput(p) => write!(f, "output {} does not exist", p.display()),
      Staleness::MissingPrerequisite(p) => write!(f, "prerequisite {} does not exist", p.display()),
      Staleness::NewerPrerequisite(p) => write!(f, "prerequisite {} is newer", p.display()),
      Staleness::PrerequisiteRebuilt(name) => write!(f, "prerequisite {} was rebuilt", name),
      Staleness::UnreadableTimestamp(p) => write!(f, "cannot read timestamp of {}", p.display()),
      Staleness::NotProvisioned => write!(f, "environment not provisioned"),
    }
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StalenessChecker {
  /// Treat every file target as stale.
  pub always_make: bool,
}

impl StalenessChecker {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn always_make(mut self, always_make: bool) -> Self {
    self.always_make = always_make;
    self
  }

  pub fn is_stale(&self, target: &Target, graph: &TargetGraph, rebuilt: &HashSet<String>) -> bool {
    self.check(target, graph, rebuilt).is_stale()
  }

  /// Decide whether `target` must run.
  ///
  /// `rebuilt` holds the names of file targets that ran (or would run)
  /// earlier in this invocation.
  pub fn check(&self, target: &Target, graph: &TargetGraph, rebuilt: &HashSet<String>) -> Staleness {
    let staleness = match &target.kind {
      TargetKind::Phony => Staleness::Phony,
      TargetKind::Environment { env_dir } => {
        if EnvironmentMarker::new(env_dir).is_ready() {
          Staleness::UpToDate
        } else {
          Staleness::NotProvisioned
        }
      }
      TargetKind::File { .. } if self.always_make => Staleness::Forced,
      TargetKind::File { output } => check_file(output, &target.prerequisites, graph, rebuilt),
    };

    debug!(name = %target.name, reason = %staleness, "staleness checked");
    staleness
  }
}

fn check_file(output: &Path, prerequisites: &[Prerequisite], graph: &TargetGraph, rebuilt: &HashSet<String>) -> Staleness {
  let output_time = match modified(output) {
    Ok(Some(time)) => time,
    Ok(None) => return Staleness::MissingOutput(output.to_path_buf()),
    Err(_) => return Staleness::UnreadableTimestamp(output.to_path_buf()),
  };

  for prerequisite in prerequisites {
    let path = match prerequisite {
      Prerequisite::File(path) => path.as_path(),
      Prerequisite::Target(name) => {
        if rebuilt.contains(name) {
          return Staleness::PrerequisiteRebuilt(name.clone());
        }
        // Only file-producing prerequisites carry a timestamp to compare.
        match graph.get(name).and_then(Target::output) {
          Some(path) => path,
          None => continue,
        }
      }
    };

    match modified(path) {
      Ok(Some(time)) if time > output_time => return Staleness::NewerPrerequisite(path.to_path_buf()),
      Ok(Some(_)) => {}
      Ok(None) => return Staleness::MissingPrerequisite(path.to_path_buf()),
      Err(_) => return Staleness::UnreadableTimestamp(path.to_path_buf()),
    }
  }

  Staleness::UpToDate
}

/// Modification time, `None` when the file does not exist.
fn modified(path: &Path) -> io::Result<Option<SystemTime>> {
  match std::fs::metadata(path) {
    Ok(metadata) => metadata.modified().map(Some),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(e),
  }
}
