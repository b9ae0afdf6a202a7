//! Removal of the build directory.

use std::path::{Path, PathBuf};
use std::{fs, io};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum CleanError {
  #[error("failed to delete {}: {source}", path.display())]
  Delete {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("refusing to delete {}: it contains the working directory", path.display())]
  ContainsWorkdir { path: PathBuf },
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanStats {
  pub files_removed: usize,
  pub bytes_freed: u64,
}

impl CleanStats {
  pub fn is_empty(&self) -> bool {
    self.files_removed == 0
  }
}

fn measure(path: &Path) -> CleanStats {
  WalkDir::new(path)
    .into_iter()
    .filter_map(|e| e.ok())
    .filter(|e| e.file_type().is_file())
    .filter_map(|e| e.metadata().ok())
    .fold(CleanStats::default(), |mut stats, m| {
      stats.files_removed += 1;
      stats.bytes_freed += m.len();
      stats
    })
}

/// Remove `build_dir` and everything beneath it.
///
/// A missing directory is not an error; the returned stats are then empty.
/// A build directory that is `workdir` or one of its ancestors is never
/// deleted.
pub fn clean(build_dir: &Path, workdir: &Path) -> Result<CleanStats, CleanError> {
  if !build_dir.exists() {
    debug!(path = %build_dir.display(), "nothing to clean");
    return Ok(CleanStats::default());
  }

  let canonical = dunce::canonicalize(build_dir).unwrap_or_else(|_| build_dir.to_path_buf());
  let workdir = dunce::canonicalize(workdir).unwrap_or_else(|_| workdir.to_path_buf());
  if workdir.starts_with(&canonical) {
    return Err(CleanError::ContainsWorkdir {
      path: build_dir.to_path_buf(),
    });
  }

  let stats = measure(build_dir);

  let removed = if build_dir.is_dir() {
    fs::remove_dir_all(build_dir)
  } else {
    fs::remove_file(build_dir)
  };

  match removed {
    Ok(()) => {}
    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
    Err(source) => {
      return Err(CleanError::Delete {
        path: build_dir.to_path_buf(),
        source,
      });
    }
  }

  info!(
    path = %build_dir.display(),
    files = stats.files_removed,
    bytes_freed = stats.bytes_freed,
    "removed build directory"
  );
  Ok(stats)
}
