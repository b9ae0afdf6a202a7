//! Data file scaffolding.
//!
//! `init-data` writes an empty JSON object to the configured data file so a
//! fresh checkout can compile before real data exists. An existing file is
//! never touched.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Content written to a fresh data file.
pub const EMPTY_DATA: &str = "{}\n";

#[derive(Debug, Error)]
pub enum InitError {
  #[error("failed to create directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: io::Error },

  #[error("failed to write file {}: {source}", path.display())]
  WriteFile { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InitDataOutcome {
  Created,
  AlreadyExists,
}

/// Create `path` containing an empty object unless it already exists.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the file
/// cannot be written.
pub fn init_data(path: &Path) -> Result<InitDataOutcome, InitError> {
  if path.exists() {
    debug!(path = %path.display(), "data file already present");
    return Ok(InitDataOutcome::AlreadyExists);
  }

  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    fs::create_dir_all(parent).map_err(|source| InitError::CreateDir {
      path: parent.to_path_buf(),
      source,
    })?;
  }

  // create_new so a file appearing between the check and the write is kept
  let mut file = match fs::File::options().write(true).create_new(true).open(path) {
    Ok(file) => file,
    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(InitDataOutcome::AlreadyExists),
    Err(source) => {
      return Err(InitError::WriteFile {
        path: path.to_path_buf(),
        source,
      });
    }
  };

  file.write_all(EMPTY_DATA.as_bytes()).map_err(|source| InitError::WriteFile {
    path: path.to_path_buf(),
    source,
  })?;

  info!(path = %path.display(), "created data file");
  Ok(InitDataOutcome::Created)
}
