//! Discovery of the template, the external tool and the interpreter.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::TEMPLATE_EXTENSION;

/// Outcome of probing for an executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolLookup {
  pub found: Option<PathBuf>,
  /// Well-known directories that were probed after the search path.
  pub searched: Vec<PathBuf>,
}

/// Directories checked after the search path, in order.
pub fn well_known_dirs(home: Option<&Path>) -> Vec<PathBuf> {
  let mut dirs = Vec::new();
  if let Some(home) = home {
    dirs.push(home.join(".local").join("bin"));
    dirs.push(home.join(".cargo").join("bin"));
  }
  dirs.push(PathBuf::from("/usr/local/bin"));
  dirs.push(PathBuf::from("/opt/homebrew/bin"));
  dirs
}

/// Find `name` on the search path, then in `fallback_dirs`. First hit wins.
pub fn find_executable(name: &str, search_path: Option<&OsStr>, cwd: &Path, fallback_dirs: &[PathBuf]) -> ToolLookup {
  if let Ok(path) = which::which_in(name, search_path, cwd) {
    debug!(tool = name, path = %path.display(), "found on search path");
    return ToolLookup {
      found: Some(path),
      searched: Vec::new(),
    };
  }

  let mut searched = Vec::new();
  for dir in fallback_dirs {
    searched.push(dir.clone());
    let candidate = dir.join(executable_name(name));
    if is_executable(&candidate) {
      debug!(tool = name, path = %candidate.display(), "found in well-known directory");
      return ToolLookup {
        found: Some(candidate),
        searched,
      };
    }
  }

  debug!(tool = name, "not found");
  ToolLookup { found: None, searched }
}

/// First `*.smd` file in `dir`, by file name.
pub fn discover_template(dir: &Path) -> Option<PathBuf> {
  let entries = fs::read_dir(dir).ok()?;

  let mut candidates: Vec<PathBuf> = entries
    .filter_map(|e| e.ok())
    .map(|e| e.path())
    .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == TEMPLATE_EXTENSION))
    .collect();
  candidates.sort();

  candidates.into_iter().next()
}

#[cfg(windows)]
fn executable_name(name: &str) -> String {
  format!("{}.exe", name)
}

#[cfg(not(windows))]
fn executable_name(name: &str) -> String {
  name.to_string()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
  use std::os::unix::fs::PermissionsExt;

  fs::metadata(path)
    .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
    .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
  path.is_file()
}
