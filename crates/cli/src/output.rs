//! CLI output formatting utilities.
//!
//! Status lines go to stdout, errors and hints to stderr. Colors are only
//! emitted when the stream supports them.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Severity of a status line.
#[derive(Debug, Clone, Copy)]
enum Level {
  Success,
  Error,
  Warning,
  Info,
}

impl Level {
  fn symbol(self) -> &'static str {
    match self {
      Level::Success => "✓",
      Level::Error => "✗",
      Level::Warning => "⚠",
      Level::Info => "•",
    }
  }

  fn stream(self) -> Stream {
    match self {
      Level::Success | Level::Info => Stream::Stdout,
      Level::Error | Level::Warning => Stream::Stderr,
    }
  }

  fn emit(self, message: &str) {
    let stream = self.stream();
    let symbol = self.symbol();
    let symbol = match self {
      Level::Success => symbol.if_supports_color(stream, |s| s.green()).to_string(),
      Level::Error => symbol.if_supports_color(stream, |s| s.red()).to_string(),
      Level::Warning => symbol.if_supports_color(stream, |s| s.yellow()).to_string(),
      Level::Info => symbol.if_supports_color(stream, |s| s.blue()).to_string(),
    };

    match self {
      Level::Success | Level::Info => println!("{} {}", symbol, message),
      Level::Error => eprintln!("{} {}", symbol, message.if_supports_color(stream, |s| s.red())),
      Level::Warning => eprintln!("{} {}", symbol, message.if_supports_color(stream, |s| s.yellow())),
    }
  }
}

/// Human-readable size using binary units.
pub fn format_bytes(bytes: u64) -> String {
  const UNITS: [&str; 3] = ["KB", "MB", "GB"];

  if bytes < 1024 {
    return format!("{} B", bytes);
  }

  let mut value = bytes as f64 / 1024.0;
  let mut unit = 0;
  while value >= 1024.0 && unit + 1 < UNITS.len() {
    value /= 1024.0;
    unit += 1;
  }
  format!("{:.1} {}", value, UNITS[unit])
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();

  match secs {
    0 => format!("{}ms", duration.subsec_millis()),
    1..60 => format!("{:.2}s", duration.as_secs_f64()),
    _ => format!("{}m {}s", secs / 60, secs % 60),
  }
}

pub fn print_success(message: &str) {
  Level::Success.emit(message);
}

pub fn print_error(message: &str) {
  Level::Error.emit(message);
}

pub fn print_warning(message: &str) {
  Level::Warning.emit(message);
}

pub fn print_info(message: &str) {
  Level::Info.emit(message);
}

/// Remediation line printed under an error.
pub fn print_hint(message: &str) {
  eprintln!(
    "  {} {}",
    "hint:".if_supports_color(Stream::Stderr, |s| s.cyan()),
    message
  );
}

/// An indented item in a list, such as a target that would run.
pub fn print_item(name: &str, note: &str) {
  println!(
    "  {} {} {}",
    "→".if_supports_color(Stream::Stdout, |s| s.cyan()),
    name,
    format!("({})", note).if_supports_color(Stream::Stdout, |s| s.dimmed())
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {}", label.if_supports_color(Stream::Stdout, |s| s.dimmed()), value);
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize report as JSON")?;
  println!("{}", json);
  Ok(())
}
