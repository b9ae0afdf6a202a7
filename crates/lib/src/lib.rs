//! micropub-lib: build engine for micropublications.
//!
//! A template document and a JSON data file are compiled into a standalone
//! HTML page by driving `stencila` through a small dependency graph:
//! - `graph`: targets and their dependency order
//! - `stale`: whether a target needs to run
//! - `execute`: runs a target and everything it depends on
//! - `provision`: the isolated Python environment the document code runs in
//! - `pipeline`: the fixed target set wired to a [`context::BuildContext`]

pub mod clean;
pub mod consts;
pub mod context;
pub mod execute;
pub mod graph;
pub mod init;
pub mod pipeline;
pub mod process;
pub mod provision;
pub mod stale;
pub mod util;
