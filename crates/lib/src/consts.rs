pub const APP_NAME: &str = "micropub";

/// Extension of template documents discovered in the working directory.
pub const TEMPLATE_EXTENSION: &str = "smd";
pub const DEFAULT_DATA_FILE: &str = "data.json";
pub const DEFAULT_BUILD_DIR: &str = "build";

/// External document-processing CLI driven by the pipeline.
pub const TOOL_NAME: &str = "stencila";
pub const TOOL_INSTALL_SCRIPT: &str = "curl -LsSf https://raw.githubusercontent.com/stencila/stencila/main/install.sh | bash";

/// Interpreters probed on `PATH` when none is configured, in order.
pub const INTERPRETER_CANDIDATES: &[&str] = &["python3", "python"];

pub const ENV_DIR: &str = "venv";
pub const ENV_MARKER: &str = ".micropub-ready";

/// Packages installed into the isolated environment.
pub const REQUIRED_PACKAGES: &[&str] = &["pandas", "matplotlib"];

pub const DNF_JSON: &str = "DNF.json";
pub const DNF_EVAL_JSON: &str = "DNF_eval.json";
pub const HTML_OUTPUT: &str = "micropublication.html";

pub const ENV_TEMPLATE: &str = "MICROPUB_TEMPLATE";
pub const ENV_DATA: &str = "MICROPUB_DATA";
pub const ENV_BUILD_DIR: &str = "MICROPUB_BUILD_DIR";
pub const ENV_STENCILA: &str = "MICROPUB_STENCILA";
pub const ENV_PYTHON: &str = "MICROPUB_PYTHON";
