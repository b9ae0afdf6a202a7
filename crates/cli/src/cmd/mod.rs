mod info;
mod run;
mod targets;

pub use info::{cmd_info, print_config};
pub use run::cmd_run;
pub use targets::cmd_targets;
