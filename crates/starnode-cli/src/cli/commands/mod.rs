//! CLI command handlers, one file per command.

mod checksum;
mod completions;
mod control;
mod install;
mod verify;

pub use checksum::run_checksum;
pub use completions::run_completions;
pub use control::run_control;
pub use install::run_install;
pub use verify::run_verify;
