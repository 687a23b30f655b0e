use starnode_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // Log to the state dir; stderr if that is not writable (e.g. read-only home).
    if let Err(err) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable: {:#}", err);
    }

    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("starnode error: {:#}", err);
        std::process::exit(1);
    }
}
