//! pagealign CLI library
//!
//! This library provides the command-line interface for extracting text,
//! tokens and Web Annotations from page layout files and for re-aligning
//! external annotations with their scans.

pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod progress;

pub use error::{CliError, CliResult};

/// Initialize logging based on verbosity level
///
/// `-q` silences everything but errors.
pub fn init_logging(verbose: u8, quiet: bool) {
    let log_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };

    // a second initialization (tests) is not an error worth reporting
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .try_init();
}
