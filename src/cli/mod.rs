// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Command-line interface: argument parsing, terminal output and the `run` command.

/// CLI arguments.
pub mod args;

/// Terminal output macros.
pub mod logging;

/// The `run` command.
pub mod run;
