//! CLI module for eavsearch
//!
//! Provides one-shot commands over a JSON dataset:
//! - search: Page of matching entities
//! - count: Number of matching entities
//! - matches: Single-entity membership test
//! - explain: Query text and parameters, without executing

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command, KindArg, Target};
pub use commands::{handle, load_dataset, run, run_command, Operation, Request};
pub use config::SearchConfig;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_request, read_request, write_error, write_response};
