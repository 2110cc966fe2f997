//! eavsearch CLI entry point
//!
//! Parses arguments and hands off to `cli::run`, which loads the config and
//! dataset, reads one request from stdin and writes one response to stdout.
//! A failure is printed to stderr and the process exits non-zero.

use eavsearch::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
