//! CLI argument definitions using clap
//!
//! Commands:
//! - eavsearch search --config <path> --kind <principal|group>
//! - eavsearch count --config <path> --kind <principal|group>
//! - eavsearch matches --config <path> --kind <principal|group>
//! - eavsearch explain --config <path> --kind <principal|group>

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::entity::KindTag;

/// eavsearch - search conditions over an entity-attribute-value identity store
#[derive(Parser, Debug)]
#[command(name = "eavsearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Return one page of matching entities
    Search(Target),

    /// Count matching entities
    Count(Target),

    /// Test whether one entity matches
    Matches(Target),

    /// Show the query a search would run
    Explain(Target),
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Path to configuration file
    #[arg(long, default_value = "./eavsearch.json")]
    pub config: PathBuf,

    /// Entity kind to search
    #[arg(long, value_enum, default_value_t = KindArg::Principal)]
    pub kind: KindArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindArg {
    Principal,
    Group,
}

impl From<KindArg> for KindTag {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Principal => KindTag::Principal,
            KindArg::Group => KindTag::Group,
        }
    }
}

impl Command {
    pub fn target(&self) -> &Target {
        match self {
            Command::Search(t) | Command::Count(t) | Command::Matches(t) | Command::Explain(t) => t,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
