use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use upinfo::Scope;

/// Report repository advisories against the installed package set
#[derive(Parser)]
#[command(name = "upinfo", version)]
pub struct Cli {
    /// Path to a resolved-metadata snapshot (JSON)
    #[arg(short, long)]
    pub snapshot: PathBuf,

    /// Which correlation to report
    #[arg(long, value_enum, default_value = "available")]
    pub scope: ScopeArg,

    /// Restrict correlation to installed packages matching this name glob
    #[arg(long, value_name = "GLOB")]
    pub package: Option<String>,

    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Per-type counts of matching advisories (the default)
    Summary {
        /// Advisory id glob patterns
        patterns: Vec<String>,
    },
    /// One line per advisory and corrective package
    List {
        /// Advisory id glob patterns
        patterns: Vec<String>,
    },
    /// Detail block per advisory and corrective package
    Info {
        /// Advisory id glob patterns
        patterns: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Available,
    Installed,
    All,
}

impl From<ScopeArg> for Scope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Available => Scope::Available,
            ScopeArg::Installed => Scope::Installed,
            ScopeArg::All => Scope::All,
        }
    }
}
