use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "autovote")]
#[command(about = "Casts daily server-list votes for registered players", version)]
pub struct Cli {
    /// Config file (defaults to ~/.autovote/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Vote for every active registration (default)
    Run,

    /// Encrypt an automation token for storage; reads stdin if omitted
    Encrypt { plaintext: Option<String> },

    /// Decrypt a stored token blob; reads stdin if omitted
    Decrypt { blob: Option<String> },

    /// Validate the effective configuration and exit
    CheckConfig,
}
