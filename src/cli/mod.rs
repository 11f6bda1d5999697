//! Command-line host shell for the note store.
mod app;

use std::path::PathBuf;

use clap::Parser;

pub use app::App;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser, Debug)]
#[clap(
    name = "memora",
    version,
    about = "Floating sticky notes, from the command line"
)]
pub struct Cli {
    /// Path to the configuration file
    #[clap(short = 'c', long, value_parser)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted notes
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the memora application
    #[clap(subcommand)]
    pub command: Commands,
}
