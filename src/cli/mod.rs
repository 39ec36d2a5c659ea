use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod errors;
mod handlers;
mod report;
mod types;
mod validation;

pub use handlers::*;
pub use types::*;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory containing the note files (overrides config)
    #[clap(long, global = true, env = "NOTEGRAPH_CONTENT_DIR")]
    pub content_dir: Option<PathBuf>,

    /// Directory holding config.yaml, the embedding cache and model files
    #[clap(long, global = true, env = "NOTEGRAPH_BASE_PATH")]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find notes related to a note, with a score breakdown
    Related(RelatedArgs),

    /// Suggest index page updates and candidate new index pages (JSON)
    Curate(CurateArgs),
}
