use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the Weblate project slug
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Override the Weblate component slug
    #[arg(long, global = true)]
    pub component: Option<String>,

    /// Override the target language code
    #[arg(long, global = true)]
    pub language: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Page through untranslated units with suggestions and validation
    Session,

    /// Fetch the project catalogue and print translation statistics
    Catalogue,

    /// Embed the project catalogue into the vector store
    Index {
        /// Re-embed every string, ignoring stored vectors
        #[arg(long)]
        force: bool,

        /// Only print the cost estimate
        #[arg(long)]
        dry_run: bool,
    },

    /// Find the stored strings most similar to a query
    Search {
        /// Text to look up
        query: String,

        /// Number of results
        #[arg(short = 'k', long, default_value = "5")]
        top_k: usize,
    },

    /// Write a configuration file with default values
    InitConfig {
        /// Destination file
        #[arg(short, long, default_value = "weblate-assist.toml")]
        output: PathBuf,
    },
}
