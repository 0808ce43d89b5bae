//! Livefeed CLI
//!
//! A terminal viewer for the sink files written by the livefeed agent:
//! list a domain's entities, print the current window, plot one entity's
//! series, or follow a sink as it is rewritten.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{entities, show, watch};
use std::path::PathBuf;

/// Livefeed CLI
#[derive(Parser)]
#[command(name = "lfd")]
#[command(author, version, about = "Terminal viewer for livefeed sinks", long_about = None)]
pub struct Cli {
    /// Directory holding the sink files (can also be set via LIVEFEED_DATA_DIR env var)
    #[arg(long, global = true, env = "LIVEFEED_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the entities of a domain
    Entities {
        /// Domain name (locations, stocks)
        domain: String,
    },

    /// Print the current sink rows
    Show {
        /// Domain name (locations, stocks)
        domain: String,

        /// Only rows for this entity (repeatable)
        #[arg(long, short)]
        select: Vec<String>,
    },

    /// Print the time series of one entity
    Series {
        /// Domain name (locations, stocks)
        domain: String,

        /// Entity name, e.g. "Death Valley CA"
        entity: String,
    },

    /// Follow a sink and re-render when it changes
    ///
    /// Type a comma-separated list of entity names and press enter to change
    /// the selection; an empty line selects everything.
    Watch {
        /// Domain name (locations, stocks)
        domain: String,

        /// Only rows for this entity (repeatable)
        #[arg(long, short)]
        select: Vec<String>,

        /// Re-read interval when no file event arrives, in seconds
        #[arg(long, default_value = "5")]
        poll_secs: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Entities { domain } => {
            entities::list_entities(&cli.data_dir, &domain, cli.format)?;
        }
        Commands::Show { domain, select } => {
            show::show_rows(&cli.data_dir, &domain, &select, cli.format)?;
        }
        Commands::Series { domain, entity } => {
            show::show_series(&cli.data_dir, &domain, &entity, cli.format)?;
        }
        Commands::Watch {
            domain,
            select,
            poll_secs,
        } => {
            watch::watch_sink(&cli.data_dir, &domain, select, poll_secs, cli.format).await?;
        }
    }

    Ok(())
}
