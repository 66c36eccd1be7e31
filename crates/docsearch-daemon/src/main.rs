//! docsearch
//!
//! Build full-text indexes from typed documents and search them.
//!
//! # Usage
//!
//! ```bash
//! docsearch index --types types.toml --input docs.jsonl [--index-path PATH]
//! docsearch search "query" [--fields title,metadata.author] [--limit N]
//! docsearch serve [--port PORT] [--index-path PATH]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/docsearch/config.toml)
//! 3. Environment variables (DOCSEARCH_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use docsearch_daemon::{index, search, serve, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, index_path } => {
            serve(
                cli.config.as_deref(),
                port,
                index_path.as_deref(),
                cli.log_level.as_deref(),
            )
            .await?;
        }
        Commands::Index {
            types,
            input,
            index_path,
        } => {
            index(
                cli.config.as_deref(),
                &types,
                &input,
                index_path.as_deref(),
                cli.log_level.as_deref(),
            )?;
        }
        Commands::Search {
            query,
            fields,
            limit,
            index_path,
        } => {
            search(
                cli.config.as_deref(),
                &query,
                fields.as_deref(),
                limit,
                index_path.as_deref(),
                cli.log_level.as_deref(),
            )?;
        }
    }

    Ok(())
}
