//! CLI argument parsing for the docsearch binary.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand};

/// docsearch
///
/// Build full-text indexes from typed documents and search them.
#[derive(Parser, Debug)]
#[command(name = "docsearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/docsearch/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve an index over HTTP
    Serve {
        /// Override HTTP port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override index path
        #[arg(long)]
        index_path: Option<String>,
    },

    /// Build an index from JSON lines documents
    Index {
        /// Type definitions file (TOML or JSON)
        #[arg(short, long)]
        types: String,

        /// JSON lines input, one {"id", "type", "document"} record per line
        #[arg(short, long)]
        input: String,

        /// Override index path
        #[arg(long)]
        index_path: Option<String>,
    },

    /// Search an index locally
    Search {
        /// Query text
        query: String,

        /// Comma-separated field paths to search and return
        #[arg(short, long)]
        fields: Option<String>,

        /// Maximum results (default from config)
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Override index path
        #[arg(long)]
        index_path: Option<String>,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_serve() {
        let cli = Cli::parse_from(["docsearch", "serve"]);
        match cli.command {
            Commands::Serve { port, index_path } => {
                assert_eq!(port, None);
                assert_eq!(index_path, None);
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_serve_with_port() {
        let cli = Cli::parse_from(["docsearch", "serve", "-p", "9999"]);
        match cli.command {
            Commands::Serve { port, .. } => assert_eq!(port, Some(9999)),
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["docsearch", "--config", "/path/to/config.toml", "serve"]);
        assert_eq!(cli.config, Some("/path/to/config.toml".to_string()));
    }

    #[test]
    fn test_cli_with_log_level() {
        let cli = Cli::parse_from(["docsearch", "serve", "--log-level", "debug"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_index() {
        let cli = Cli::parse_from([
            "docsearch",
            "index",
            "--types",
            "types.toml",
            "--input",
            "docs.jsonl",
            "--index-path",
            "/tmp/idx",
        ]);
        match cli.command {
            Commands::Index {
                types,
                input,
                index_path,
            } => {
                assert_eq!(types, "types.toml");
                assert_eq!(input, "docs.jsonl");
                assert_eq!(index_path, Some("/tmp/idx".to_string()));
            }
            _ => panic!("Expected Index command"),
        }
    }

    #[test]
    fn test_cli_index_requires_types() {
        let result = Cli::try_parse_from(["docsearch", "index", "--input", "docs.jsonl"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_search() {
        let cli = Cli::parse_from([
            "docsearch",
            "search",
            "ping pong",
            "--fields",
            "title,metadata.author",
            "-n",
            "5",
        ]);
        match cli.command {
            Commands::Search {
                query,
                fields,
                limit,
                index_path,
            } => {
                assert_eq!(query, "ping pong");
                assert_eq!(fields, Some("title,metadata.author".to_string()));
                assert_eq!(limit, Some(5));
                assert_eq!(index_path, None);
            }
            _ => panic!("Expected Search command"),
        }
    }
}
