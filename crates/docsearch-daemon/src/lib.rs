//! docsearch binary library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (serve, index, search)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    build_index, index, init_logging, load_settings, parse_field_list, parse_record, search, serve,
    IndexRecord,
};
