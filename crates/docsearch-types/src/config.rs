//! Configuration loading for docsearch.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/docsearch/config.toml.

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::TypesError;

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path of the finalized search index directory
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// HTTP server host
    #[serde(default = "default_http_host")]
    pub http_host: String,

    /// HTTP server port
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Analysis language for text fields of types that report none
    #[serde(default = "default_language")]
    pub default_language: String,

    /// Memory budget of the index writer in MB
    #[serde(default = "default_writer_memory_mb")]
    pub writer_memory_mb: usize,

    /// Maximum hits returned per search
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_index_path() -> String {
    ProjectDirs::from("", "", "docsearch")
        .map(|p| p.data_local_dir().join("index"))
        .unwrap_or_else(|| PathBuf::from("./index"))
        .to_string_lossy()
        .to_string()
}

fn default_http_host() -> String {
    "0.0.0.0".to_string()
}

fn default_http_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_writer_memory_mb() -> usize {
    50
}

fn default_search_limit() -> usize {
    10
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            http_host: default_http_host(),
            http_port: default_http_port(),
            log_level: default_log_level(),
            default_language: default_language(),
            writer_memory_mb: default_writer_memory_mb(),
            search_limit: default_search_limit(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/docsearch/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (DOCSEARCH_*)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, TypesError> {
        let config_dir = ProjectDirs::from("", "", "docsearch")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("index_path", default_index_path())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("http_host", default_http_host())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("http_port", default_http_port() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("default_language", default_language())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("writer_memory_mb", default_writer_memory_mb() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("search_limit", default_search_limit() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // Format: DOCSEARCH_INDEX_PATH, DOCSEARCH_HTTP_PORT, etc.
        // The prefix separator is `_` while nested keys would use `__`, so
        // snake_case keys map one to one.
        builder = builder.add_source(
            Environment::with_prefix("DOCSEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| TypesError::Config(e.to_string()))
    }

    /// Socket address string for the HTTP server
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }

    /// Expand ~ in index_path to the home directory
    pub fn expanded_index_path(&self) -> PathBuf {
        self.index_path
            .strip_prefix("~/")
            .and_then(|rest| BaseDirs::new().map(|dirs| dirs.home_dir().join(rest)))
            .unwrap_or_else(|| PathBuf::from(&self.index_path))
    }
}
