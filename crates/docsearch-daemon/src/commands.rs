//! Command implementations for the docsearch binary.
//!
//! Handles:
//! - serve: open the index and serve it over HTTP
//! - index: register type definitions and bulk load JSON lines documents
//! - search: run a match query locally and print the hit records

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tokio::signal;
use tracing::{debug, info};

use docsearch_index::{
    execute, resolve_type_name, DocumentSearcher, IndexConfig, IndexRegistrar,
};
use docsearch_service::run_server_with_shutdown;
use docsearch_types::{Settings, TypeDefinitions};

/// One line of a bulk load input file.
#[derive(Debug, Clone, Deserialize)]
pub struct IndexRecord {
    /// Document id; generated when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Registered document type
    #[serde(rename = "type")]
    pub doc_type: String,
    pub document: Value,
}

/// Load settings and apply the CLI overrides.
pub fn load_settings(
    config_path: Option<&str>,
    log_level_override: Option<&str>,
    index_path_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;

    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    if let Some(index_path) = index_path_override {
        settings.index_path = index_path.to_string();
    }

    Ok(settings)
}

/// Initialize logging from RUST_LOG, falling back to the configured level.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
    }
}

/// Serve the configured index over HTTP until interrupted.
pub async fn serve(
    config_path: Option<&str>,
    port_override: Option<u16>,
    index_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<()> {
    let mut settings = load_settings(config_path, log_level_override, index_path_override)?;
    if let Some(port) = port_override {
        settings.http_port = port;
    }
    init_logging(&settings)?;

    info!("docsearch starting...");
    info!("Configuration:");
    info!("  Index path: {}", settings.index_path);
    info!("  HTTP address: {}", settings.http_addr());
    info!("  Log level: {}", settings.log_level);

    let index_path = settings.expanded_index_path();
    let searcher = DocumentSearcher::open(&index_path)
        .with_context(|| format!("Failed to open index at {}", index_path.display()))?;

    let addr: SocketAddr = settings
        .http_addr()
        .parse()
        .context("Invalid HTTP address")?;

    run_server_with_shutdown(
        addr,
        Arc::new(searcher),
        settings.search_limit,
        shutdown_signal(),
    )
    .await
    .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

    info!("docsearch stopped");
    Ok(())
}

/// Parse one input line; blank lines yield None.
pub fn parse_record(line: &str) -> Result<Option<IndexRecord>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let record = serde_json::from_str(line).context("Invalid index record")?;
    Ok(Some(record))
}

/// Register every definition, then write every record of `input`.
///
/// Returns the number of documents written. The registrar is closed, so the
/// index is finalized on success.
pub fn build_index(
    config: IndexConfig,
    definitions: &TypeDefinitions,
    input: impl BufRead,
) -> Result<u64> {
    let mut registrar = IndexRegistrar::new(config);

    for descriptor in &definitions.types {
        let doc_type = resolve_type_name(descriptor);
        registrar
            .register_descriptor(descriptor)
            .with_context(|| format!("Failed to register type {}", doc_type))?;
    }
    if registrar.doc_types().is_empty() {
        bail!("No type definitions found");
    }

    for (number, line) in input.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        let Some(record) =
            parse_record(&line).with_context(|| format!("Line {}", number + 1))?
        else {
            continue;
        };

        let id = record
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| ulid::Ulid::new().to_string());
        registrar
            .write_value(&id, &record.doc_type, &record.document)
            .with_context(|| format!("Line {}", number + 1))?;
        debug!(line = number + 1, id = %id, "Loaded record");
    }

    let count = registrar.close().context("Failed to finalize index")?;
    Ok(count)
}

/// Build an index from a type definitions file and a JSON lines file.
pub fn index(
    config_path: Option<&str>,
    types_path: &str,
    input_path: &str,
    index_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config_path, log_level_override, index_path_override)?;
    init_logging(&settings)?;

    let definitions = TypeDefinitions::load(Path::new(types_path))
        .with_context(|| format!("Failed to load type definitions from {}", types_path))?;
    let input = File::open(input_path)
        .with_context(|| format!("Failed to open input file {}", input_path))?;

    let index_path = settings.expanded_index_path();
    let config = IndexConfig::new(&index_path)
        .with_memory_mb(settings.writer_memory_mb)
        .with_default_language(&settings.default_language);

    let count = build_index(config, &definitions, BufReader::new(input))?;
    println!("Indexed {} documents into {}", count, index_path.display());
    Ok(())
}

/// Split a comma-separated field list; empty input selects everything.
pub fn parse_field_list(fields: Option<&str>) -> Option<Vec<String>> {
    let fields: Vec<String> = fields?
        .split(',')
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect();
    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

/// Run a query against the local index and print the hits as JSON.
pub fn search(
    config_path: Option<&str>,
    query: &str,
    fields: Option<&str>,
    limit: Option<usize>,
    index_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<()> {
    let settings = load_settings(config_path, log_level_override, index_path_override)?;
    init_logging(&settings)?;

    let index_path = settings.expanded_index_path();
    let searcher = DocumentSearcher::open(&index_path)
        .with_context(|| format!("Failed to open index at {}", index_path.display()))?;

    let results = execute(
        &searcher,
        query,
        parse_field_list(fields),
        limit.unwrap_or(settings.search_limit),
    )
    .context("Search failed")?;

    println!("{}", serde_json::to_string_pretty(&results.hits)?);
    info!(total = results.total, took = ?results.took, "Search finished");
    Ok(())
}
