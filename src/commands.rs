//! Command bodies for the CLI surface.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::CaselawError;
use crate::config::{Config, get_config_dir};
use crate::corpus::load_corpus;
use crate::embeddings::ollama::OllamaClient;
use crate::index::builder::IndexBuilder;
use crate::index::store;
use crate::mcp::server::McpServer;
use crate::mcp::tools::SearchCasesHandler;
use crate::retrieval::{RetrievalService, format_response};

fn load_app_config() -> Result<Config> {
    let config_dir = get_config_dir().context("Failed to resolve config directory")?;
    Config::load(&config_dir)
}

/// Build the vector index and metadata pair from a dataset directory.
#[inline]
pub fn build_index(dataset_dir: &Path) -> Result<()> {
    let config = load_app_config()?;

    println!("Scanning dataset: {}", dataset_dir.display());
    let load = load_corpus(dataset_dir)?;
    println!(
        "Scanned {} files: {} accepted, {} skipped",
        load.files_scanned,
        load.entries.len(),
        load.files_skipped
    );

    if load.entries.is_empty() {
        println!(
            "{}",
            style("Index build halted: no documents were found to process.").yellow()
        );
        return Ok(());
    }

    let client = OllamaClient::new(&config.embedding)
        .context("Failed to initialize embedding client")?;

    let bar = ProgressBar::new(load.entries.len() as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} documents embedded",
        )
        .context("Failed to build progress bar template")?,
    );
    let bar_for_hook = bar.clone();

    let builder = IndexBuilder::new(
        &client,
        config.embedding.batch_size,
        config.embedding.pacing_delay(),
    )
    .with_progress(Box::new(move |done, _total| {
        bar_for_hook.set_position(done as u64);
    }));

    let (index, metadata) = builder.build(&load.entries)?;
    bar.finish();

    let index_path = config.index_file_path();
    let metadata_path = config.metadata_file_path();
    store::save_pair(&index, &metadata, &index_path, &metadata_path)?;

    println!(
        "{}",
        style(format!(
            "Indexed {} cases (dimension {}) into {}",
            index.len(),
            index.dimension(),
            index_path
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .display()
        ))
        .green()
    );
    Ok(())
}

/// One-shot search against the persisted index.
#[inline]
pub fn run_search(query: &str, k: Option<usize>) -> Result<()> {
    let config = load_app_config()?;
    let client = OllamaClient::new(&config.embedding)
        .context("Failed to initialize embedding client")?;

    let mut service = RetrievalService::new(client, config.search.default_k);
    if let Err(e) =
        service.load_artifacts(&config.index_file_path(), &config.metadata_file_path())
    {
        warn!("Search will report unavailable: {e}");
    }

    let k = k.unwrap_or_else(|| service.default_k());
    let outcome = service.search(query, k);
    println!("{}", format_response(&outcome));
    Ok(())
}

/// Start the MCP stdio server.
///
/// The server starts even when the index artifacts are missing or corrupt;
/// every search then returns the unavailable response until a rebuild.
#[inline]
pub async fn serve_mcp() -> Result<()> {
    let config = load_app_config()?;
    let client = OllamaClient::new(&config.embedding)
        .context("Failed to initialize embedding client")?;

    let mut service = RetrievalService::new(client, config.search.default_k);
    if let Err(e) =
        service.load_artifacts(&config.index_file_path(), &config.metadata_file_path())
    {
        warn!("Serving without a loaded index: {e}");
    }
    let service = Arc::new(service);

    let mut server = McpServer::new(
        env!("CARGO_PKG_NAME").to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    server.register_tool(
        SearchCasesHandler::<OllamaClient>::tool_definition(),
        SearchCasesHandler::new(Arc::clone(&service)),
    );

    info!("MCP server configured with search_cases tool");
    Arc::new(server).serve_stdio().await
}

/// Report artifact and embedding-server status.
#[inline]
pub fn show_status() -> Result<()> {
    let config = load_app_config()?;
    let index_path = config.index_file_path();
    let metadata_path = config.metadata_file_path();

    println!("{}", style("Caselaw MCP Status").bold().cyan());
    println!();

    match store::load_pair(&index_path, &metadata_path) {
        Ok((index, metadata)) => {
            println!("Index: {}", style("ready").green());
            println!("  Cases indexed: {}", index.len());
            println!("  Vector dimension: {}", index.dimension());
            println!("  Metadata records: {}", metadata.len());
        }
        Err(CaselawError::IndexNotFound(dir)) => {
            println!("Index: {}", style("not built").yellow());
            println!("  No artifacts in {dir}. Run the `build` command first.");
        }
        Err(e) => {
            println!("Index: {}", style("unusable").red());
            println!("  {e}");
        }
    }

    println!();
    let client = OllamaClient::new(&config.embedding)
        .context("Failed to initialize embedding client")?;
    match client.ping() {
        Ok(()) => println!("Embedding server: {}", style("reachable").green()),
        Err(e) => {
            println!("Embedding server: {}", style("unreachable").red());
            println!("  {e:#}");
        }
    }

    println!();
    println!("Model: {}", config.embedding.model);
    println!("Default k: {}", config.search.default_k);
    println!("Artifacts: {}", index_path.display());
    println!("           {}", metadata_path.display());
    Ok(())
}
