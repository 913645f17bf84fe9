//! Command-line front end.
//!
//! Drives one generation through the session controller, applies optional
//! node and edge-type filters with the staged propose/commit protocol and
//! returns the graph to print.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser};
use neurograph_core::{
    CoreResult, FilterMode, GenerationOutcome, GraphData, SessionController, SessionPhase, TextInput, UploadedFile,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ClientConfig;
use crate::generation::HttpGenerationClient;
use crate::http::build_client;
use crate::text_source::HttpTextSource;

/// Generate a knowledge graph from text and print it as JSON
#[derive(Debug, Clone, Parser)]
#[command(name = "neurograph", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub input: InputArgs,

    /// Keep only these node ids (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub nodes: Vec<String>,

    /// Keep only edges with these relation types (comma separated)
    #[arg(long = "edge-types", value_delimiter = ',')]
    pub edge_types: Vec<String>,

    /// Re-filter on the service instead of locally
    #[arg(long)]
    pub remote_filter: bool,

    /// Log as JSON
    #[arg(long)]
    pub json_logs: bool,
}

/// Where the text comes from; exactly one is required
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct InputArgs {
    /// Search query resolved by the service
    #[arg(long)]
    pub query: Option<String>,

    /// Text to extract the graph from
    #[arg(long)]
    pub text: Option<String>,

    /// File uploaded to the service for text extraction
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl InputArgs {
    /// Turn the arguments into a [`TextInput`], reading the file if given
    pub async fn to_text_input(&self) -> anyhow::Result<TextInput> {
        if let Some(query) = &self.query {
            return Ok(TextInput::Query(query.clone()));
        }
        if let Some(text) = &self.text {
            return Ok(TextInput::Custom(text.clone()));
        }
        if let Some(path) = &self.file {
            let content = tokio::fs::read(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            return Ok(TextInput::File(UploadedFile::new(filename, content)));
        }
        bail!("one of --query, --text or --file is required")
    }
}

/// Commit the requested node and edge-type selections.
///
/// Edge types are matched against the edges available after the node
/// selection was committed.
pub fn apply_selection(controller: &SessionController, nodes: &[String], edge_types: &[String]) -> CoreResult<()> {
    if !nodes.is_empty() {
        controller.set_node_mode(FilterMode::Custom)?;
        if let Err(err) = controller.propose_nodes(nodes.to_vec()) {
            controller.cancel_selection()?;
            return Err(err);
        }
        controller.commit_selection()?;
    }

    if !edge_types.is_empty() {
        controller.set_edge_mode(FilterMode::Custom)?;
        let edges = controller
            .available_edges()?
            .into_iter()
            .filter(|edge| edge_types.iter().any(|t| t == &edge.edge_type))
            .collect();
        controller.propose_edges(edges)?;
        controller.commit_selection()?;
    }
    Ok(())
}

/// Log progress updates until aborted
fn spawn_progress_logger(mut updates: watch::Receiver<neurograph_core::SessionSnapshot>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_percent = -1.0;
        while updates.changed().await.is_ok() {
            let (phase, progress) = {
                let snapshot = updates.borrow_and_update();
                (snapshot.phase, snapshot.progress.clone())
            };
            if phase == SessionPhase::Generating && progress.percent != last_percent {
                last_percent = progress.percent;
                info!(
                    percent = progress.percent,
                    status = %progress.status,
                    chunk = %progress.chunk_label().unwrap_or_default(),
                    "Generation progress"
                );
            }
        }
    })
}

/// Run one generation and return the graph to print
pub async fn run(cli: &Cli, config: ClientConfig) -> anyhow::Result<GraphData> {
    let input = cli.input.to_text_input().await?;

    config.validate()?;
    let http = build_client(&config)?;
    let service = Arc::new(HttpGenerationClient::with_client(config.clone(), http.clone()));
    let text_source = Arc::new(HttpTextSource::with_client(config, http));
    let controller = SessionController::new(text_source, service);

    let logger = spawn_progress_logger(controller.subscribe());
    let outcome = controller.generate(input).await;
    logger.abort();

    match outcome.context("Could not start graph generation")? {
        GenerationOutcome::Ready => {}
        GenerationOutcome::Failed(failure) => bail!("Graph generation failed: {}", failure.message),
        GenerationOutcome::Superseded => bail!("Graph generation was superseded"),
    }

    apply_selection(&controller, &cli.nodes, &cli.edge_types).context("Invalid selection")?;

    if cli.remote_filter {
        let filtered = controller
            .snapshot()
            .view
            .as_ref()
            .is_some_and(|view| view.filters().is_filtered());
        if filtered {
            return controller
                .refilter_remote()
                .await
                .context("Server-side filtering failed");
        }
        info!("No custom selection, skipping server-side filtering");
    }

    controller
        .visible_graph()
        .context("No graph available after generation")
}
