//! ragd - Session-based RAG tool server.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ragd_core::{Embedder, Generator, RagdConfig};
use ragd_embed::{ExtractiveGenerator, HashEmbedder};
use ragd_index::{Metric, VectorIndex};
use ragd_pipeline::RetrievalPipeline;
use ragd_rpc::{register_builtin_tools, spawn_session, SessionDispatcher, ToolRegistry};

/// ragd - Retrieval-Augmented Generation tool server
#[derive(Parser)]
#[command(name = "ragd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file path (default: $XDG_CONFIG_HOME/ragd/config.toml, then ./ragd.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve JSON-RPC over stdio, one request per line, SSE-framed responses
    Serve,

    /// Print the tool manifest as JSON
    Tools,

    /// Print server health as JSON
    Health,

    /// Invoke a single tool and print its result
    Call {
        /// Tool name
        name: String,

        /// Tool arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        arguments: String,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    // Logs go to stderr; stdout belongs to the transport.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<&PathBuf>) -> Result<RagdConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(RagdConfig::load(path)?),
        None => Ok(RagdConfig::load_default()?),
    }
}

struct Server {
    pipeline: Arc<RetrievalPipeline>,
    dispatcher: Arc<SessionDispatcher>,
}

fn build_server(config: &RagdConfig) -> Result<Server, Box<dyn std::error::Error>> {
    let metric: Metric = config.index.metric.parse()?;
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::with_dimension(config.index.dimension));
    let generator: Arc<dyn Generator> = Arc::new(ExtractiveGenerator::new());

    let index = Arc::new(VectorIndex::new(embedder, metric));
    let pipeline = Arc::new(RetrievalPipeline::new(index, generator, config));

    let mut registry = ToolRegistry::new();
    register_builtin_tools(&mut registry, pipeline.clone())?;

    let dispatcher = Arc::new(SessionDispatcher::new(
        Arc::new(registry),
        config.server.name.clone(),
        env!("CARGO_PKG_VERSION"),
    ));

    Ok(Server { pipeline, dispatcher })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let config = load_config(cli.config.as_ref())?;
    let server = build_server(&config)?;

    match cli.command {
        Commands::Serve => serve_stdio(server.dispatcher).await?,
        Commands::Tools => {
            let manifest = serde_json::json!({
                "tools": server.dispatcher.registry().descriptors()
            });
            println!("{}", serde_json::to_string_pretty(&manifest)?);
        }
        Commands::Health => {
            let health = server.pipeline.health().await;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        Commands::Call { name, arguments } => {
            call_tool(&server, &name, &arguments).await?;
        }
    }

    Ok(())
}

/// Line-delimited stdio transport: each stdin line is one JSON-RPC message,
/// each response is one SSE frame written verbatim to stdout.
async fn serve_stdio(
    dispatcher: Arc<SessionDispatcher>,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Serving JSON-RPC over stdio");

    let (inbound, mut outbound) = spawn_session(dispatcher);

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(frame) = outbound.recv().await {
            if stdout.write_all(&frame).await.is_err() {
                break;
            }
            if stdout.flush().await.is_err() {
                break;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        if inbound.send(line.into_bytes()).await.is_err() {
            break;
        }
    }

    // Stdin closed: drop the inbound side so the session drains and ends.
    drop(inbound);
    writer.await.ok();

    info!("Transport closed");
    Ok(())
}

async fn call_tool(
    server: &Server,
    name: &str,
    arguments: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let arguments: Value = serde_json::from_str(arguments)?;

    match server.dispatcher.registry().invoke(name, arguments).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(failure) => {
            eprintln!("Error: {}", failure.error);
            if let Some(data) = failure.data {
                eprintln!("{}", serde_json::to_string_pretty(&data)?);
            }
            std::process::exit(1);
        }
    }
}
