//! `kg`: retrieve graph evidence for a question, serve the HTTP API, or manage the cache.

use clap::{Parser, Subcommand, ValueEnum};
use kg_api::{render, server};
use kg_cache::CacheConfig;
use kg_extract::HeuristicExtractor;
use kg_graph::GraphConfig;
use kg_retrieval::{
    validate_params, ParamInput, RetrievalError, RetrievalRequest, Retriever, StrategyKind,
};
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "kg")]
#[command(version, about = "Multi-strategy knowledge-graph retrieval", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// JSON graph snapshot to load instead of connecting to GRAPH_URI
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Cache directory (file backend)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Retrieve evidence for a question
    Retrieve(RetrieveArgs),

    /// Serve the HTTP API
    Serve {
        /// Listen address (default: KG_LISTEN or 0.0.0.0:8002)
        #[arg(long)]
        listen: Option<SocketAddr>,
    },

    /// Inspect or clear the result cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(clap::Args)]
struct RetrieveArgs {
    /// The question to answer
    query: String,

    /// entity | relationship | hybrid | pathrag
    #[arg(short, long, default_value = "hybrid")]
    strategy: String,

    #[arg(long, allow_negative_numbers = true)]
    max_results: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    max_communities: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    max_path_length: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    max_paths_per_entity: Option<i64>,

    /// Hybrid only: skip the path+community strategy
    #[arg(long)]
    no_communities: bool,

    /// Neither read nor write the cache
    #[arg(long)]
    no_cache: bool,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    output: OutputFormat,

    /// Write the result here instead of stdout
    #[arg(long)]
    output_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show hit/miss counters and stored entry count
    Stats,
    /// Remove every cached entry
    Clear,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    #[default]
    Json,
    Text,
}

/// 2: bad input, 3: graph unreachable, 1: anything else.
fn exit_code(err: &(dyn Error + 'static)) -> u8 {
    match err.downcast_ref::<RetrievalError>() {
        Some(RetrievalError::InvalidParameter(_)) => 2,
        Some(RetrievalError::GraphUnavailable(_)) => 3,
        None => 1,
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn cache_config(cli: &Cli) -> CacheConfig {
    let mut config = CacheConfig::from_env();
    if let Some(ref dir) = cli.cache_dir {
        config.dir = dir.clone();
    }
    config
}

async fn build_retriever(cli: &Cli) -> Result<Retriever, BoxError> {
    let mut graph_config = GraphConfig::from_env();
    if let Some(ref path) = cli.snapshot {
        graph_config.snapshot = Some(path.clone());
    }
    let graph = graph_config
        .connect()
        .await
        .map_err(RetrievalError::from)?;
    let cache = cache_config(cli).build();
    Ok(Retriever::new(graph, Arc::new(HeuristicExtractor::new())).with_cache(Arc::new(cache)))
}

async fn retrieve(cli: &Cli, args: &RetrieveArgs) -> Result<(), BoxError> {
    let request = RetrievalRequest::new(args.query.clone())
        .strategy(args.strategy.clone())
        .params(ParamInput {
            max_results: args.max_results,
            max_path_length: args.max_path_length,
            max_communities: args.max_communities,
            max_paths_per_entity: args.max_paths_per_entity,
            include_communities: args.no_communities.then_some(false),
        })
        .no_cache(args.no_cache);
    // Reject bad input before touching the graph.
    StrategyKind::from_name(&args.strategy)?;
    validate_params(&request.params)?;
    if args.query.trim().is_empty() {
        return Err(RetrievalError::InvalidParameter("query must not be blank".to_string()).into());
    }

    let retriever = build_retriever(cli).await?;
    let result = retriever.retrieve(&request).await?;
    let rendered = match args.output {
        OutputFormat::Json => serde_json::to_string_pretty(&result)?,
        OutputFormat::Text => render::render_text(&result),
    };
    match args.output_file {
        Some(ref path) => {
            tokio::fs::write(path, rendered.as_bytes()).await?;
            tracing::info!(path = %path.display(), "result written");
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

async fn serve(cli: &Cli, listen: Option<SocketAddr>) -> Result<(), BoxError> {
    let retriever = build_retriever(cli).await?;
    let state = Arc::new(server::AppState {
        retriever: Arc::new(retriever),
    });
    let app = server::router(state);
    let addr: SocketAddr = match listen {
        Some(addr) => addr,
        None => std::env::var("KG_LISTEN")
            .unwrap_or_else(|_| "0.0.0.0:8002".to_string())
            .parse()?,
    };
    tracing::info!("kg API listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(addr).await?,
        app.into_make_service(),
    )
    .await?;
    Ok(())
}

async fn cache_command(cli: &Cli, command: &CacheCommands) -> Result<(), BoxError> {
    let cache = cache_config(cli).build();
    match command {
        CacheCommands::Stats => {
            let stats = cache.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        CacheCommands::Clear => {
            let removed = cache.clear().await?;
            println!("removed {} cached entries", removed);
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), BoxError> {
    match cli.command {
        Commands::Retrieve(ref args) => retrieve(&cli, args).await,
        Commands::Serve { listen } => serve(&cli, listen).await,
        Commands::Cache { ref command } => cache_command(&cli, command).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(match cli.command {
        Commands::Serve { .. } => "info",
        _ => "warn",
    });
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(exit_code(e.as_ref()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn retrieve_flags_parse() {
        let cli = Cli::try_parse_from([
            "kg",
            "retrieve",
            "Who is Gandalf?",
            "--strategy",
            "entity",
            "--max-results",
            "-1",
            "--output",
            "text",
            "--no-cache",
        ])
        .unwrap();
        let Commands::Retrieve(args) = cli.command else {
            panic!("expected retrieve");
        };
        assert_eq!(args.strategy, "entity");
        assert_eq!(args.max_results, Some(-1));
        assert!(args.no_cache);
        assert!(!args.no_communities);
        assert!(matches!(args.output, OutputFormat::Text));
    }

    #[tokio::test]
    async fn invalid_params_fail_before_graph_access() {
        let cli = Cli::try_parse_from([
            "kg",
            "--snapshot",
            "/definitely/missing.json",
            "retrieve",
            "Who is Gandalf?",
            "--max-path-length",
            "0",
        ])
        .unwrap();
        let err = run(cli).await.unwrap_err();
        assert_eq!(exit_code(err.as_ref()), 2);
    }

    #[tokio::test]
    async fn missing_graph_is_exit_code_three() {
        let cli = Cli::try_parse_from([
            "kg",
            "--snapshot",
            "/definitely/missing.json",
            "retrieve",
            "Who is Gandalf?",
        ])
        .unwrap();
        let err = run(cli).await.unwrap_err();
        assert_eq!(exit_code(err.as_ref()), 3);
    }
}
