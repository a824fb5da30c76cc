//! Tutor CLI
//!
//! Main entry point for serving the adaptive tutor HTTP API.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use tutor_engine::{create_router, AppState, Config, ContentStore};

/// Default port for the HTTP API server.
const DEFAULT_PORT: u16 = 5000;

/// Default bind address.
const DEFAULT_HOST: &str = "0.0.0.0";

/// Adaptive Tutor - assessment and tutoring backend
///
/// Serves static learning content, sequences assessment questions
/// (generating new ones through a language model once the authored bank
/// runs out) and composes tutor replies.
#[derive(Parser, Debug)]
#[command(name = "tutor")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: tutor.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Directory holding domains.json, topics.json and questions.json
    #[arg(short, long, value_name = "DIR")]
    data_dir: Option<String>,

    /// Address to bind the HTTP API server to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port for the HTTP API server
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("Tutor starting");
    tracing::debug!(config = ?args.config, "Config file");
    tracing::debug!(data_dir = ?args.data_dir, "Data directory");

    match run_server(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Loads configuration, builds the application state and serves the API
/// until Ctrl+C.
async fn run_server(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    if let Some(ref data_dir) = args.data_dir {
        config.data_dir.clone_from(data_dir);
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);
    check_content(&config).await;

    if config.api_key().is_none() {
        tracing::warn!(
            env = %config.llm.api_key_env,
            "No API key set; question generation will fail until it is"
        );
    }

    let state = AppState::from_config(config)?;
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| {
            anyhow::anyhow!(
                "Invalid listen address '{}:{}': {e}\n\nSuggestion: Pass an IP address with --host",
                args.host,
                args.port
            )
        })?;

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!();
    println!("HTTP API server running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is received.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        return;
    }
    tracing::info!("Received Ctrl+C, shutting down");
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Logs a warning when the content documents cannot be read.
///
/// The server still starts; the affected routes answer 500 until the data
/// directory is fixed.
async fn check_content(config: &Config) {
    let store = ContentStore::new(&config.data_dir);
    match store.domains().await {
        Ok(domains) => {
            tracing::info!(count = domains.len(), "Domains available");
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                data_dir = %store.data_dir().display(),
                "Content is not readable"
            );
        }
    }
}

/// Prints the loaded configuration.
fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Data directory: {}", config.data_dir);
    println!("  LLM endpoint: {}", config.llm.api_url);
    println!("  LLM model: {}", config.llm.model);
    println!("  API key variable: {}", config.llm.api_key_env);
    match config.assessment.max_questions {
        Some(max) => println!("  Max questions: {max}"),
        None => println!("  Max questions: unlimited"),
    }
}
