//! showtalk application binary - composition root.
//!
//! Ties the showtalk crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Open the SQLite episode catalog, optionally seeding it from JSON
//! 3. Build the LLM provider and chat orchestrator
//! 4. Start the axum HTTP server

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use showtalk_api::routes;
use showtalk_api::state::AppState;
use showtalk_core::config::ShowtalkConfig;
use showtalk_llm::EnvLlmProvider;
use showtalk_storage::{Database, EpisodeRepository, EpisodeStore};

#[derive(Parser, Debug)]
#[command(name = "showtalk", version, about = "Chat about reality-TV episodes")]
struct Cli {
    /// Path to config TOML file (default: $SHOWTALK_CONFIG or ~/.showtalk/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides $SHOWTALK_PORT and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// JSON catalog to import before serving
    #[arg(long)]
    seed: Option<PathBuf>,

    /// SQLite database file (default: <data_dir>/showtalk.db)
    #[arg(long)]
    db: Option<PathBuf>,
}

/// Resolve a data directory, expanding a leading `~/`.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if let Some(rest) = data_dir.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(rest)
    } else {
        PathBuf::from(data_dir)
    }
}

/// Resolve the config file path (SHOWTALK_CONFIG env, or ~/.showtalk/config.toml).
fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("SHOWTALK_CONFIG") {
        return PathBuf::from(p);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".showtalk").join("config.toml");
    }
    PathBuf::from("config.toml")
}

/// Port precedence: --port, then SHOWTALK_PORT, then the config file.
fn resolve_port(cli_port: Option<u16>, config_port: u16) -> u16 {
    cli_port
        .or_else(|| {
            std::env::var("SHOWTALK_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
        })
        .unwrap_or(config_port)
}

fn open_database(path: &Path) -> Result<Database, Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::error!(path = %parent.display(), error = %e, "Failed to create data directory");
            return Err(e.into());
        }
    }
    let db = Database::new(path)?;
    tracing::info!(path = %path.display(), "SQLite database opened");
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Config.
    let config_file = cli.config.clone().unwrap_or_else(config_path);
    let mut config = ShowtalkConfig::load_or_default(&config_file);
    config.general.port = resolve_port(cli.port, config.general.port);

    // Tracing. RUST_LOG wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .init();

    tracing::info!("Starting showtalk v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| resolve_data_dir(&config.general.data_dir).join("showtalk.db"));
    let db = Arc::new(open_database(&db_path)?);
    let repository = EpisodeRepository::new(db);

    if let Some(seed) = &cli.seed {
        let imported = repository.import_json(seed)?;
        tracing::info!(path = %seed.display(), episodes = imported, "Catalog imported");
    }
    match repository.count() {
        Ok(0) => tracing::warn!("Episode catalog is empty; searches will find nothing"),
        Ok(n) => tracing::info!(episodes = n, "Episode catalog ready"),
        Err(e) => tracing::warn!(error = %e, "Could not count episodes"),
    }

    // LLM. The API key is read per request, so a missing key only fails chats.
    let provider = EnvLlmProvider::new(config.llm.clone())?;
    if std::env::var(provider.key_var()).map_or(true, |v| v.trim().is_empty()) {
        tracing::warn!(
            var = provider.key_var(),
            "API key not set; chat requests will fail until it is"
        );
    }
    tracing::info!(
        base_url = %config.llm.base_url,
        model = %config.llm.model,
        strategy = ?config.chat.strategy,
        "LLM configured"
    );

    let state = AppState::from_parts(config, Arc::new(repository), Arc::new(provider));

    if let Err(e) = routes::start_server(state).await {
        tracing::error!(error = %e, "Server stopped");
        tracing::error!("Is another instance running? Try: SHOWTALK_PORT=<port> or --port");
        return Err(e.into());
    }

    Ok(())
}
