use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod catalog;
use catalog::ContentCatalog;

mod config;
use config::{AppConfig, CliConfig};

mod server;
use server::{run_server, RequestsLoggingLevel, ServerConfig};

mod spotify;
use spotify::SpotifyClient;

mod sqlite_persistence;

mod user;
use user::SqliteUserStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the data directory holding the user database and the
    /// yoga and meditation catalog files.
    #[clap(value_parser = parse_path)]
    pub data_dir: PathBuf,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Path to the frontend directory to be statically served.
    #[clap(long)]
    pub frontend_dir_path: Option<String>,

    /// Production mode, session cookies become cross-origin and secure.
    #[clap(long, default_value_t = false)]
    pub production: bool,

    /// Base URL of the Spotify accounts host.
    #[clap(long)]
    pub spotify_accounts_url: Option<String>,

    /// Base URL of the Spotify web API host.
    #[clap(long)]
    pub spotify_api_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let config = AppConfig::resolve(&CliConfig {
        data_dir: Some(cli_args.data_dir),
        port: cli_args.port,
        logging_level: cli_args.logging_level,
        frontend_dir_path: cli_args.frontend_dir_path,
        production: cli_args.production,
        spotify_accounts_url: cli_args.spotify_accounts_url,
        spotify_api_url: cli_args.spotify_api_url,
    })?;

    info!(
        "Opening SQLite user database at {:?}...",
        config.user_db_path()
    );
    let user_store = Arc::new(SqliteUserStore::new(config.user_db_path())?);

    info!("Loading content catalogs from {:?}...", config.data_dir);
    let catalog = ContentCatalog::load(&config.data_dir)?;

    let spotify = Arc::new(SpotifyClient::new(
        config.spotify_accounts_url.clone(),
        config.spotify_api_url.clone(),
        config.spotify_client_id.clone(),
        config.spotify_client_secret.clone(),
    ));

    let server_config = ServerConfig {
        requests_logging_level: config.logging_level.clone(),
        port: config.port,
        jwt_secret: config.jwt_secret.clone(),
        production: config.production,
        frontend_dir_path: config.frontend_dir_path.clone(),
    };

    info!("Ready to serve at port {}!", config.port);
    run_server(server_config, user_store, catalog, spotify).await
}
