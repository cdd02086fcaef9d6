use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use std::path::PathBuf;

pub const DEFAULT_SPOTIFY_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com";

const ENV_JWT_SECRET: &str = "JWT_SECRET";
const ENV_SPOTIFY_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
const ENV_SPOTIFY_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";

/// CLI arguments that feed into config resolution.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub production: bool,
    pub spotify_accounts_url: Option<String>,
    pub spotify_api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub frontend_dir_path: Option<String>,
    pub production: bool,

    // Secrets, environment only
    pub jwt_secret: String,
    pub spotify_client_id: String,
    pub spotify_client_secret: String,

    pub spotify_accounts_url: String,
    pub spotify_api_url: String,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and the process environment.
    /// Secrets come exclusively from the environment and missing ones fail
    /// resolution, the server never starts half-configured.
    pub fn resolve(cli: &CliConfig) -> Result<Self> {
        Self::resolve_with_env(cli, &|name| std::env::var(name).ok())
    }

    pub fn resolve_with_env(
        cli: &CliConfig,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let data_dir = cli.data_dir.clone().ok_or_else(|| {
            anyhow::anyhow!("data_dir must be specified")
        })?;

        if !data_dir.exists() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }
        if !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let jwt_secret = require_env(env, ENV_JWT_SECRET)?;
        let spotify_client_id = require_env(env, ENV_SPOTIFY_CLIENT_ID)?;
        let spotify_client_secret = require_env(env, ENV_SPOTIFY_CLIENT_SECRET)?;

        let spotify_accounts_url = cli
            .spotify_accounts_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SPOTIFY_ACCOUNTS_URL.to_string());
        let spotify_api_url = cli
            .spotify_api_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SPOTIFY_API_URL.to_string());

        Ok(Self {
            data_dir,
            port: cli.port,
            logging_level: cli.logging_level.clone(),
            frontend_dir_path: cli.frontend_dir_path.clone(),
            production: cli.production,
            jwt_secret,
            spotify_client_id,
            spotify_client_secret,
            spotify_accounts_url,
            spotify_api_url,
        })
    }

    pub fn user_db_path(&self) -> PathBuf {
        self.data_dir.join("user.db")
    }
}

fn require_env(env: &dyn Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    match env(name) {
        Some(value) if !value.is_empty() => Ok(value),
        Some(_) => bail!("Environment variable {} is set but empty", name),
        None => bail!("Environment variable {} must be set", name),
    }
}
