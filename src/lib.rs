//! Silentmoon Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod config;
pub mod server;
pub mod spotify;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use catalog::ContentCatalog;
pub use config::{AppConfig, CliConfig};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use spotify::{SpotifyApi, SpotifyClient};
pub use user::{SqliteUserStore, UserManager, UserStore};
