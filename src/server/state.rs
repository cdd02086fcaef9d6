use axum::extract::FromRef;

use crate::catalog::ContentCatalog;
use crate::spotify::{RefreshCoalescer, SpotifyApi};
use crate::user::UserManager;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use super::ServerConfig;

pub type GuardedUserManager = Arc<Mutex<UserManager>>;
pub type GuardedCatalog = Arc<ContentCatalog>;
pub type GuardedSpotify = Arc<dyn SpotifyApi>;
pub type GuardedRefreshCoalescer = Arc<RefreshCoalescer>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub user_manager: GuardedUserManager,
    pub catalog: GuardedCatalog,
    pub spotify: GuardedSpotify,
    pub refresh_coalescer: GuardedRefreshCoalescer,
    pub hash: String,
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalog {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for GuardedSpotify {
    fn from_ref(input: &ServerState) -> Self {
        input.spotify.clone()
    }
}

impl FromRef<ServerState> for GuardedRefreshCoalescer {
    fn from_ref(input: &ServerState) -> Self {
        input.refresh_coalescer.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
