mod client;
mod models;
mod token_guard;

pub use client::{SpotifyApi, SpotifyClient, UpstreamError};
pub use models::{RefreshedToken, TokenResponse};
pub use token_guard::{
    guard_spotify_token, RefreshCoalescer, HEADER_NEW_ACCESS_TOKEN, HEADER_REFRESH_TOKEN,
    HEADER_TOKEN_EXPIRATION,
};
pub(crate) use token_guard::bearer_token;
