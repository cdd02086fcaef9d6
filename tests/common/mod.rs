//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_yoga_catalog() {
//!     let server = TestServer::spawn().await;
//!     let (client, _user_id) = TestClient::authenticated(server.base_url.clone()).await;
//!
//!     let response = client.yoga().await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod mock_spotify;
mod server;

// Public API - this is what tests import
#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use constants::*;
#[allow(unused_imports)]
pub use mock_spotify::MockSpotify;
#[allow(unused_imports)]
pub use server::TestServer;
