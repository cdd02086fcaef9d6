//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (user credentials, catalog entries, etc.),
//! update only this file.

// ============================================================================
// Test User Credentials
// ============================================================================

/// Regular test user
pub const TEST_USER_NAME: &str = "Luna";
pub const TEST_USER_EMAIL: &str = "luna@example.org";
pub const TEST_USER_PASS: &str = "testpass123";

/// Second test user, for isolation checks
pub const OTHER_USER_NAME: &str = "Milo";
pub const OTHER_USER_EMAIL: &str = "milo@example.org";
pub const OTHER_USER_PASS: &str = "otherpass123";

/// Secret used to sign session tokens in tests
pub const TEST_JWT_SECRET: &str = "test-secret";

// ============================================================================
// Test Catalog Entries
// ============================================================================

/// Yoga video "Morning Flow"
pub const YOGA_1_URL: &str = "https://www.youtube.com/embed/yoga-1";
pub const YOGA_1_TITLE: &str = "Morning Flow";

/// Yoga video "Evening Stretch"
pub const YOGA_2_URL: &str = "https://www.youtube.com/embed/yoga-2";
pub const YOGA_2_TITLE: &str = "Evening Stretch";

/// Meditation video "Deep Calm"
pub const MEDITATION_1_URL: &str = "https://www.youtube.com/embed/med-1";
pub const MEDITATION_1_TITLE: &str = "Deep Calm";

// ============================================================================
// Mock Spotify Data
// ============================================================================

/// Access token handed out by the mock code exchange
pub const MOCK_ACCESS_TOKEN: &str = "mock-access-token";

/// Refresh token handed out by the mock code exchange
pub const MOCK_REFRESH_TOKEN: &str = "mock-refresh-token";

/// Playlist ids returned by the mock search
pub const MOCK_PLAYLIST_1_ID: &str = "pl-1";
pub const MOCK_PLAYLIST_2_ID: &str = "pl-2";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;
