//! Test fixture creation for the data directory
//!
//! Each test server gets its own temporary data directory holding the
//! yoga and meditation catalog files and the SQLite user database.

use super::constants::*;
use anyhow::Result;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

/// Creates a temporary data directory with small yoga and meditation
/// catalogs. The user database is created by the store on first open.
pub fn create_test_data_dir() -> Result<TempDir> {
    let dir = TempDir::new()?;

    let yoga = json!([
        {
            "title": YOGA_1_TITLE,
            "url": YOGA_1_URL,
            "image": "https://img.example.org/yoga-1.jpg",
            "level": "Beginner",
            "time": "15 min",
            "description": "A gentle morning practice."
        },
        {
            "title": YOGA_2_TITLE,
            "url": YOGA_2_URL,
            "image": "https://img.example.org/yoga-2.jpg",
            "level": "Intermediate",
            "time": "25 min",
            "description": "Slow stretches to end the day."
        }
    ]);
    let meditation = json!([
        {
            "title": MEDITATION_1_TITLE,
            "url": MEDITATION_1_URL,
            "image": "https://img.example.org/med-1.jpg",
            "level": "Beginner",
            "time": "10 min",
            "description": "A short guided meditation."
        }
    ]);

    fs::write(dir.path().join("videos.json"), yoga.to_string())?;
    fs::write(dir.path().join("meditate.json"), meditation.to_string())?;

    Ok(dir)
}
