//! Static yoga and meditation video catalogs, loaded once at startup.

use crate::user::{normalize_content_id, FavoriteEntry};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

const YOGA_FILE: &str = "videos.json";
const MEDITATION_FILE: &str = "meditate.json";

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct VideoEntry {
    pub title: String,
    pub url: String,
    pub image: String,
    pub level: String,
    pub time: String,
    pub description: String,
}

pub struct ContentCatalog {
    yoga: Vec<VideoEntry>,
    meditation: Vec<VideoEntry>,
}

impl ContentCatalog {
    pub fn load<T: AsRef<Path>>(data_dir: T) -> Result<Self> {
        let yoga = load_entries(&data_dir.as_ref().join(YOGA_FILE))?;
        let meditation = load_entries(&data_dir.as_ref().join(MEDITATION_FILE))?;
        info!(
            "Loaded {} yoga and {} meditation entries",
            yoga.len(),
            meditation.len()
        );
        Ok(ContentCatalog { yoga, meditation })
    }

    pub fn yoga(&self) -> &[VideoEntry] {
        &self.yoga
    }

    pub fn meditation(&self) -> &[VideoEntry] {
        &self.meditation
    }

    /// Resolves favorites against both catalogs by normalized URL.
    /// Favorites with no matching catalog entry are dropped.
    pub fn resolve_favorites(&self, favorites: &[FavoriteEntry]) -> Vec<VideoEntry> {
        favorites
            .iter()
            .filter_map(|favorite| self.find_by_url(&favorite.content_id))
            .cloned()
            .collect()
    }

    fn find_by_url(&self, normalized_content_id: &str) -> Option<&VideoEntry> {
        self.yoga
            .iter()
            .chain(self.meditation.iter())
            .find(|entry| normalize_content_id(&entry.url) == normalized_content_id)
    }
}

fn load_entries(path: &Path) -> Result<Vec<VideoEntry>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse catalog file {:?}", path))
}
