use super::auth::SilentmoonHasher;
use anyhow::{bail, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref SCHEME_AND_HOST: Regex = Regex::new(r"^https?://[^/]+").unwrap();
}

/// Strips a leading `scheme://host` prefix so that full URLs and path-only
/// forms of the same content id compare equal.
pub fn normalize_content_id(content_id: &str) -> String {
    SCHEME_AND_HOST.replace(content_id, "").into_owned()
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FavoriteKind {
    Video,
    Audio,
    Playlist,
}

impl FavoriteKind {
    pub fn to_int(self) -> i32 {
        match self {
            FavoriteKind::Video => 0,
            FavoriteKind::Audio => 1,
            FavoriteKind::Playlist => 2,
        }
    }

    pub fn from_int(value: i32) -> Result<Self> {
        match value {
            0 => Ok(FavoriteKind::Video),
            1 => Ok(FavoriteKind::Audio),
            2 => Ok(FavoriteKind::Playlist),
            _ => bail!("Unknown favorite kind {}", value),
        }
    }

    pub fn from_route_segment(segment: &str) -> Option<Self> {
        match segment {
            "video" => Some(FavoriteKind::Video),
            "audio" => Some(FavoriteKind::Audio),
            "playlist" => Some(FavoriteKind::Playlist),
            _ => None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct FavoriteEntry {
    #[serde(rename = "contentId")]
    pub content_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "addedAt")]
    pub added_at: i64,
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub time: String,
    pub days: Vec<u8>,
}

#[derive(Clone, Debug)]
pub struct User {
    pub id: usize,
    pub name: String,
    pub surname: Option<String>,
    pub email: String,
    pub avatar: Option<String>,
    pub salt: String,
    pub hash: String,
    pub hasher: SilentmoonHasher,
    pub schedule: ScheduleSettings,
    pub has_completed_settings: bool,
}

/// A user record about to be inserted, credentials already hashed.
pub struct NewUser {
    pub name: String,
    pub surname: Option<String>,
    pub email: String,
    pub salt: String,
    pub hash: String,
    pub hasher: SilentmoonHasher,
}

/// What the frontend gets back after login. No credential material.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct UserSummary {
    pub id: usize,
    pub name: String,
    pub email: String,
    #[serde(rename = "hasCompletedSettings")]
    pub has_completed_settings: bool,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            has_completed_settings: user.has_completed_settings,
        }
    }
}
