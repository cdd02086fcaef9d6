use super::user_models::{FavoriteEntry, FavoriteKind, NewUser, ScheduleSettings, User};
use anyhow::Result;

pub trait UserStore: Send + Sync {
    /// Creates a new user and returns the user id.
    /// Fails if the email is already taken.
    fn create_user(&self, new_user: NewUser) -> Result<usize>;

    /// Returns the user with the given id.
    /// Returns Ok(None) if the user does not exist.
    /// Returns Err if there is a database error.
    fn get_user(&self, user_id: usize) -> Result<Option<User>>;

    /// Returns the user with the given email.
    /// Returns Ok(None) if the user does not exist.
    /// Returns Err if there is a database error.
    fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
}

pub trait UserSettingsStore: Send + Sync {
    /// Replaces the user's schedule settings. Marks the settings as completed
    /// when `mark_completed` is set, otherwise leaves the flag untouched.
    /// Returns false if the user does not exist.
    fn set_schedule(
        &self,
        user_id: usize,
        schedule: &ScheduleSettings,
        mark_completed: bool,
    ) -> Result<bool>;
}

pub trait FavoritesStore: Send + Sync {
    /// Adds a favorite in a single conditional insert.
    /// Returns false if the entry was already present.
    /// The content id must already be normalized by the caller.
    fn add_favorite(
        &self,
        user_id: usize,
        kind: FavoriteKind,
        content_id: &str,
        label: Option<&str>,
    ) -> Result<bool>;

    /// Removes a favorite. Removing an absent entry is a no-op.
    fn remove_favorite(&self, user_id: usize, kind: FavoriteKind, content_id: &str) -> Result<()>;

    /// Returns whether the entry is in the user's list.
    fn is_favorite(&self, user_id: usize, kind: FavoriteKind, content_id: &str) -> Result<bool>;

    /// Returns all of the user's favorites of the given kind, oldest first.
    fn get_favorites(&self, user_id: usize, kind: FavoriteKind) -> Result<Vec<FavoriteEntry>>;
}

/// Combined trait for user storage with settings and favorites
pub trait FullUserStore: UserStore + UserSettingsStore + FavoritesStore {}

// Blanket implementation for any type that implements all the store traits
impl<T: UserStore + UserSettingsStore + FavoritesStore> FullUserStore for T {}
