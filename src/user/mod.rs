pub mod auth;
mod sqlite_user_store;
mod user_manager;
pub mod user_models;
mod user_store;

pub use auth::SilentmoonHasher;
pub use sqlite_user_store::SqliteUserStore;
pub use user_manager::{UserError, UserManager};
pub use user_models::{
    normalize_content_id, FavoriteEntry, FavoriteKind, NewUser, ScheduleSettings, User,
    UserSummary,
};
pub use user_store::{FavoritesStore, FullUserStore, UserSettingsStore, UserStore};
