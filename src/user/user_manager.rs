use super::auth::SilentmoonHasher;
use super::user_models::{
    normalize_content_id, FavoriteEntry, FavoriteKind, NewUser, ScheduleSettings, User,
};
use super::FullUserStore;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("{0}")]
    Validation(String),
    /// One message for unknown email and wrong password, the two are
    /// indistinguishable from the outside.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("A user with this email already exists")]
    EmailTaken,
    #[error("User not found")]
    UnknownUser,
    #[error("Already a favorite")]
    DuplicateFavorite,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub struct UserManager {
    store: Arc<dyn FullUserStore>,
    hasher: SilentmoonHasher,
}

impl UserManager {
    pub fn new(store: Arc<dyn FullUserStore>) -> Self {
        UserManager {
            store,
            hasher: SilentmoonHasher::Argon2,
        }
    }

    pub fn register(
        &self,
        name: &str,
        surname: Option<&str>,
        email: &str,
        password: &str,
    ) -> Result<usize, UserError> {
        if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(UserError::Validation(
                "Name, email and password are required".to_string(),
            ));
        }

        if self.store.get_user_by_email(email)?.is_some() {
            return Err(UserError::EmailTaken);
        }

        let salt = self.hasher.generate_b64_salt();
        let hash = self.hasher.hash(password.as_bytes(), &salt)?;
        let user_id = self.store.create_user(NewUser {
            name: name.to_string(),
            surname: surname.map(|s| s.to_string()),
            email: email.to_string(),
            salt,
            hash,
            hasher: self.hasher.clone(),
        })?;

        debug!("Registered user {} with id {}", email, user_id);
        Ok(user_id)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User, UserError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(UserError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let user = self
            .store
            .get_user_by_email(email)?
            .ok_or(UserError::InvalidCredentials)?;

        match user.hasher.verify(password, &user.hash) {
            Ok(true) => Ok(user),
            Ok(false) => Err(UserError::InvalidCredentials),
            Err(err) => Err(UserError::Internal(err)),
        }
    }

    pub fn get_user(&self, user_id: usize) -> Result<User, UserError> {
        self.store.get_user(user_id)?.ok_or(UserError::UnknownUser)
    }

    pub fn get_schedule(&self, user_id: usize) -> Result<(ScheduleSettings, bool), UserError> {
        let user = self.get_user(user_id)?;
        Ok((user.schedule, user.has_completed_settings))
    }

    /// Stores the schedule. Creating marks the settings as completed,
    /// updating leaves the flag alone.
    pub fn set_schedule(
        &self,
        user_id: usize,
        schedule: ScheduleSettings,
        mark_completed: bool,
    ) -> Result<(), UserError> {
        if schedule.time.trim().is_empty() {
            return Err(UserError::Validation("time must not be empty".to_string()));
        }
        if !self.store.set_schedule(user_id, &schedule, mark_completed)? {
            return Err(UserError::UnknownUser);
        }
        Ok(())
    }

    pub fn add_favorite(
        &self,
        user_id: usize,
        kind: FavoriteKind,
        content_id: &str,
        label: Option<&str>,
    ) -> Result<(), UserError> {
        if content_id.trim().is_empty() {
            return Err(UserError::Validation(
                "contentId must not be empty".to_string(),
            ));
        }
        self.get_user(user_id)?;

        let content_id = normalize_content_id(content_id);
        if !self.store.add_favorite(user_id, kind, &content_id, label)? {
            return Err(UserError::DuplicateFavorite);
        }
        Ok(())
    }

    pub fn remove_favorite(
        &self,
        user_id: usize,
        kind: FavoriteKind,
        content_id: &str,
    ) -> Result<(), UserError> {
        self.get_user(user_id)?;
        let content_id = normalize_content_id(content_id);
        self.store.remove_favorite(user_id, kind, &content_id)?;
        Ok(())
    }

    pub fn is_favorite(
        &self,
        user_id: usize,
        kind: FavoriteKind,
        content_id: &str,
    ) -> Result<bool, UserError> {
        self.get_user(user_id)?;
        let content_id = normalize_content_id(content_id);
        Ok(self.store.is_favorite(user_id, kind, &content_id)?)
    }

    pub fn get_favorites(
        &self,
        user_id: usize,
        kind: FavoriteKind,
    ) -> Result<Vec<FavoriteEntry>, UserError> {
        self.get_user(user_id)?;
        Ok(self.store.get_favorites(user_id, kind)?)
    }
}
