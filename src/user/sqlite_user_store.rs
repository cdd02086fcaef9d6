use crate::sqlite_column;
use crate::sqlite_persistence::{
    Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema, BASE_DB_VERSION,
    DEFAULT_TIMESTAMP,
};
use crate::user::user_models::{FavoriteEntry, FavoriteKind, NewUser, ScheduleSettings, User};
use crate::user::{FavoritesStore, UserSettingsStore, UserStore};
use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::{
    path::Path,
    str::FromStr,
    sync::{Arc, Mutex},
};
use tracing::info;

use super::auth::SilentmoonHasher;

/// V 0
const USER_TABLE_V_0: Table = Table {
    name: "user",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!("name", &SqlType::Text, non_null = true),
        sqlite_column!("surname", &SqlType::Text),
        sqlite_column!("email", &SqlType::Text, non_null = true, is_unique = true),
        sqlite_column!("avatar", &SqlType::Text),
        sqlite_column!("salt", &SqlType::Text, non_null = true),
        sqlite_column!("hash", &SqlType::Text, non_null = true),
        sqlite_column!("hasher", &SqlType::Text, non_null = true),
        sqlite_column!(
            "schedule_time",
            &SqlType::Text,
            non_null = true,
            default_value = Some("''")
        ),
        sqlite_column!(
            "schedule_days",
            &SqlType::Text,
            non_null = true,
            default_value = Some("'[]'")
        ),
        sqlite_column!(
            "has_completed_settings",
            &SqlType::Integer,
            non_null = true,
            default_value = Some("0")
        ),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[],
    indices: &[("idx_user_email", "email")],
};

const FAVORITE_TABLE_V_0: Table = Table {
    name: "favorite",
    columns: &[
        sqlite_column!(
            "id",
            &SqlType::Integer,
            is_primary_key = true,
            is_unique = true
        ),
        sqlite_column!(
            "user_id",
            &SqlType::Integer,
            non_null = true,
            foreign_key = Some(&ForeignKey {
                foreign_table: "user",
                foreign_column: "id",
                on_delete: ForeignKeyOnChange::Cascade,
            })
        ),
        sqlite_column!("kind", &SqlType::Integer, non_null = true),
        sqlite_column!("content_id", &SqlType::Text, non_null = true),
        sqlite_column!("label", &SqlType::Text),
        sqlite_column!(
            "created",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    unique_constraints: &[&["user_id", "kind", "content_id"]],
    indices: &[("idx_favorite_user_id", "user_id")],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[USER_TABLE_V_0, FAVORITE_TABLE_V_0],
    migration: None,
}];

#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let conn = if db_path.as_ref().exists() {
            Connection::open_with_flags(
                db_path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                    | rusqlite::OpenFlags::SQLITE_OPEN_URI
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?
        } else {
            let conn = Connection::open(db_path)?;
            VERSIONED_SCHEMAS
                .last()
                .context("No schema defined")?
                .create(&conn)?;
            conn
        };

        // Read the database version
        let db_version = conn
            .query_row("PRAGMA user_version;", [], |row| row.get::<usize, i64>(0))
            .context("Failed to read database version")?
            - BASE_DB_VERSION as i64;

        if db_version < 0 {
            bail!(
                "Database version {} is too old, does not contain base db version {}",
                db_version,
                BASE_DB_VERSION
            );
        }
        let version = db_version as usize;

        if db_version >= VERSIONED_SCHEMAS.len() as i64 {
            bail!("Database version {} is too new", db_version);
        } else {
            VERSIONED_SCHEMAS
                .get(version)
                .context("Failed to get schema")?
                .validate(&conn)?;
        }

        Self::migrate_if_needed(&conn, version)?;

        Ok(SqliteUserStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn migrate_if_needed(conn: &Connection, version: usize) -> Result<()> {
        let mut latest_from = version;
        for schema in VERSIONED_SCHEMAS.iter().skip(version + 1) {
            if let Some(migration_fn) = schema.migration {
                info!(
                    "Migrating db from version {} to {}",
                    latest_from, schema.version
                );
                migration_fn(conn)?;
                latest_from = schema.version;
            }
        }
        conn.execute(
            &format!("PRAGMA user_version = {}", BASE_DB_VERSION + latest_from),
            [],
        )?;

        Ok(())
    }

    // Returns the raw schedule_days JSON and hasher name alongside the user,
    // they need fallible parsing outside the rusqlite row mapper.
    fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(User, String, String)> {
        let hasher_name: String = row.get(7)?;
        let schedule_days: String = row.get(9)?;
        let user = User {
            id: row.get::<_, i64>(0)? as usize,
            name: row.get(1)?,
            surname: row.get(2)?,
            email: row.get(3)?,
            avatar: row.get(4)?,
            salt: row.get(5)?,
            hash: row.get(6)?,
            hasher: SilentmoonHasher::Argon2,
            schedule: ScheduleSettings {
                time: row.get(8)?,
                days: Vec::new(),
            },
            has_completed_settings: row.get::<_, i32>(10)? == 1,
        };
        Ok((user, schedule_days, hasher_name))
    }

    fn get_user_where(
        &self,
        where_clause: &str,
        param: &dyn rusqlite::ToSql,
    ) -> Result<Option<User>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, surname, email, avatar, salt, hash, hasher, \
             schedule_time, schedule_days, has_completed_settings \
             FROM {} WHERE {}",
            USER_TABLE_V_0.name, where_clause
        ))?;

        let row = stmt
            .query_row(params![param], Self::map_user_row)
            .optional()?;

        match row {
            None => Ok(None),
            Some((mut user, schedule_days, hasher_name)) => {
                user.hasher = SilentmoonHasher::from_str(&hasher_name)?;
                user.schedule.days = serde_json::from_str(&schedule_days)
                    .with_context(|| format!("Corrupt schedule_days for user {}", user.id))?;
                Ok(Some(user))
            }
        }
    }
}

impl UserStore for SqliteUserStore {
    fn create_user(&self, new_user: NewUser) -> Result<usize> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "INSERT INTO {} (name, surname, email, avatar, salt, hash, hasher) \
                 VALUES (?1, ?2, ?3, NULL, ?4, ?5, ?6)",
                USER_TABLE_V_0.name
            ),
            params![
                new_user.name,
                new_user.surname,
                new_user.email,
                new_user.salt,
                new_user.hash,
                new_user.hasher.to_string(),
            ],
        )
        .with_context(|| format!("Failed to create user {}", new_user.email))?;
        Ok(conn.last_insert_rowid() as usize)
    }

    fn get_user(&self, user_id: usize) -> Result<Option<User>> {
        self.get_user_where("id = ?1", &(user_id as i64))
    }

    fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_where("email = ?1", &email)
    }
}

impl UserSettingsStore for SqliteUserStore {
    fn set_schedule(
        &self,
        user_id: usize,
        schedule: &ScheduleSettings,
        mark_completed: bool,
    ) -> Result<bool> {
        let days_json = serde_json::to_string(&schedule.days)?;
        let conn = self.conn.lock().unwrap();
        let changed = if mark_completed {
            conn.execute(
                &format!(
                    "UPDATE {} SET schedule_time = ?1, schedule_days = ?2, \
                     has_completed_settings = 1 WHERE id = ?3",
                    USER_TABLE_V_0.name
                ),
                params![schedule.time, days_json, user_id],
            )?
        } else {
            conn.execute(
                &format!(
                    "UPDATE {} SET schedule_time = ?1, schedule_days = ?2 WHERE id = ?3",
                    USER_TABLE_V_0.name
                ),
                params![schedule.time, days_json, user_id],
            )?
        };
        Ok(changed > 0)
    }
}

impl FavoritesStore for SqliteUserStore {
    fn add_favorite(
        &self,
        user_id: usize,
        kind: FavoriteKind,
        content_id: &str,
        label: Option<&str>,
    ) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        // The UNIQUE(user_id, kind, content_id) constraint makes this a single
        // atomic check-and-insert, no read needed.
        let inserted = conn.execute(
            &format!(
                "INSERT OR IGNORE INTO {} (user_id, kind, content_id, label) \
                 VALUES (?1, ?2, ?3, ?4)",
                FAVORITE_TABLE_V_0.name
            ),
            params![user_id, kind.to_int(), content_id, label],
        )?;
        Ok(inserted > 0)
    }

    fn remove_favorite(&self, user_id: usize, kind: FavoriteKind, content_id: &str) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE user_id = ?1 AND kind = ?2 AND content_id = ?3",
                FAVORITE_TABLE_V_0.name
            ),
            params![user_id, kind.to_int(), content_id],
        )?;
        Ok(())
    }

    fn is_favorite(&self, user_id: usize, kind: FavoriteKind, content_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE user_id = ?1 AND kind = ?2 AND content_id = ?3",
                FAVORITE_TABLE_V_0.name
            ),
            params![user_id, kind.to_int(), content_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn get_favorites(&self, user_id: usize, kind: FavoriteKind) -> Result<Vec<FavoriteEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT content_id, label, created FROM {} \
             WHERE user_id = ?1 AND kind = ?2 ORDER BY created ASC, id ASC",
            FAVORITE_TABLE_V_0.name
        ))?;
        let favorites = stmt
            .query_map(params![user_id, kind.to_int()], |row| {
                Ok(FavoriteEntry {
                    content_id: row.get(0)?,
                    label: row.get(1)?,
                    added_at: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(favorites)
    }
}
