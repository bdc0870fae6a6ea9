//! Settings database access
//!
//! Read/write settings from the settings table (key-value store).
//! All settings are station-wide, not per-order.

use crate::error::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

/// Whether the audible alert is enabled on this station
///
/// Defaults to `false`: a fresh station stays silent until staff explicitly
/// enable sound, and the preference survives restarts.
pub async fn get_sound_enabled(db: &Pool<Sqlite>) -> Result<bool> {
    match get_setting::<bool>(db, "sound_enabled").await? {
        Some(enabled) => Ok(enabled),
        None => {
            set_sound_enabled(db, false).await?;
            Ok(false)
        }
    }
}

/// Persist the audible alert preference
pub async fn set_sound_enabled(db: &Pool<Sqlite>, enabled: bool) -> Result<()> {
    set_setting(db, "sound_enabled", enabled).await
}

/// Generic setting getter
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(db)
        .await?;

    match value {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates the setting in the database.
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value
        "#,
    )
    .bind(key)
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}
