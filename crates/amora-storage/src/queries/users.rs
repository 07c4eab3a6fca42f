// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User profile operations.

use rusqlite::params;

use amora_core::{AmoraError, UserProfile, Username};

use crate::database::Database;

/// Insert a user profile, or update the display name if the user exists.
pub async fn upsert_user(db: &Database, profile: &UserProfile) -> Result<(), AmoraError> {
    let profile = profile.clone();
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (username, known_as, created_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(username) DO UPDATE SET known_as = excluded.known_as",
                params![profile.username.as_str(), profile.known_as, now],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Get a user profile by normalized username.
pub async fn get_user(db: &Database, username: &Username) -> Result<Option<UserProfile>, AmoraError> {
    let username = username.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT username, known_as FROM users WHERE username = ?1")?;
            let result = stmt.query_row(params![username.as_str()], |row| {
                Ok(UserProfile {
                    username: Username::new(&row.get::<_, String>(0)?),
                    known_as: row.get(1)?,
                })
            });
            match result {
                Ok(profile) => Ok(Some(profile)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}
