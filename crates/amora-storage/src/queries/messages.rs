// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message persistence and thread queries.

use rusqlite::params;

use amora_core::{AmoraError, ChatMessage, Username};

use crate::database::Database;

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: row.get(0)?,
        sender_username: Username::new(&row.get::<_, String>(1)?),
        recipient_username: Username::new(&row.get::<_, String>(2)?),
        content: row.get(3)?,
        sent_at: row.get(4)?,
        read_at: row.get(5)?,
    })
}

/// Insert a new message.
pub async fn insert_message(db: &Database, message: &ChatMessage) -> Result<(), AmoraError> {
    let message = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, sender_username, recipient_username, content, sent_at, read_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    message.id,
                    message.sender_username.as_str(),
                    message.recipient_username.as_str(),
                    message.content,
                    message.sent_at,
                    message.read_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The full thread between two users, oldest first.
pub async fn message_thread(
    db: &Database,
    a: &Username,
    b: &Username,
) -> Result<Vec<ChatMessage>, AmoraError> {
    let a = a.clone();
    let b = b.clone();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, sender_username, recipient_username, content, sent_at, read_at
                 FROM messages
                 WHERE (sender_username = ?1 AND recipient_username = ?2)
                    OR (sender_username = ?2 AND recipient_username = ?1)
                 ORDER BY sent_at ASC, rowid ASC",
            )?;
            let rows = stmt.query_map(params![a.as_str(), b.as_str()], |row| row_to_message(row))?;
            let mut messages = Vec::new();
            for row in rows {
                messages.push(row?);
            }
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark every unread message sent by `counterpart` to `reader` as read in a
/// single batched UPDATE. Returns the number of messages marked.
pub async fn mark_thread_read(
    db: &Database,
    reader: &Username,
    counterpart: &Username,
) -> Result<u64, AmoraError> {
    let reader = reader.clone();
    let counterpart = counterpart.clone();
    let now = chrono::Utc::now().to_rfc3339();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE messages SET read_at = ?1
                 WHERE recipient_username = ?2
                   AND sender_username = ?3
                   AND read_at IS NULL",
                params![now, reader.as_str(), counterpart.as_str()],
            )?;
            Ok(changed as u64)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
