// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable conversation-group membership.
//!
//! A group row is created on first join and never deleted; its connection
//! rows come and go as sockets open and close.

use rusqlite::{params, Connection as SqlConnection};

use amora_core::{AmoraError, Connection, ConnectionId, Group, Username};

use crate::database::Database;

fn load_group_tx(conn: &SqlConnection, name: &str) -> rusqlite::Result<Option<Group>> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM groups WHERE name = ?1")?
        .exists(params![name])?;
    if !exists {
        return Ok(None);
    }

    let mut stmt = conn.prepare(
        "SELECT connection_id, username FROM group_connections
         WHERE group_name = ?1 ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map(params![name], |row| {
        Ok(Connection {
            connection_id: ConnectionId::from(row.get::<_, String>(0)?.as_str()),
            username: Username::new(&row.get::<_, String>(1)?),
        })
    })?;
    let mut connections = Vec::new();
    for row in rows {
        connections.push(row?);
    }
    Ok(Some(Group {
        name: name.to_string(),
        connections,
    }))
}

/// Persist a group and replace its connection membership atomically.
pub async fn save_group(db: &Database, group: &Group) -> Result<(), AmoraError> {
    let group = group.clone();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT OR IGNORE INTO groups (name) VALUES (?1)",
                params![group.name],
            )?;
            tx.execute(
                "DELETE FROM group_connections WHERE group_name = ?1",
                params![group.name],
            )?;
            for connection in &group.connections {
                tx.execute(
                    "INSERT OR REPLACE INTO group_connections (connection_id, group_name, username)
                     VALUES (?1, ?2, ?3)",
                    params![
                        connection.connection_id.as_str(),
                        group.name,
                        connection.username.as_str(),
                    ],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Load a group by name, including its current connections.
pub async fn load_group(db: &Database, name: &str) -> Result<Option<Group>, AmoraError> {
    let name = name.to_string();
    db.connection()
        .call(move |conn| Ok(load_group_tx(conn, &name)?))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Find the group that owns a connection, if any.
pub async fn group_for_connection(
    db: &Database,
    connection_id: &ConnectionId,
) -> Result<Option<Group>, AmoraError> {
    let connection_id = connection_id.clone();
    db.connection()
        .call(move |conn| {
            let result: rusqlite::Result<String> = conn.query_row(
                "SELECT group_name FROM group_connections WHERE connection_id = ?1",
                params![connection_id.as_str()],
                |row| row.get(0),
            );
            match result {
                Ok(name) => Ok(load_group_tx(conn, &name)?),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Remove a connection from whatever group holds it. No-op if untracked.
pub async fn remove_connection(
    db: &Database,
    connection_id: &ConnectionId,
) -> Result<(), AmoraError> {
    let connection_id = connection_id.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "DELETE FROM group_connections WHERE connection_id = ?1",
                params![connection_id.as_str()],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn open_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("groups.db");
        let db = Database::open(path.to_str().unwrap(), true).await.unwrap();
        (db, dir)
    }

    fn member(conn_id: &str, username: &str) -> Connection {
        Connection {
            connection_id: ConnectionId::from(conn_id),
            username: Username::new(username),
        }
    }

    #[tokio::test]
    async fn save_and_load_group_with_members() {
        let (db, _dir) = open_db().await;
        let group = Group {
            name: "alice-bob".to_string(),
            connections: vec![member("c1", "alice"), member("c2", "bob")],
        };
        save_group(&db, &group).await.unwrap();

        let loaded = load_group(&db, "alice-bob").await.unwrap().unwrap();
        assert_eq!(loaded, group);
    }

    #[tokio::test]
    async fn load_unknown_group_returns_none() {
        let (db, _dir) = open_db().await;
        assert!(load_group(&db, "nobody-noone").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_group_row_survives_membership_churn() {
        let (db, _dir) = open_db().await;
        let mut group = Group {
            name: "alice-bob".to_string(),
            connections: vec![member("c1", "alice")],
        };
        save_group(&db, &group).await.unwrap();

        group.connections.clear();
        save_group(&db, &group).await.unwrap();

        // The group row is retained even with zero connections.
        let loaded = load_group(&db, "alice-bob").await.unwrap().unwrap();
        assert!(loaded.connections.is_empty());
    }

    #[tokio::test]
    async fn group_for_connection_resolves_owner() {
        let (db, _dir) = open_db().await;
        let group = Group {
            name: "alice-bob".to_string(),
            connections: vec![member("c1", "alice")],
        };
        save_group(&db, &group).await.unwrap();

        let owner = group_for_connection(&db, &ConnectionId::from("c1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(owner.name, "alice-bob");

        assert!(group_for_connection(&db, &ConnectionId::from("never-joined"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn remove_connection_is_idempotent() {
        let (db, _dir) = open_db().await;
        let group = Group {
            name: "alice-bob".to_string(),
            connections: vec![member("c1", "alice"), member("c2", "bob")],
        };
        save_group(&db, &group).await.unwrap();

        remove_connection(&db, &ConnectionId::from("c1")).await.unwrap();
        remove_connection(&db, &ConnectionId::from("c1")).await.unwrap();

        let loaded = load_group(&db, "alice-bob").await.unwrap().unwrap();
        assert_eq!(loaded.connections, vec![member("c2", "bob")]);
    }
}
