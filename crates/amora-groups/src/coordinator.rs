// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Group membership coordination over the persistence collaborator.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use amora_core::{AmoraError, ChatStore, Connection, ConnectionId, Group, Username};

/// The deterministic group name for an unordered pair of users.
///
/// Lexicographic ordering of the normalized usernames, joined by `-`, so both
/// participants independently resolve to the same group regardless of who
/// initiates: `group_name_for(a, b) == group_name_for(b, a)`.
pub fn group_name_for(a: &Username, b: &Username) -> String {
    if a.as_str() < b.as_str() {
        format!("{a}-{b}")
    } else {
        format!("{b}-{a}")
    }
}

/// Coordinates which connections belong to which conversation group.
///
/// The store is the source of truth for membership; this coordinator adds
/// per-group serialization so two participants joining a brand-new group at
/// the same instant create exactly one group record. Empty groups are kept
/// (in the store) so rejoining never recreates the row.
pub struct GroupCoordinator {
    store: Arc<dyn ChatStore>,
    // One async mutex per group name. Entries are tiny and groups are never
    // deleted, so this map only grows with the number of distinct pairs seen
    // by this process.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl GroupCoordinator {
    pub fn new(store: Arc<dyn ChatStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, group_name: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(group_name.to_string())
            .or_default()
            .clone()
    }

    /// Add a connection to a group, creating the group on first join.
    ///
    /// The updated membership is persisted before this returns; a persistence
    /// failure aborts the join so a client never believes it joined a group
    /// it is not durably part of. Joining with a connection id that is
    /// already a member leaves the membership unchanged.
    pub async fn join(
        &self,
        group_name: &str,
        connection: Connection,
    ) -> Result<Group, AmoraError> {
        let lock = self.lock_for(group_name);
        let _guard = lock.lock().await;

        let mut group = self
            .store
            .load_group(group_name)
            .await?
            .unwrap_or_else(|| Group::new(group_name));

        if !group.contains_connection(&connection.connection_id) {
            tracing::debug!(
                group = group_name,
                username = %connection.username,
                connection_id = %connection.connection_id,
                "joining group"
            );
            group.connections.push(connection);
        }

        self.store.save_group(&group).await?;
        Ok(group)
    }

    /// Remove a connection from the group that owns it and return the updated
    /// group. `NotFound` if the connection never joined any group; callers on
    /// socket-close paths treat that as benign.
    pub async fn leave(&self, connection_id: &ConnectionId) -> Result<Group, AmoraError> {
        let Some(owning) = self.store.group_for_connection(connection_id).await? else {
            return Err(AmoraError::NotFound {
                kind: "group for connection",
                name: connection_id.to_string(),
            });
        };

        let lock = self.lock_for(&owning.name);
        let _guard = lock.lock().await;

        self.store.remove_connection(connection_id).await?;
        tracing::debug!(
            group = %owning.name,
            connection_id = %connection_id,
            "left group"
        );

        // Reload under the lock: membership may have changed since the
        // ownership lookup above.
        let group = self
            .store
            .load_group(&owning.name)
            .await?
            .unwrap_or_else(|| Group::new(&owning.name));
        Ok(group)
    }

    /// True if any of `username`'s connections is currently in the group.
    pub async fn is_member(
        &self,
        group_name: &str,
        username: &Username,
    ) -> Result<bool, AmoraError> {
        Ok(self
            .store
            .load_group(group_name)
            .await?
            .map(|group| group.has_member(username))
            .unwrap_or(false))
    }
}
