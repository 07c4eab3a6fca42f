// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrency-safe username -> connection-set registry.

use std::collections::HashSet;

use dashmap::DashMap;

use amora_core::{ConnectionId, Username};

/// Maps each username to the set of its concurrently open connections.
///
/// Mutations for one username serialize on the dashmap entry lock, so the
/// first-connection / last-disconnection determination cannot race for a
/// given user. Different usernames mutate concurrently.
///
/// Invariant: a username has an entry iff its connection set is non-empty.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: DashMap<Username, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection. Returns true exactly when this was the user's first
    /// live connection (the empty -> non-empty transition).
    pub fn add(&self, username: &Username, connection_id: ConnectionId) -> bool {
        let mut entry = self.inner.entry(username.clone()).or_default();
        let was_empty = entry.is_empty();
        entry.insert(connection_id);
        was_empty
    }

    /// Remove a connection. Returns true exactly when the user's set became
    /// empty (they just went offline). Removing an unknown connection id is a
    /// silent no-op returning false, so duplicate or late socket-close events
    /// are harmless.
    pub fn remove(&self, username: &Username, connection_id: &ConnectionId) -> bool {
        let went_offline = {
            let Some(mut entry) = self.inner.get_mut(username) else {
                return false;
            };
            if !entry.remove(connection_id) {
                return false;
            }
            entry.is_empty()
        };
        if went_offline {
            // The entry lock was released above; re-check emptiness under the
            // lock so a connection that raced in between is not dropped.
            self.inner.remove_if(username, |_, set| set.is_empty());
        }
        went_offline
    }

    /// Snapshot of all currently online usernames, sorted.
    pub fn online(&self) -> Vec<Username> {
        let mut users: Vec<Username> = self
            .inner
            .iter()
            .filter(|entry| !entry.value().is_empty())
            .map(|entry| entry.key().clone())
            .collect();
        users.sort();
        users
    }

    /// Snapshot of one user's live connection ids.
    pub fn connections_for(&self, username: &Username) -> Vec<ConnectionId> {
        self.inner
            .get(username)
            .map(|entry| entry.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_connection_reports_online_transition() {
        let registry = ConnectionRegistry::new();
        let alice = Username::new("alice");

        assert!(registry.add(&alice, ConnectionId::from("c1")));
        assert!(!registry.add(&alice, ConnectionId::from("c2")));
        assert_eq!(registry.connections_for(&alice).len(), 2);
    }

    #[test]
    fn last_disconnection_reports_offline_transition() {
        let registry = ConnectionRegistry::new();
        let alice = Username::new("alice");
        registry.add(&alice, ConnectionId::from("c1"));
        registry.add(&alice, ConnectionId::from("c2"));

        assert!(!registry.remove(&alice, &ConnectionId::from("c1")));
        assert!(registry.remove(&alice, &ConnectionId::from("c2")));
        assert!(registry.online().is_empty());
    }

    #[test]
    fn duplicate_disconnect_is_a_silent_noop() {
        let registry = ConnectionRegistry::new();
        let alice = Username::new("alice");
        registry.add(&alice, ConnectionId::from("c1"));

        assert!(registry.remove(&alice, &ConnectionId::from("c1")));
        assert!(!registry.remove(&alice, &ConnectionId::from("c1")));
        assert!(!registry.remove(&Username::new("ghost"), &ConnectionId::from("c9")));
    }

    #[test]
    fn online_iff_connection_count_positive() {
        let registry = ConnectionRegistry::new();
        let alice = Username::new("alice");
        let bob = Username::new("bob");

        registry.add(&alice, ConnectionId::from("a1"));
        registry.add(&bob, ConnectionId::from("b1"));
        assert_eq!(registry.online(), vec![alice.clone(), bob.clone()]);

        registry.remove(&bob, &ConnectionId::from("b1"));
        assert_eq!(registry.online(), vec![alice.clone()]);
        assert!(registry.connections_for(&bob).is_empty());
    }

    #[test]
    fn online_snapshot_is_sorted() {
        let registry = ConnectionRegistry::new();
        registry.add(&Username::new("zoe"), ConnectionId::from("z1"));
        registry.add(&Username::new("alice"), ConnectionId::from("a1"));
        registry.add(&Username::new("mia"), ConnectionId::from("m1"));

        let online = registry.online();
        assert_eq!(
            online,
            vec![
                Username::new("alice"),
                Username::new("mia"),
                Username::new("zoe")
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_connects_yield_exactly_one_first_transition() {
        use std::sync::Arc;

        let registry = Arc::new(ConnectionRegistry::new());
        let alice = Username::new("alice");
        let n = 32;

        let mut handles = Vec::new();
        for i in 0..n {
            let registry = Arc::clone(&registry);
            let alice = alice.clone();
            handles.push(tokio::spawn(async move {
                registry.add(&alice, ConnectionId::from(format!("c{i}").as_str()))
            }));
        }

        let mut firsts = 0;
        for handle in handles {
            if handle.await.unwrap() {
                firsts += 1;
            }
        }
        assert_eq!(firsts, 1, "exactly one connect may observe the transition");
        assert_eq!(registry.connections_for(&alice).len(), n);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_connect_disconnect_never_loses_updates() {
        use std::sync::Arc;

        let registry = Arc::new(ConnectionRegistry::new());
        let alice = Username::new("alice");

        // Pairs of connect+disconnect for distinct ids, racing freely. Every
        // disconnect targets an id that was connected, so the registry must
        // end empty.
        let mut handles = Vec::new();
        for i in 0..16 {
            let registry = Arc::clone(&registry);
            let alice = alice.clone();
            handles.push(tokio::spawn(async move {
                let id = ConnectionId::from(format!("c{i}").as_str());
                registry.add(&alice, id.clone());
                tokio::task::yield_now().await;
                registry.remove(&alice, &id);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(registry.connections_for(&alice).is_empty());
        assert!(registry.online().is_empty());
    }
}
