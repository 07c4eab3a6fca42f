// SPDX-FileCopyrightText: 2026 Amora Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The message submission pipeline.

use std::sync::Arc;

use amora_core::{
    AmoraError, ChatMessage, ChatStore, EventSink, NewMessageAlert, ServerEvent, Username,
};
use amora_groups::{group_name_for, GroupCoordinator};
use amora_presence::PresenceTracker;

/// Orchestrates message submission.
///
/// Persistence is all-or-nothing: a storage failure aborts the operation
/// before any broadcast, so clients never see a message that was not saved.
pub struct MessageRouter {
    store: Arc<dyn ChatStore>,
    groups: Arc<GroupCoordinator>,
    presence: Arc<PresenceTracker>,
    sink: Arc<dyn EventSink>,
}

impl MessageRouter {
    pub fn new(
        store: Arc<dyn ChatStore>,
        groups: Arc<GroupCoordinator>,
        presence: Arc<PresenceTracker>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            groups,
            presence,
            sink,
        }
    }

    /// Submit a message from `sender` to `recipient_raw`.
    ///
    /// If the recipient currently holds a connection in this exact
    /// conversation group, the message is stamped read before persisting and
    /// broadcast to every group member. Otherwise a `NewMessageReceived`
    /// alert goes to the recipient's other live sockets; an offline recipient
    /// gets nothing and relies on fetching the thread later.
    pub async fn submit_message(
        &self,
        sender: &Username,
        recipient_raw: &str,
        content: &str,
    ) -> Result<ChatMessage, AmoraError> {
        let recipient = Username::new(recipient_raw);
        if *sender == recipient {
            return Err(AmoraError::InvalidOperation(
                "you cannot send messages to yourself".to_string(),
            ));
        }

        let sender_profile =
            self.store
                .get_user(sender)
                .await?
                .ok_or_else(|| AmoraError::NotFound {
                    kind: "user",
                    name: sender.to_string(),
                })?;
        if self.store.get_user(&recipient).await?.is_none() {
            return Err(AmoraError::NotFound {
                kind: "user",
                name: recipient.to_string(),
            });
        }

        let group_name = group_name_for(sender, &recipient);
        let recipient_in_thread = self.groups.is_member(&group_name, &recipient).await?;

        let mut message = ChatMessage::new(sender, &recipient, content);
        if recipient_in_thread {
            message.read_at = Some(chrono::Utc::now().to_rfc3339());
        }

        self.store.save_message(&message).await?;
        tracing::debug!(
            %sender,
            %recipient,
            group = %group_name,
            live = recipient_in_thread,
            "message persisted"
        );

        if recipient_in_thread {
            if let Some(group) = self.store.load_group(&group_name).await? {
                self.sink
                    .send_to_group(
                        &group.connection_ids(),
                        &ServerEvent::NewMessage(message.clone()),
                    )
                    .await;
            }
        } else {
            // Recipient is not viewing this thread. If they are online
            // anywhere else in the app, nudge those sockets; fire and forget.
            let connections = self.presence.connections_for(&recipient);
            if !connections.is_empty() {
                self.sink
                    .send_to_presence(
                        &connections,
                        &ServerEvent::NewMessageReceived(NewMessageAlert {
                            username: sender.clone(),
                            known_as: sender_profile.known_as,
                        }),
                    )
                    .await;
            }
        }

        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amora_core::{Connection, ConnectionId, Group, UserProfile};
    use amora_storage::SqliteChatStore;
    use async_trait::async_trait;
    use tempfile::tempdir;
    use tokio::sync::Mutex;

    /// Records every delivery instead of writing to sockets.
    #[derive(Default)]
    struct RecordingSink {
        group_events: Mutex<Vec<(Vec<ConnectionId>, ServerEvent)>>,
        presence_events: Mutex<Vec<(Vec<ConnectionId>, ServerEvent)>>,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn send_to_group(&self, connections: &[ConnectionId], event: &ServerEvent) {
            self.group_events
                .lock()
                .await
                .push((connections.to_vec(), event.clone()));
        }

        async fn send_to_presence(&self, connections: &[ConnectionId], event: &ServerEvent) {
            self.presence_events
                .lock()
                .await
                .push((connections.to_vec(), event.clone()));
        }
    }

    struct Fixture {
        router: MessageRouter,
        groups: Arc<GroupCoordinator>,
        presence: Arc<PresenceTracker>,
        sink: Arc<RecordingSink>,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let path = dir.path().join("router.db");
        let store: Arc<SqliteChatStore> = Arc::new(
            SqliteChatStore::open(path.to_str().unwrap(), true)
                .await
                .unwrap(),
        );
        for (name, display) in [("alice", "Alice"), ("bob", "Bob")] {
            store
                .upsert_user(&UserProfile {
                    username: Username::new(name),
                    known_as: display.to_string(),
                })
                .await
                .unwrap();
        }

        let groups = Arc::new(GroupCoordinator::new(store.clone()));
        let presence = Arc::new(PresenceTracker::new());
        let sink = Arc::new(RecordingSink::default());
        let router = MessageRouter::new(store, groups.clone(), presence.clone(), sink.clone());
        Fixture {
            router,
            groups,
            presence,
            sink,
            _dir: dir,
        }
    }

    fn member(conn_id: &str, username: &str) -> Connection {
        Connection {
            connection_id: ConnectionId::from(conn_id),
            username: Username::new(username),
        }
    }

    #[tokio::test]
    async fn self_message_is_rejected() {
        let f = fixture().await;
        let err = f
            .router
            .submit_message(&Username::new("alice"), "alice", "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, AmoraError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn unknown_recipient_is_not_found() {
        let f = fixture().await;
        let err = f
            .router
            .submit_message(&Username::new("alice"), "ghost", "hi")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn recipient_in_thread_gets_read_stamp_and_group_broadcast() {
        let f = fixture().await;

        // Both participants are viewing the conversation.
        f.groups
            .join("alice-bob", member("a1", "alice"))
            .await
            .unwrap();
        f.groups
            .join("alice-bob", member("b1", "bob"))
            .await
            .unwrap();

        let message = f
            .router
            .submit_message(&Username::new("alice"), "bob", "hey you")
            .await
            .unwrap();
        assert!(message.read_at.is_some(), "recipient was viewing the thread");

        let group_events = f.sink.group_events.lock().await;
        assert_eq!(group_events.len(), 1);
        let (recipients, event) = &group_events[0];
        assert_eq!(recipients.len(), 2, "broadcast reaches every group member");
        assert!(matches!(event, ServerEvent::NewMessage(m) if m.id == message.id));

        assert!(f.sink.presence_events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn recipient_elsewhere_gets_fallback_alert_without_content() {
        let f = fixture().await;

        // Bob is online (two tabs) but not viewing the alice conversation.
        let bob = Username::new("bob");
        f.presence.user_connected(&bob, ConnectionId::from("p1"));
        f.presence.user_connected(&bob, ConnectionId::from("p2"));

        let message = f
            .router
            .submit_message(&Username::new("alice"), "bob", "hey you")
            .await
            .unwrap();
        assert!(message.read_at.is_none());

        let presence_events = f.sink.presence_events.lock().await;
        assert_eq!(presence_events.len(), 1);
        let (recipients, event) = &presence_events[0];
        assert_eq!(recipients.len(), 2, "every live socket gets the alert");
        match event {
            ServerEvent::NewMessageReceived(alert) => {
                assert_eq!(alert.username, Username::new("alice"));
                assert_eq!(alert.known_as, "Alice");
            }
            other => panic!("expected NewMessageReceived, got {other:?}"),
        }

        assert!(f.sink.group_events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn offline_recipient_gets_no_notification() {
        let f = fixture().await;

        let message = f
            .router
            .submit_message(&Username::new("alice"), "bob", "hey")
            .await
            .unwrap();
        assert!(message.read_at.is_none());
        assert!(f.sink.group_events.lock().await.is_empty());
        assert!(f.sink.presence_events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn read_marking_follows_membership_at_submission_time() {
        let f = fixture().await;
        let alice = Username::new("alice");

        // Bob joins the thread: first message arrives read.
        f.groups
            .join("alice-bob", member("b1", "bob"))
            .await
            .unwrap();
        let first = f.router.submit_message(&alice, "bob", "one").await.unwrap();
        assert!(first.read_at.is_some());

        // Bob leaves, stays online on the presence channel: second message is
        // unread and a fallback alert is dispatched.
        f.groups.leave(&ConnectionId::from("b1")).await.unwrap();
        f.presence
            .user_connected(&Username::new("bob"), ConnectionId::from("p1"));

        let second = f.router.submit_message(&alice, "bob", "two").await.unwrap();
        assert!(second.read_at.is_none());
        assert_eq!(f.sink.presence_events.lock().await.len(), 1);
    }

    fn disk_error() -> AmoraError {
        AmoraError::Persistence {
            source: Box::new(std::io::Error::other("disk full")),
        }
    }

    /// Every write fails; reads claim both users exist and bob is viewing
    /// the alice conversation, so submission reaches the message save.
    struct FailingStore;

    #[async_trait]
    impl ChatStore for FailingStore {
        async fn get_user(&self, username: &Username) -> Result<Option<UserProfile>, AmoraError> {
            Ok(Some(UserProfile {
                username: username.clone(),
                known_as: username.to_string(),
            }))
        }

        async fn upsert_user(&self, _profile: &UserProfile) -> Result<(), AmoraError> {
            Err(disk_error())
        }

        async fn save_message(&self, _message: &ChatMessage) -> Result<(), AmoraError> {
            Err(disk_error())
        }

        async fn message_thread(
            &self,
            _a: &Username,
            _b: &Username,
        ) -> Result<Vec<ChatMessage>, AmoraError> {
            Ok(Vec::new())
        }

        async fn mark_thread_read(
            &self,
            _reader: &Username,
            _counterpart: &Username,
        ) -> Result<u64, AmoraError> {
            Ok(0)
        }

        async fn save_group(&self, _group: &Group) -> Result<(), AmoraError> {
            Err(disk_error())
        }

        async fn load_group(&self, name: &str) -> Result<Option<Group>, AmoraError> {
            let mut group = Group::new(name);
            group.connections.push(Connection {
                connection_id: ConnectionId::from("b1"),
                username: Username::new("bob"),
            });
            Ok(Some(group))
        }

        async fn group_for_connection(
            &self,
            _connection_id: &ConnectionId,
        ) -> Result<Option<Group>, AmoraError> {
            Ok(None)
        }

        async fn remove_connection(&self, _connection_id: &ConnectionId) -> Result<(), AmoraError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn persistence_failure_aborts_before_any_broadcast() {
        let store = Arc::new(FailingStore);
        let groups = Arc::new(GroupCoordinator::new(store.clone()));
        let presence = Arc::new(PresenceTracker::new());
        let sink = Arc::new(RecordingSink::default());
        let router = MessageRouter::new(store, groups, presence.clone(), sink.clone());

        // Bob is also online elsewhere, so a buggy fallback path would have
        // somewhere to deliver to.
        presence.user_connected(&Username::new("bob"), ConnectionId::from("p1"));

        let err = router
            .submit_message(&Username::new("alice"), "bob", "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, AmoraError::Persistence { .. }));

        // The message was never saved, so no client may learn about it.
        assert!(sink.group_events.lock().await.is_empty());
        assert!(sink.presence_events.lock().await.is_empty());
    }

    #[tokio::test]
    async fn recipient_case_is_normalized() {
        let f = fixture().await;
        let message = f
            .router
            .submit_message(&Username::new("alice"), "BOB", "hi")
            .await
            .unwrap();
        assert_eq!(message.recipient_username, Username::new("bob"));
    }
}
