// SPDX-FileCopyrightText: 2026 Parlor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live delivery fanout for connected chat clients.
//!
//! The fanout is an explicitly constructed service owned by the server and
//! passed by reference to whoever needs to publish; it is never looked up
//! from ambient state. It holds no durable data: a subscriber that is
//! disconnected at publish time simply misses the event and re-fetches the
//! transcript on reconnect. Delivery is at-most-once, best-effort.
//!
//! Rooms:
//! - each customer connection joins a room keyed by its own customer id
//! - each admin connection joins the session-list room, plus a room per
//!   session it is currently viewing

use std::collections::HashSet;

use dashmap::DashMap;
use parlor_core::types::ChatMessage;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// An event pushed to connected clients.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveEvent<'a> {
    /// A customer appended a message; admins update previews and unread counts.
    NewCustomerMessage {
        session_id: &'a str,
        customer_id: &'a str,
        message: &'a ChatMessage,
    },
    /// An admin replied; delivered to the customer and to other admins.
    NewAdminMessage {
        session_id: &'a str,
        message: &'a ChatMessage,
    },
    /// Advisory to the sender only; the underlying write already committed.
    DeliveryError { reason: &'a str },
}

/// Per-connection publish registry.
///
/// All maps are in-process only and guarded by DashMap's internal sharding;
/// no durable state lives here.
#[derive(Default)]
pub struct ChatFanout {
    /// conn id -> outbound sender for that socket.
    conns: DashMap<String, mpsc::Sender<String>>,
    /// customer id -> conn ids of that customer's open sockets.
    customer_rooms: DashMap<String, HashSet<String>>,
    /// session id -> conn ids of admins currently viewing it.
    session_rooms: DashMap<String, HashSet<String>>,
    /// conn ids subscribed to list-level updates.
    admin_list: DashMap<String, ()>,
}

impl ChatFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection's outbound sender under `conn_id`.
    pub fn register(&self, conn_id: &str, sender: mpsc::Sender<String>) {
        self.conns.insert(conn_id.to_string(), sender);
    }

    /// Removes a connection from the registry and every room it joined.
    pub fn unregister(&self, conn_id: &str) {
        self.conns.remove(conn_id);
        self.admin_list.remove(conn_id);
        for mut room in self.customer_rooms.iter_mut() {
            room.value_mut().remove(conn_id);
        }
        self.customer_rooms.retain(|_, members| !members.is_empty());
        for mut room in self.session_rooms.iter_mut() {
            room.value_mut().remove(conn_id);
        }
        self.session_rooms.retain(|_, members| !members.is_empty());
    }

    /// Joins a customer connection to its own room.
    pub fn join_customer(&self, customer_id: &str, conn_id: &str) {
        self.customer_rooms
            .entry(customer_id.to_string())
            .or_default()
            .insert(conn_id.to_string());
    }

    /// Subscribes an admin connection to list-level updates.
    pub fn join_admin_list(&self, conn_id: &str) {
        self.admin_list.insert(conn_id.to_string(), ());
    }

    /// Starts delivering a session's events to an admin connection.
    pub fn watch_session(&self, session_id: &str, conn_id: &str) {
        self.session_rooms
            .entry(session_id.to_string())
            .or_default()
            .insert(conn_id.to_string());
    }

    /// Stops delivering a session's events to an admin connection.
    pub fn unwatch_session(&self, session_id: &str, conn_id: &str) {
        if let Some(mut room) = self.session_rooms.get_mut(session_id) {
            room.remove(conn_id);
        }
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.conns.len()
    }

    /// Fans a new customer message out to the customer's other sockets, the
    /// admin list, and any admin viewing the session.
    pub fn publish_customer_message(
        &self,
        session_id: &str,
        customer_id: &str,
        message: &ChatMessage,
    ) {
        let event = LiveEvent::NewCustomerMessage {
            session_id,
            customer_id,
            message,
        };
        let targets = self.gather(Some(customer_id), session_id);
        self.deliver(&event, targets);
    }

    /// Fans an admin reply out to the customer's sockets, the admin list,
    /// and any admin viewing the session.
    pub fn publish_admin_message(
        &self,
        session_id: &str,
        customer_id: &str,
        message: &ChatMessage,
    ) {
        let event = LiveEvent::NewAdminMessage {
            session_id,
            message,
        };
        let targets = self.gather(Some(customer_id), session_id);
        self.deliver(&event, targets);
    }

    /// Sends a delivery-error advisory to a single connection.
    pub fn notify_delivery_error(&self, conn_id: &str, reason: &str) {
        let event = LiveEvent::DeliveryError { reason };
        let mut targets = HashSet::new();
        targets.insert(conn_id.to_string());
        self.deliver(&event, targets);
    }

    /// Collects the distinct conn ids interested in a session's events.
    fn gather(&self, customer_id: Option<&str>, session_id: &str) -> HashSet<String> {
        let mut targets = HashSet::new();
        if let Some(customer_id) = customer_id
            && let Some(room) = self.customer_rooms.get(customer_id)
        {
            targets.extend(room.iter().cloned());
        }
        if let Some(room) = self.session_rooms.get(session_id) {
            targets.extend(room.iter().cloned());
        }
        for entry in self.admin_list.iter() {
            targets.insert(entry.key().clone());
        }
        targets
    }

    /// Best-effort, at-most-once delivery: a full or closed channel drops
    /// the event for that subscriber without queuing a replay.
    fn deliver(&self, event: &LiveEvent<'_>, targets: HashSet<String>) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to serialize live event, dropping");
                return;
            }
        };
        for conn_id in targets {
            if let Some(sender) = self.conns.get(&conn_id)
                && sender.try_send(payload.clone()).is_err()
            {
                debug!(conn_id = conn_id.as_str(), "subscriber unreachable, event dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlor_core::types::SenderRole;

    fn make_msg(id: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            session_id: "s1".to_string(),
            seq: 1,
            sender_id: "cust-1".to_string(),
            sender_role: SenderRole::Customer,
            body: "hello".to_string(),
            read: false,
            deleted: false,
            deleted_at: None,
            deleted_by: None,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[tokio::test]
    async fn customer_message_reaches_customer_and_admin_list() {
        let fanout = ChatFanout::new();

        let (cust_tx, mut cust_rx) = mpsc::channel(8);
        fanout.register("conn-cust", cust_tx);
        fanout.join_customer("cust-1", "conn-cust");

        let (admin_tx, mut admin_rx) = mpsc::channel(8);
        fanout.register("conn-admin", admin_tx);
        fanout.join_admin_list("conn-admin");

        fanout.publish_customer_message("s1", "cust-1", &make_msg("m1"));

        let cust_payload = cust_rx.try_recv().unwrap();
        assert!(cust_payload.contains("\"type\":\"new_customer_message\""));
        assert!(cust_payload.contains("\"session_id\":\"s1\""));

        let admin_payload = admin_rx.try_recv().unwrap();
        assert!(admin_payload.contains("new_customer_message"));
    }

    #[tokio::test]
    async fn admin_reply_reaches_session_watchers() {
        let fanout = ChatFanout::new();

        let (watcher_tx, mut watcher_rx) = mpsc::channel(8);
        fanout.register("conn-watcher", watcher_tx);
        fanout.watch_session("s1", "conn-watcher");

        let (other_tx, mut other_rx) = mpsc::channel(8);
        fanout.register("conn-other", other_tx);
        fanout.watch_session("s2", "conn-other");

        fanout.publish_admin_message("s1", "cust-1", &make_msg("m2"));

        assert!(watcher_rx.try_recv().unwrap().contains("new_admin_message"));
        assert!(other_rx.try_recv().is_err(), "other session watcher must not see it");
    }

    #[tokio::test]
    async fn overlapping_rooms_deliver_once() {
        let fanout = ChatFanout::new();

        // One admin socket that is both on the list and watching the session.
        let (tx, mut rx) = mpsc::channel(8);
        fanout.register("conn-admin", tx);
        fanout.join_admin_list("conn-admin");
        fanout.watch_session("s1", "conn-admin");

        fanout.publish_customer_message("s1", "cust-1", &make_msg("m1"));

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err(), "event must be delivered at most once");
    }

    #[tokio::test]
    async fn disconnected_subscriber_is_skipped_silently() {
        let fanout = ChatFanout::new();

        let (tx, rx) = mpsc::channel(1);
        fanout.register("conn-gone", tx);
        fanout.join_admin_list("conn-gone");
        drop(rx);

        // Publish must not fail or panic with a dead receiver in the room.
        fanout.publish_customer_message("s1", "cust-1", &make_msg("m1"));
    }

    #[tokio::test]
    async fn unregister_removes_connection_from_all_rooms() {
        let fanout = ChatFanout::new();

        let (tx, mut rx) = mpsc::channel(8);
        fanout.register("conn-1", tx);
        fanout.join_customer("cust-1", "conn-1");
        fanout.join_admin_list("conn-1");
        fanout.watch_session("s1", "conn-1");
        assert_eq!(fanout.connection_count(), 1);

        fanout.unregister("conn-1");
        assert_eq!(fanout.connection_count(), 0);

        fanout.publish_customer_message("s1", "cust-1", &make_msg("m1"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn delivery_error_goes_to_one_connection_only() {
        let fanout = ChatFanout::new();

        let (tx1, mut rx1) = mpsc::channel(8);
        let (tx2, mut rx2) = mpsc::channel(8);
        fanout.register("conn-1", tx1);
        fanout.register("conn-2", tx2);

        fanout.notify_delivery_error("conn-1", "malformed payload");

        let payload = rx1.try_recv().unwrap();
        assert!(payload.contains("\"type\":\"delivery_error\""));
        assert!(payload.contains("malformed payload"));
        assert!(rx2.try_recv().is_err());
    }
}
