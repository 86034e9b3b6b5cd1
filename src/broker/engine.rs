//! Broker engine
//!
//! In-memory topic routing shared by every connection of the bundled
//! broker:
//! - managing topics and subscriber lists
//! - tracking connected clients and their outbound channels
//! - fanning a published message out to every subscriber of its topic
//!
//! The API is synchronous and meant to be held behind a lock (for example
//! `Arc<Mutex<Broker>>`) by the transports. Sending to a client never
//! blocks: each client owns an unbounded channel drained by its own task.
//! Delivery is best effort; nothing is retried or persisted.

use std::collections::{HashMap, HashSet};

use crate::broker::message::Message;
use crate::client::{Client, SubscriberId};

#[derive(Debug, Default)]
pub struct Broker {
    /// Topic name to subscriber ids. Topics without subscribers are removed.
    pub topics: HashMap<String, HashSet<SubscriberId>>,
    pub clients: HashMap<SubscriberId, Client>,
}

impl Broker {
    pub fn new() -> Self {
        Self {
            topics: HashMap::new(),
            clients: HashMap::new(),
        }
    }

    pub fn register_client(&mut self, client: Client) {
        self.clients.insert(client.id.clone(), client);
    }

    pub fn remove_client(&mut self, client_id: &SubscriberId) {
        self.clients.remove(client_id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Subscribes a client to a topic. Creates the topic if it doesn't exist.
    pub fn subscribe(&mut self, topic: &str, subscriber: SubscriberId) {
        self.topics
            .entry(topic.to_string())
            .or_default()
            .insert(subscriber);
    }

    /// Unsubscribes a client from a topic. Topics left without subscribers
    /// are dropped.
    pub fn unsubscribe(&mut self, topic: &str, subscriber: &SubscriberId) {
        if let Some(subscribers) = self.topics.get_mut(topic) {
            subscribers.remove(subscriber);
            if subscribers.is_empty() {
                self.topics.remove(topic);
            }
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Publishes a message to all subscribers of its topic and returns how
    /// many of them it was handed to. A topic nobody listens on is not an
    /// error.
    pub fn publish(&self, mut msg: Message) -> usize {
        if msg.timestamp == 0 {
            msg.timestamp = chrono::Utc::now().timestamp_millis();
        }
        if msg.message_id.is_empty() {
            msg.message_id = uuid::Uuid::new_v4().to_string();
        }

        let Some(subscribers) = self.topics.get(&msg.topic) else {
            tracing::debug!(topic = %msg.topic, "no subscribers for topic");
            return 0;
        };

        let mut delivered = 0;
        for sub_id in subscribers {
            if let Some(client) = self.clients.get(sub_id) {
                if let Err(e) = client.sender.send(msg.clone()) {
                    tracing::warn!(subscriber = %sub_id, "failed to send: {e}");
                } else {
                    delivered += 1;
                }
            } else {
                tracing::warn!(subscriber = %sub_id, "no client registered");
            }
        }
        delivered
    }

    /// Removes a client and unsubscribes it from all topics.
    pub fn cleanup_client(&mut self, client_id: &SubscriberId) {
        self.remove_client(client_id);

        for subscribers in self.topics.values_mut() {
            subscribers.remove(client_id);
        }
        self.topics.retain(|_, subscribers| !subscribers.is_empty());

        tracing::debug!(client = %client_id, "cleaned up client");
    }
}
