//! Correlation registry
//!
//! Maps a reply topic to the waiter of the exchange currently expecting a
//! reply on it. Transports never hold a waiter directly: they get a
//! `Delivery` handle and push inbound bytes through the registry, which
//! forwards them to the live waiter, if any.
//!
//! Delivery never blocks the producer. Each waiter owns an unbounded
//! channel, so everything arriving while the exchange is waiting reaches it
//! no matter how much noise comes first. A message is dropped only when no
//! waiter is registered for the topic or the waiter has been closed; a late
//! reply arriving after its exchange ended is therefore discarded.
//!
//! Dropping a `Waiter` removes its entry. Entries carry a generation so a
//! stale waiter never removes a newer registration for the same topic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

#[derive(Debug)]
struct Entry {
    generation: u64,
    sender: mpsc::UnboundedSender<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct CorrelationRegistry {
    entries: Mutex<HashMap<String, Entry>>,
    next_generation: AtomicU64,
}

impl CorrelationRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a waiter for `topic`, replacing any previous one.
    pub fn register(self: &Arc<Self>, topic: &str) -> Waiter {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::unbounded_channel();

        let previous = self
            .entries()
            .insert(topic.to_string(), Entry { generation, sender });
        if previous.is_some() {
            tracing::warn!(topic, "replacing live waiter");
        }

        Waiter {
            topic: topic.to_string(),
            generation,
            receiver,
            registry: self.clone(),
        }
    }

    /// Routes `payload` to the waiter of `topic`. Returns whether it was
    /// handed over; a missing or closed waiter is not an error.
    pub fn deliver(&self, topic: &str, payload: Vec<u8>) -> bool {
        let entries = self.entries();
        let Some(entry) = entries.get(topic) else {
            tracing::debug!(topic, "no waiter, dropping message");
            return false;
        };

        match entry.sender.send(payload) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(topic, "waiter is gone, dropping message");
                false
            }
        }
    }

    /// Removes the waiter of `topic`. Idempotent.
    pub fn unregister(&self, topic: &str) -> bool {
        self.entries().remove(topic).is_some()
    }

    fn unregister_generation(&self, topic: &str, generation: u64) -> bool {
        let mut entries = self.entries();
        match entries.get(topic) {
            Some(entry) if entry.generation == generation => {
                entries.remove(topic);
                true
            }
            _ => false,
        }
    }

    pub fn is_registered(&self, topic: &str) -> bool {
        self.entries().contains_key(topic)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A delivery handle routing into this registry for `topic`.
    pub fn delivery(self: &Arc<Self>, topic: &str) -> Delivery {
        Delivery {
            topic: topic.to_string(),
            generation: None,
            registry: self.clone(),
        }
    }
}

/// Receiving side of a registration.
#[derive(Debug)]
pub struct Waiter {
    topic: String,
    generation: u64,
    receiver: mpsc::UnboundedReceiver<Vec<u8>>,
    registry: Arc<CorrelationRegistry>,
}

impl Waiter {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Next inbound message, or `None` once the registration is gone.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.receiver.recv().await
    }

    /// A delivery handle bound to this registration.
    pub fn delivery(&self) -> Delivery {
        Delivery {
            topic: self.topic.clone(),
            generation: Some(self.generation),
            registry: self.registry.clone(),
        }
    }

    /// Removes this waiter's entry so later deliveries are dropped.
    pub fn close(&mut self) {
        self.registry
            .unregister_generation(&self.topic, self.generation);
        self.receiver.close();
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        self.registry
            .unregister_generation(&self.topic, self.generation);
    }
}

/// Message-passing handle handed to a transport in place of a callback.
#[derive(Debug, Clone)]
pub struct Delivery {
    topic: String,
    generation: Option<u64>,
    registry: Arc<CorrelationRegistry>,
}

impl Delivery {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn deliver(&self, payload: Vec<u8>) -> bool {
        self.registry.deliver(&self.topic, payload)
    }

    /// Ends the registration behind this handle, for a transport whose
    /// connection is gone. The waiter sees its stream end. A handle bound
    /// to a waiter never removes a newer registration of the topic.
    pub fn close(&self) -> bool {
        match self.generation {
            Some(generation) => self
                .registry
                .unregister_generation(&self.topic, generation),
            None => self.registry.unregister(&self.topic),
        }
    }
}
