use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::registry::Delivery;

/// Per-connection table of subscribed topics and the delivery handle each
/// inbound message on that topic goes to. One handler per topic.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Arc<Mutex<HashMap<String, Delivery>>>,
}

impl RouteTable {
    fn routes(&self) -> MutexGuard<'_, HashMap<String, Delivery>> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns whether an earlier handler was replaced.
    pub fn insert(&self, topic: &str, delivery: Delivery) -> bool {
        self.routes().insert(topic.to_string(), delivery).is_some()
    }

    pub fn remove(&self, topic: &str) -> bool {
        self.routes().remove(topic).is_some()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.routes().contains_key(topic)
    }

    /// Drops every route and ends the registrations behind them. Used when
    /// the connection carrying the routes is gone.
    pub fn close_all(&self) -> usize {
        let routes: Vec<Delivery> = self.routes().drain().map(|(_, d)| d).collect();
        routes.iter().filter(|delivery| delivery.close()).count()
    }

    /// Hands `payload` to the handler of `topic`; unrouted topics are dropped.
    pub fn dispatch(&self, topic: &str, payload: Vec<u8>) -> bool {
        // Clone out so the registry is never called under this lock.
        let delivery = self.routes().get(topic).cloned();
        match delivery {
            Some(delivery) => delivery.deliver(payload),
            None => {
                tracing::debug!(topic, "message on unrouted topic dropped");
                false
            }
        }
    }
}
