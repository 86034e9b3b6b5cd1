use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Transport;
use super::routes::RouteTable;
use crate::broker::{Broker, Message};
use crate::client::{Client, SubscriberId};
use crate::registry::Delivery;
use crate::utils::error::TransportError;

/// In-process connection to a shared broker.
///
/// Messages the broker pushes to this connection are routed by a dedicated
/// task, which is the delivery context for every subscription made through
/// it. Must be created inside a Tokio runtime.
#[derive(Debug)]
pub struct MemoryTransport {
    broker: Arc<Mutex<Broker>>,
    client_id: SubscriberId,
    routes: RouteTable,
    pump: JoinHandle<()>,
}

impl MemoryTransport {
    pub fn connect(broker: Arc<Mutex<Broker>>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        let client = Client::new(tx);
        let client_id = client.id.clone();
        lock(&broker).register_client(client);

        let routes = RouteTable::default();
        let pump = {
            let routes = routes.clone();
            tokio::spawn(async move {
                while let Some(msg) = rx.recv().await {
                    routes.dispatch(&msg.topic, msg.payload.into_bytes());
                }
            })
        };

        Self {
            broker,
            client_id,
            routes,
            pump,
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

fn lock(broker: &Mutex<Broker>) -> MutexGuard<'_, Broker> {
    broker.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn subscribe(&self, topic: &str, delivery: Delivery) -> Result<(), TransportError> {
        self.routes.insert(topic, delivery);
        lock(&self.broker).subscribe(topic, self.client_id.clone());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let payload = String::from_utf8(payload).map_err(|_| TransportError::NotUtf8)?;
        lock(&self.broker).publish(Message::new(topic, payload));
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<(), TransportError> {
        self.routes.remove(topic);
        lock(&self.broker).unsubscribe(topic, &self.client_id);
        Ok(())
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.pump.abort();
        lock(&self.broker).cleanup_client(&self.client_id);
    }
}
