//! The `transport` module is the publish/subscribe plumbing command
//! exchanges run over.
//!
//! `Transport` is the contract the exchange layer consumes. Inbound
//! messages are not handed to callbacks: a subscriber passes a `Delivery`
//! handle and the transport's own delivery task pushes into it.
//!
//! Implementations:
//! - `MemoryTransport`: an in-process connection to a shared `Broker`.
//! - `WebSocketTransport`: a connection to the bundled WebSocket broker
//!   served by `server::start_websocket_server`.

pub mod memory;
pub mod message;
pub mod routes;
pub mod server;
pub mod websocket;

use async_trait::async_trait;

use crate::registry::Delivery;
use crate::utils::error::TransportError;

pub use memory::MemoryTransport;
pub use message::{ClientMessage, ServerMessage};
pub use server::{serve, start_websocket_server};
pub use websocket::WebSocketTransport;

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Routes messages published on `topic` to `delivery`. Subscribing a
    /// topic again replaces its handler.
    async fn subscribe(&self, topic: &str, delivery: Delivery) -> Result<(), TransportError>;

    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Stops routing `topic`. Unsubscribing an unknown topic is a no-op.
    async fn unsubscribe(&self, topic: &str) -> Result<(), TransportError>;
}
