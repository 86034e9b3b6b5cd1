//! The broker routes published messages to topic subscribers.
//!
//! It backs both the in-process `MemoryTransport` and the bundled WebSocket
//! server.

pub mod engine;
pub mod message;

pub use engine::Broker;
pub use message::Message;

#[cfg(test)]
mod tests;
