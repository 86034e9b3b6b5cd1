//! Client representation
//!
//! A `Client` is one connection registered with the broker: its id and the
//! sending side of the channel the broker pushes that connection's
//! messages into. The channel is drained by the connection's own task, so
//! the broker never waits on a slow reader.

use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::broker::Message;

pub type SubscriberId = String;

#[derive(Debug)]
pub struct Client {
    pub id: SubscriberId,
    pub sender: UnboundedSender<Message>,
}

impl Client {
    /// Create a new client with a random UUID as its id.
    pub fn new(sender: UnboundedSender<Message>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), sender)
    }

    pub fn with_id(id: impl Into<SubscriberId>, sender: UnboundedSender<Message>) -> Self {
        Self {
            id: id.into(),
            sender,
        }
    }
}
