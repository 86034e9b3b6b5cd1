//! Message definitions for the broker
//!
//! - `topic`: topic name used for routing
//! - `payload`: the published text; for command traffic this is a signed
//!   envelope
//! - `timestamp`: milliseconds since UNIX epoch; set by the broker on publish
//!   when the publisher left it at zero
//! - `message_id`: opaque unique id, generated by the broker when empty

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub topic: String,
    pub payload: String,
    pub timestamp: i64,
    pub message_id: String,
}

impl Message {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            timestamp: 0,
            message_id: String::new(),
        }
    }
}
