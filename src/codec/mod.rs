//! The `codec` module turns command payloads into bytes and back.
//!
//! The format is JSON; the codec knows nothing about signatures or topics.

pub mod message;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::utils::error::CodecError;

pub use message::{CorrelationToken, DeviceRequest, DeviceResponse, ResponseStatus};

/// Serializes a payload to bytes.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(CodecError::Encode)
}

/// Deserializes a payload from bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(CodecError::Decode)
}

#[cfg(test)]
mod tests;
