//! The `error` module defines the error types used within `cmdrelay`.
//!
//! Errors are grouped by the layer that produces them. Only `ExchangeError`
//! reaches the caller of a command exchange; the per-message errors
//! (`CodecError`, `FrameError`, `SignatureError`) are absorbed by the
//! exchange loop when they come from the wire.

use std::time::Duration;

use thiserror::Error;

use crate::device::DeviceId;

/// Serialization failures of command payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode payload: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode payload: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Failures converting a signature from its text form.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("invalid signature encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("invalid signature size: expected {expected} bytes, received {received}")]
    InvalidSize { expected: usize, received: usize },
}

/// A key that does not have the shape the signature scheme expects.
#[derive(Debug, Error)]
pub enum KeyFormatError {
    #[error("invalid key encoding: {0}")]
    InvalidEncoding(#[from] base64::DecodeError),

    #[error("invalid key length: expected {expected} bytes, received {received}")]
    InvalidLength { expected: usize, received: usize },

    #[error("bytes are not a valid public key")]
    InvalidKey,
}

/// A wire message that is not a well-formed signed envelope.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("missing signature separator")]
    MissingSeparator,

    #[error("invalid signature length: expected {expected} chars, received {received}")]
    InvalidSignatureLength { expected: usize, received: usize },

    #[error("invalid signature: {0}")]
    Signature(#[from] SignatureError),
}

/// Failures of the publish/subscribe plumbing.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport connection is closed")]
    Closed,

    #[error("payload is not valid UTF-8")]
    NotUtf8,

    #[error("failed to serialize transport message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failures establishing a transport connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tungstenite::Error),

    #[error("connection not established within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum DeviceIdError {
    #[error("invalid device id encoding: {0}")]
    InvalidEncoding(#[from] hex::FromHexError),

    #[error("invalid device id length: expected {expected} bytes, received {received}")]
    InvalidLength { expected: usize, received: usize },
}

/// Outcome of a failed command exchange.
#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to encode request: {0}")]
    Encoding(#[source] CodecError),

    #[error("invalid device public key: {0}")]
    KeyFormat(#[from] KeyFormatError),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("device timeout")]
    DeviceTimeout,

    #[error("unknown device: {0}")]
    UnknownDevice(DeviceId),
}
