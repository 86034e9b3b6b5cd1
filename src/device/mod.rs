//! Devices: identity, topics derived from it, and where their public keys
//! come from.

pub mod directory;
pub mod responder;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::PublicKey;
use crate::utils::error::{DeviceIdError, KeyFormatError};

pub use directory::{DeviceDirectory, InMemoryDirectory};
pub use responder::DeviceResponder;

pub const DEVICE_ID_SIZE: usize = 12;

/// Device identity: 12 raw bytes, written as 24 lowercase hex chars.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId([u8; DEVICE_ID_SIZE]);

impl DeviceId {
    pub fn from_bytes(bytes: [u8; DEVICE_ID_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn random() -> Self {
        Self(rand::random())
    }

    pub fn as_bytes(&self) -> &[u8; DEVICE_ID_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl FromStr for DeviceId {
    type Err = DeviceIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)?;
        let raw: [u8; DEVICE_ID_SIZE] =
            bytes
                .try_into()
                .map_err(|bytes: Vec<u8>| DeviceIdError::InvalidLength {
                    expected: DEVICE_ID_SIZE,
                    received: bytes.len(),
                })?;
        Ok(Self(raw))
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.to_hex())
    }
}

impl Serialize for DeviceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for DeviceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A device as known to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: DeviceId,
    /// Base64 Ed25519 verification key.
    pub public_key: String,
}

impl Device {
    pub fn new(id: DeviceId, public_key: impl Into<String>) -> Self {
        Self {
            id,
            public_key: public_key.into(),
        }
    }

    pub fn verifying_key(&self) -> Result<PublicKey, KeyFormatError> {
        PublicKey::from_base64(&self.public_key)
    }
}

/// Command topics of one device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTopics {
    pub request: String,
    pub response: String,
}

impl DeviceTopics {
    pub fn for_device(id: &DeviceId) -> Self {
        Self {
            request: format!("{id}/command/request"),
            response: format!("{id}/command/response"),
        }
    }
}

#[cfg(test)]
mod tests;
