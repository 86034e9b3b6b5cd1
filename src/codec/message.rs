//! Command payloads exchanged with devices.
//!
//! Both directions carry the `correlationData` field: the server picks a
//! fresh token per request and the device copies it into its reply. The
//! token travels inside the signed payload, so it is only trusted once the
//! reply signature has been verified.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque value matching a reply to the request it answers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    /// A fresh random token.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationToken {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CorrelationToken {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A command sent to a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRequest {
    pub correlation_data: CorrelationToken,
    pub command: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl DeviceRequest {
    /// Builds a request with a freshly generated correlation token.
    pub fn new(command: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            correlation_data: CorrelationToken::generate(),
            command: command.into(),
            params,
        }
    }

    pub fn with_correlation(mut self, token: impl Into<CorrelationToken>) -> Self {
        self.correlation_data = token.into();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// A device's answer to a `DeviceRequest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceResponse {
    pub correlation_data: CorrelationToken,
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub state: Map<String, Value>,
}

impl DeviceResponse {
    /// A successful reply to `request` reporting `state`.
    pub fn success(request: &DeviceRequest, state: Map<String, Value>) -> Self {
        Self {
            correlation_data: request.correlation_data.clone(),
            status: ResponseStatus::Success,
            error: None,
            state,
        }
    }

    /// A failed reply to `request`.
    pub fn failure(request: &DeviceRequest, error: impl Into<String>) -> Self {
        Self {
            correlation_data: request.correlation_data.clone(),
            status: ResponseStatus::Error,
            error: Some(error.into()),
            state: Map::new(),
        }
    }
}
