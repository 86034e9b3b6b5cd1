//! Command client
//!
//! Turns the publish/subscribe transport into "send a command, await the
//! device's authenticated reply":
//!
//! 1. subscribe to `{device}/command/response`
//! 2. encode, sign and frame the request, publish to `{device}/command/request`
//! 3. wait for a reply or the deadline, whichever comes first
//! 4. per inbound message: split, decode, match the correlation token,
//!    verify the signature against the device key
//! 5. tear the subscription down on every exit
//!
//! Exchanges to one device are serialized; exchanges to different devices
//! run concurrently over the shared transport.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};

use super::inspect::{Verdict, inspect};
use super::locks::DeviceLocks;
use super::subscription::ReplySubscription;
use crate::codec::{self, CorrelationToken, DeviceRequest, DeviceResponse};
use crate::crypto::{PrivateKey, PublicKey};
use crate::device::{Device, DeviceDirectory, DeviceId, DeviceTopics};
use crate::envelope;
use crate::registry::CorrelationRegistry;
use crate::transport::Transport;
use crate::utils::error::{ExchangeError, TransportError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Subscribed,
    Published,
    Waiting,
    Resolved,
    TimedOut,
    Failed,
}

impl ExchangeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::TimedOut | Self::Failed)
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Subscribed => "subscribed",
            Self::Published => "published",
            Self::Waiting => "waiting",
            Self::Resolved => "resolved",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// State of one exchange, reported through tracing.
struct Progress<'a> {
    device: &'a DeviceId,
    correlation: &'a CorrelationToken,
    state: ExchangeState,
}

impl<'a> Progress<'a> {
    fn new(device: &'a DeviceId, correlation: &'a CorrelationToken) -> Self {
        Self {
            device,
            correlation,
            state: ExchangeState::Idle,
        }
    }

    fn advance(&mut self, next: ExchangeState) {
        tracing::debug!(
            device = %self.device,
            correlation = %self.correlation,
            from = %self.state,
            to = %next,
            "exchange state"
        );
        self.state = next;
    }
}

pub struct CommandClient<T: Transport> {
    transport: Arc<T>,
    key: PrivateKey,
    registry: Arc<CorrelationRegistry>,
    locks: DeviceLocks,
    directory: Option<Arc<dyn DeviceDirectory>>,
}

impl<T: Transport> CommandClient<T> {
    pub fn new(transport: Arc<T>, key: PrivateKey) -> Self {
        Self {
            transport,
            key,
            registry: CorrelationRegistry::new(),
            locks: DeviceLocks::default(),
            directory: None,
        }
    }

    pub fn with_directory(mut self, directory: Arc<dyn DeviceDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Key devices verify commands against.
    pub fn public_key(&self) -> PublicKey {
        self.key.public_key()
    }

    pub fn registry(&self) -> &Arc<CorrelationRegistry> {
        &self.registry
    }

    /// Like `send_and_await`, resolving the device through the directory.
    pub async fn send_to(
        &self,
        device_id: &DeviceId,
        request: &DeviceRequest,
        deadline: Duration,
    ) -> Result<DeviceResponse, ExchangeError> {
        let device = self
            .directory
            .as_ref()
            .and_then(|directory| directory.lookup(device_id))
            .ok_or(ExchangeError::UnknownDevice(*device_id))?;
        self.send_and_await(&device, request, deadline).await
    }

    /// Sends `request` to `device` and waits up to `deadline` for its
    /// authenticated reply.
    ///
    /// Time spent waiting for an earlier exchange with the same device
    /// counts against `deadline`.
    pub async fn send_and_await(
        &self,
        device: &Device,
        request: &DeviceRequest,
        deadline: Duration,
    ) -> Result<DeviceResponse, ExchangeError> {
        let expires = Instant::now() + deadline;
        let mut progress = Progress::new(&device.id, &request.correlation_data);

        let result = self.exchange(device, request, expires, &mut progress).await;
        match &result {
            Ok(_) => progress.advance(ExchangeState::Resolved),
            Err(ExchangeError::DeviceTimeout) => progress.advance(ExchangeState::TimedOut),
            Err(e) => {
                progress.advance(ExchangeState::Failed);
                tracing::warn!(
                    device = %device.id,
                    correlation = %request.correlation_data,
                    "exchange failed: {e}"
                );
            }
        }
        result
    }

    async fn exchange(
        &self,
        device: &Device,
        request: &DeviceRequest,
        expires: Instant,
        progress: &mut Progress<'_>,
    ) -> Result<DeviceResponse, ExchangeError> {
        let device_key = device.verifying_key()?;
        let topics = DeviceTopics::for_device(&device.id);

        let device_lock = timeout_at(expires, self.locks.acquire(device.id))
            .await
            .map_err(|_| ExchangeError::DeviceTimeout)?;

        let mut subscription = ReplySubscription::open(
            self.transport.clone(),
            &self.registry,
            &topics.response,
            device_lock,
        )
        .await?;
        progress.advance(ExchangeState::Subscribed);

        let result = self
            .publish_and_wait(
                &mut subscription,
                &topics,
                request,
                &device_key,
                expires,
                progress,
            )
            .await;
        subscription.close().await;
        result
    }

    async fn publish_and_wait(
        &self,
        subscription: &mut ReplySubscription<T>,
        topics: &DeviceTopics,
        request: &DeviceRequest,
        device_key: &PublicKey,
        expires: Instant,
        progress: &mut Progress<'_>,
    ) -> Result<DeviceResponse, ExchangeError> {
        let body = codec::encode(request).map_err(ExchangeError::Encoding)?;
        let frame = envelope::combine(&self.key.sign(&body), &body);
        self.transport.publish(&topics.request, frame).await?;
        progress.advance(ExchangeState::Published);

        progress.advance(ExchangeState::Waiting);
        timeout_at(
            expires,
            Self::await_reply(subscription, request, device_key, progress),
        )
        .await
        .map_err(|_| ExchangeError::DeviceTimeout)?
    }

    async fn await_reply(
        subscription: &mut ReplySubscription<T>,
        request: &DeviceRequest,
        device_key: &PublicKey,
        progress: &Progress<'_>,
    ) -> Result<DeviceResponse, ExchangeError> {
        while let Some(frame) = subscription.recv().await {
            match inspect(&frame, &request.correlation_data, device_key) {
                Verdict::Accept(response) => return Ok(response),
                Verdict::Reject => {
                    tracing::warn!(
                        device = %progress.device,
                        correlation = %progress.correlation,
                        "reply signature does not match device key"
                    );
                    return Err(ExchangeError::InvalidSignature);
                }
                Verdict::Discard(reason) => {
                    tracing::debug!(
                        device = %progress.device,
                        correlation = %progress.correlation,
                        "discarding reply: {reason}"
                    );
                }
            }
        }
        // The registration was removed underneath the exchange.
        Err(TransportError::Closed.into())
    }
}
