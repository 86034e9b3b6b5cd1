//! Device side of the command protocol.
//!
//! A responder listens on its device's request topic, authenticates every
//! command against the server's public key, runs a handler and publishes
//! the signed reply on the response topic. Unauthenticated or malformed
//! commands are dropped without a reply.

use std::sync::Arc;

use tokio::task::JoinHandle;

use super::{DeviceId, DeviceTopics};
use crate::codec::{self, DeviceRequest, DeviceResponse};
use crate::crypto::{PrivateKey, PublicKey};
use crate::envelope;
use crate::registry::CorrelationRegistry;
use crate::transport::Transport;
use crate::utils::error::TransportError;

pub struct DeviceResponder<T: Transport> {
    transport: Arc<T>,
    device_id: DeviceId,
    key: PrivateKey,
    server_key: PublicKey,
    registry: Arc<CorrelationRegistry>,
}

impl<T: Transport> DeviceResponder<T> {
    pub fn new(transport: Arc<T>, device_id: DeviceId, key: PrivateKey, server_key: PublicKey) -> Self {
        Self {
            transport,
            device_id,
            key,
            server_key,
            registry: CorrelationRegistry::new(),
        }
    }

    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Serves commands until the subscription ends.
    pub async fn run<F>(&self, handler: F) -> Result<(), TransportError>
    where
        F: Fn(&DeviceRequest) -> DeviceResponse + Send + Sync,
    {
        let topics = DeviceTopics::for_device(&self.device_id);
        let mut waiter = self.registry.register(&topics.request);
        self.transport
            .subscribe(&topics.request, waiter.delivery())
            .await?;
        tracing::info!(device = %self.device_id, topic = %topics.request, "device listening");

        while let Some(frame) = waiter.recv().await {
            let Some(reply) = self.answer(&frame, &handler) else {
                continue;
            };
            if let Err(e) = self.transport.publish(&topics.response, reply).await {
                tracing::warn!(device = %self.device_id, "failed to publish reply: {e}");
            }
        }

        self.transport.unsubscribe(&topics.request).await
    }

    /// Runs the responder on its own task.
    pub fn spawn<F>(self, handler: F) -> JoinHandle<Result<(), TransportError>>
    where
        F: Fn(&DeviceRequest) -> DeviceResponse + Send + Sync + 'static,
    {
        tokio::spawn(async move { self.run(handler).await })
    }

    fn answer<F>(&self, frame: &[u8], handler: &F) -> Option<Vec<u8>>
    where
        F: Fn(&DeviceRequest) -> DeviceResponse,
    {
        let (payload, signature) = match envelope::split(frame) {
            Ok(parts) => parts,
            Err(e) => {
                tracing::debug!(device = %self.device_id, "dropping malformed command: {e}");
                return None;
            }
        };
        if !self.server_key.verify(payload, &signature) {
            tracing::warn!(device = %self.device_id, "dropping command with invalid signature");
            return None;
        }
        let request: DeviceRequest = match codec::decode(payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!(device = %self.device_id, "dropping undecodable command: {e}");
                return None;
            }
        };

        let mut response = handler(&request);
        response.correlation_data = request.correlation_data.clone();

        let body = match codec::encode(&response) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(device = %self.device_id, "failed to encode reply: {e}");
                return None;
            }
        };
        tracing::debug!(
            device = %self.device_id,
            correlation = %request.correlation_data,
            command = %request.command,
            "answering command"
        );
        Some(envelope::combine(&self.key.sign(&body), &body))
    }
}
