use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

use crate::registry::{CorrelationRegistry, Waiter};
use crate::transport::Transport;
use crate::utils::error::TransportError;

/// An exchange's subscription to its reply topic.
///
/// Torn down exactly once: by `close` on every normal exit, or by `Drop`
/// when the exchange future is cancelled. In the second case the registry
/// entry goes away at once and the transport unsubscribe runs on a spawned
/// task that keeps holding the device lock until it is done, so the next
/// exchange to the same device cannot subscribe before it.
pub(crate) struct ReplySubscription<T: Transport> {
    transport: Arc<T>,
    waiter: Waiter,
    device_lock: Option<OwnedMutexGuard<()>>,
    open: bool,
}

impl<T: Transport> ReplySubscription<T> {
    pub(crate) async fn open(
        transport: Arc<T>,
        registry: &Arc<CorrelationRegistry>,
        topic: &str,
        device_lock: OwnedMutexGuard<()>,
    ) -> Result<Self, TransportError> {
        let waiter = registry.register(topic);
        // On failure the waiter drops and takes its registry entry with it.
        transport.subscribe(topic, waiter.delivery()).await?;
        Ok(Self {
            transport,
            waiter,
            device_lock: Some(device_lock),
            open: true,
        })
    }

    pub(crate) async fn recv(&mut self) -> Option<Vec<u8>> {
        self.waiter.recv().await
    }

    pub(crate) async fn close(mut self) {
        self.open = false;
        self.waiter.close();
        if let Err(e) = self.transport.unsubscribe(self.waiter.topic()).await {
            tracing::warn!(topic = %self.waiter.topic(), "failed to unsubscribe: {e}");
        }
        self.device_lock.take();
    }
}

impl<T: Transport> Drop for ReplySubscription<T> {
    fn drop(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.waiter.close();

        let transport = self.transport.clone();
        let topic = self.waiter.topic().to_string();
        let device_lock = self.device_lock.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = transport.unsubscribe(&topic).await {
                        tracing::warn!(%topic, "failed to unsubscribe after cancellation: {e}");
                    }
                    drop(device_lock);
                });
            }
            Err(_) => {
                tracing::warn!(%topic, "no runtime to unsubscribe cancelled exchange");
            }
        }
    }
}
