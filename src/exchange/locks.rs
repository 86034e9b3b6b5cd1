use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::device::DeviceId;

/// One async lock per device, so at most one exchange per device holds its
/// reply topic at a time. Later callers queue in FIFO order.
#[derive(Debug, Default)]
pub struct DeviceLocks {
    locks: Mutex<HashMap<DeviceId, Arc<AsyncMutex<()>>>>,
}

impl DeviceLocks {
    pub async fn acquire(&self, id: DeviceId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Unused locks are only referenced by the map.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(id).or_default().clone()
        };
        lock.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
