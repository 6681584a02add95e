//! Per-event lock registry.
//!
//! Registration and cancellation for one event are serialized through an
//! async mutex so capacity checks and the writes they guard are atomic.
//! Different events use different locks and never contend with each other.
//! Acquisition is bounded: a caller that cannot get the lock within the
//! configured timeout fails with `Busy` instead of queueing unboundedly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rendezvous_common::{AppError, AppResult};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-event mutexes, keyed by event ID.
#[derive(Clone)]
pub struct EventLockRegistry {
    locks: Arc<std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    acquire_timeout: Duration,
}

/// Guard proving the holder owns an event's lock. Released on drop.
#[derive(Debug)]
pub struct EventLockGuard {
    _guard: OwnedMutexGuard<()>,
}

impl EventLockRegistry {
    /// Create a registry with the given acquisition timeout.
    #[must_use]
    pub fn new(acquire_timeout_ms: u64) -> Self {
        Self {
            locks: Arc::new(std::sync::Mutex::new(HashMap::new())),
            acquire_timeout: Duration::from_millis(acquire_timeout_ms),
        }
    }

    /// Acquire the lock for one event, waiting at most the configured
    /// timeout. Times out with `AppError::Busy`.
    pub async fn acquire(&self, event_id: &str) -> AppResult<EventLockGuard> {
        let mutex = {
            let mut locks = self
                .locks
                .lock()
                .map_err(|_| AppError::Internal("event lock registry poisoned".to_string()))?;
            locks
                .entry(event_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        match tokio::time::timeout(self.acquire_timeout, mutex.lock_owned()).await {
            Ok(guard) => Ok(EventLockGuard { _guard: guard }),
            Err(_) => Err(AppError::Busy(event_id.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_event_serializes() {
        let registry = EventLockRegistry::new(50);
        let guard = registry.acquire("ev1").await.unwrap();

        let result = registry.acquire("ev1").await;
        assert!(matches!(result, Err(AppError::Busy(_))));

        drop(guard);
        assert!(registry.acquire("ev1").await.is_ok());
    }

    #[tokio::test]
    async fn test_different_events_do_not_contend() {
        let registry = EventLockRegistry::new(50);
        let _g1 = registry.acquire("ev1").await.unwrap();
        let _g2 = registry.acquire("ev2").await.unwrap();
    }

    #[tokio::test]
    async fn test_busy_is_retryable() {
        let registry = EventLockRegistry::new(10);
        let _guard = registry.acquire("ev1").await.unwrap();

        let err = registry.acquire("ev1").await.unwrap_err();
        assert!(err.is_retryable());
    }
}
