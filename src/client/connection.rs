//! Connection lifecycle.
//!
//! A [`Connection`] owns the channel to the scoring server. Every call holds a
//! permit for its duration and is bounded by the per-call timeout. Closing
//! stops new calls, waits a bounded grace period for in-flight calls to drain
//! and then releases the channel. Dropping the last clone releases it as well,
//! so early returns never leak the channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use super::channel::{CallFuture, ScoringService};
use crate::error::{Result, StateLmError};

/// Upper bound on concurrent in-flight calls per connection.
const MAX_IN_FLIGHT: u32 = 1024;

struct Inner<S> {
    service: S,
    permits: Semaphore,
    capacity: u32,
    closed: AtomicBool,
    timeout: Duration,
    grace: Duration,
}

impl<S> Drop for Inner<S> {
    fn drop(&mut self) {
        tracing::debug!("scoring channel released");
    }
}

/// Shared handle to a scoring server channel.
pub struct Connection<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for Connection<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: ScoringService> Connection<S> {
    /// Wrap a channel with per-call timeout and close grace period.
    pub fn new(service: S, timeout: Duration, grace: Duration) -> Self {
        Self::with_capacity(service, timeout, grace, MAX_IN_FLIGHT)
    }

    /// Like [`new`](Self::new) with at most `capacity` calls in flight.
    pub fn with_capacity(service: S, timeout: Duration, grace: Duration, capacity: u32) -> Self {
        tracing::info!(channel = service.name(), ?timeout, capacity, "connection opened");
        Self {
            inner: Arc::new(Inner {
                service,
                permits: Semaphore::new(capacity as usize),
                capacity,
                closed: AtomicBool::new(false),
                timeout,
                grace,
            }),
        }
    }

    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Underlying channel.
    pub fn service(&self) -> &S {
        &self.inner.service
    }

    /// Run one call under a permit and the per-call deadline.
    pub async fn call<'a, T, F>(&'a self, f: F) -> Result<T>
    where
        F: FnOnce(&'a S) -> CallFuture<'a, T>,
    {
        if self.is_closed() {
            return Err(StateLmError::ConnectionClosed);
        }
        let _permit = self
            .inner
            .permits
            .acquire()
            .await
            .map_err(|_| StateLmError::ConnectionClosed)?;
        // A call still queued for a permit when close began must not start.
        if self.is_closed() {
            return Err(StateLmError::ConnectionClosed);
        }

        match tokio::time::timeout(self.inner.timeout, f(&self.inner.service)).await {
            Ok(result) => result,
            Err(_) => Err(StateLmError::Timeout(self.inner.timeout)),
        }
    }

    /// Stop accepting calls and drain in-flight ones for up to the grace period.
    ///
    /// Returns `true` if every in-flight call finished within the grace period.
    pub async fn close(&self) -> bool {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return true;
        }

        let drain = self.inner.permits.acquire_many(self.inner.capacity);
        tokio::pin!(drain);
        let drained = tokio::time::timeout(self.inner.grace, &mut drain).await;
        // Close before the pending drain is dropped so partially acquired
        // permits cannot be handed to a queued call.
        self.inner.permits.close();

        match drained {
            Ok(Ok(_)) => {
                tracing::info!("connection closed");
                true
            },
            _ => {
                tracing::warn!(
                    grace = ?self.inner.grace,
                    "connection closed with calls still in flight"
                );
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ContextRequest, LmScores, NextState, StateHandle, UpdateRequest};

    /// Channel whose calls sleep for a fixed delay.
    struct SlowService {
        delay: Duration,
    }

    impl ScoringService for SlowService {
        fn get_scores(&self, _request: ContextRequest) -> CallFuture<'_, LmScores> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                Ok::<_, StateLmError>(LmScores::default())
            })
        }

        fn update_scores(&self, _request: UpdateRequest) -> CallFuture<'_, LmScores> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                Ok::<_, StateLmError>(LmScores::default())
            })
        }

        fn get_next_state(&self, _request: ContextRequest) -> CallFuture<'_, NextState> {
            Box::pin(async move {
                tokio::time::sleep(self.delay).await;
                Ok::<_, StateLmError>(NextState {
                    next_state: StateHandle::INITIAL,
                })
            })
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    fn request() -> ContextRequest {
        ContextRequest {
            state: StateHandle::INITIAL,
            context: String::new(),
        }
    }

    #[tokio::test]
    async fn test_call_times_out() {
        let conn = Connection::new(
            SlowService {
                delay: Duration::from_millis(200),
            },
            Duration::from_millis(20),
            Duration::from_millis(10),
        );

        let err = conn.call(|s| s.get_scores(request())).await.unwrap_err();
        assert!(matches!(err, StateLmError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_calls_after_close_fail() {
        let conn = Connection::new(
            SlowService {
                delay: Duration::ZERO,
            },
            Duration::from_secs(1),
            Duration::from_millis(10),
        );

        assert!(conn.call(|s| s.get_scores(request())).await.is_ok());
        assert!(conn.close().await);
        assert!(conn.is_closed());

        let err = conn.call(|s| s.get_scores(request())).await.unwrap_err();
        assert!(matches!(err, StateLmError::ConnectionClosed));

        // Closing twice is harmless.
        assert!(conn.close().await);
    }

    #[tokio::test]
    async fn test_close_waits_for_in_flight_call() {
        let conn = Connection::new(
            SlowService {
                delay: Duration::from_millis(50),
            },
            Duration::from_secs(1),
            Duration::from_secs(1),
        );

        let worker = conn.clone();
        let in_flight =
            tokio::spawn(async move { worker.call(|s| s.get_scores(request())).await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(conn.close().await);
        assert!(in_flight.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_close_gives_up_after_grace() {
        let conn = Connection::new(
            SlowService {
                delay: Duration::from_millis(500),
            },
            Duration::from_secs(2),
            Duration::from_millis(20),
        );

        let worker = conn.clone();
        let in_flight =
            tokio::spawn(async move { worker.call(|s| s.get_scores(request())).await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!conn.close().await);
        in_flight.abort();
    }

    #[tokio::test]
    async fn test_call_queued_before_close_is_rejected() {
        let conn = Connection::with_capacity(
            SlowService {
                delay: Duration::from_millis(50),
            },
            Duration::from_secs(1),
            Duration::from_secs(1),
            1,
        );

        let first = conn.clone();
        let running = tokio::spawn(async move { first.call(|s| s.get_scores(request())).await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Queued behind the running call, ahead of the drain.
        let second = conn.clone();
        let queued = tokio::spawn(async move { second.call(|s| s.get_scores(request())).await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(conn.close().await);
        assert!(running.await.unwrap().is_ok());
        assert!(matches!(
            queued.await.unwrap(),
            Err(StateLmError::ConnectionClosed)
        ));
    }
}
