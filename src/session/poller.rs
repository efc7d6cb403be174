//! Periodic inbox refresh for the active lease.

use crate::backends::traits::Backend;
use crate::types::{LeaseId, Message, POLL_INTERVAL};
use crate::utils::metrics;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::{debug, warn};

/// Fetches a lease's messages every [`POLL_INTERVAL`] and hands each snapshot
/// to a callback.
///
/// The first fetch runs immediately. Every successful fetch is a full replace;
/// failed fetches are skipped so the receiver keeps its last good snapshot.
/// After cancellation no snapshot is delivered, including one from a fetch
/// that was already in flight.
#[derive(Debug)]
pub struct InboxPoller {
    lease_id: LeaseId,
    cancel: CancellationToken,
}

impl InboxPoller {
    /// Start polling with a fresh cancellation token.
    pub fn start<B, F>(backend: B, lease_id: LeaseId, on_snapshot: F) -> Self
    where
        B: Backend,
        F: Fn(Vec<Message>) + Send + Sync + 'static,
    {
        Self::start_with_token(backend, lease_id, CancellationToken::new(), on_snapshot)
    }

    /// Start polling under an existing cancellation token.
    pub fn start_with_token<B, F>(
        backend: B,
        lease_id: LeaseId,
        cancel: CancellationToken,
        on_snapshot: F,
    ) -> Self
    where
        B: Backend,
        F: Fn(Vec<Message>) + Send + Sync + 'static,
    {
        tokio::spawn(run(backend, lease_id.clone(), cancel.clone(), on_snapshot));
        Self { lease_id, cancel }
    }

    /// Lease being polled.
    pub fn lease_id(&self) -> &LeaseId {
        &self.lease_id
    }

    /// Stop polling.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for InboxPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<B, F>(backend: B, lease_id: LeaseId, cancel: CancellationToken, on_snapshot: F)
where
    B: Backend,
    F: Fn(Vec<Message>) + Send + Sync + 'static,
{
    let mut ticker = interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    #[cfg(feature = "tracing")]
    debug!(lease_id = %lease_id, "Inbox polling started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            fetched = backend.get_messages(&lease_id) => fetched,
        };

        match fetched {
            Ok(messages) => {
                if cancel.is_cancelled() {
                    break;
                }
                on_snapshot(messages);
            }
            Err(_e) => {
                metrics::poll_failed();

                #[cfg(feature = "tracing")]
                warn!(lease_id = %lease_id, error = %_e, "Inbox fetch failed, keeping last snapshot");
            }
        }
    }

    #[cfg(feature = "tracing")]
    debug!(lease_id = %lease_id, "Inbox polling stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryBackend, InMemoryBackendConfig};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    type Snapshots = Arc<Mutex<Vec<Vec<Message>>>>;

    fn recorder() -> (Snapshots, impl Fn(Vec<Message>) + Send + Sync + 'static) {
        let snapshots: Snapshots = Arc::new(Mutex::new(Vec::new()));
        let handle = Arc::clone(&snapshots);
        (snapshots, move |messages| {
            handle.lock().unwrap().push(messages);
        })
    }

    async fn backend_with_lease() -> (InMemoryBackend, LeaseId) {
        let backend = InMemoryBackend::new(
            InMemoryBackendConfig::default()
                .without_simulated_delivery()
                .with_seed(11),
        );
        let lease = backend.generate_phone("US").await.unwrap();
        (backend, lease.id)
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_fetch_then_every_interval() {
        let (backend, lease_id) = backend_with_lease().await;
        let (snapshots, on_snapshot) = recorder();
        let _poller = InboxPoller::start(backend, lease_id, on_snapshot);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(snapshots.lock().unwrap().len(), 1);

        tokio::time::sleep(POLL_INTERVAL * 2).await;
        assert_eq!(snapshots.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshots_replace_with_backend_contents() {
        let (backend, lease_id) = backend_with_lease().await;
        let (snapshots, on_snapshot) = recorder();
        let _poller = InboxPoller::start(backend.clone(), lease_id.clone(), on_snapshot);

        tokio::time::sleep(Duration::from_millis(100)).await;
        backend.deliver(&lease_id, "+100", "code 1").unwrap();
        backend.deliver(&lease_id, "+100", "code 2").unwrap();
        tokio::time::sleep(POLL_INTERVAL).await;

        let snapshots = snapshots.lock().unwrap();
        assert!(snapshots[0].is_empty());
        let latest = snapshots.last().unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].body, "code 2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_skipped_and_polling_continues() {
        let (backend, lease_id) = backend_with_lease().await;
        backend.deliver(&lease_id, "+100", "hello").unwrap();
        let (snapshots, on_snapshot) = recorder();
        let _poller = InboxPoller::start(backend.clone(), lease_id, on_snapshot);

        tokio::time::sleep(Duration::from_millis(100)).await;
        backend.set_offline(true);
        tokio::time::sleep(POLL_INTERVAL * 2).await;
        assert_eq!(snapshots.lock().unwrap().len(), 1);

        backend.set_offline(false);
        tokio::time::sleep(POLL_INTERVAL).await;
        let snapshots = snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_delivery() {
        let (backend, lease_id) = backend_with_lease().await;
        let (snapshots, on_snapshot) = recorder();
        let poller = InboxPoller::start(backend, lease_id, on_snapshot);

        tokio::time::sleep(Duration::from_millis(100)).await;
        poller.cancel();
        assert!(poller.is_cancelled());
        tokio::time::sleep(POLL_INTERVAL * 5).await;
        assert_eq!(snapshots.lock().unwrap().len(), 1);
    }

    /// Backend whose inbox fetches take two seconds.
    #[derive(Debug, Clone)]
    struct SlowInbox(InMemoryBackend);

    impl Backend for SlowInbox {
        type Error = crate::memory::MemoryBackendError;

        async fn generate_phone(
            &self,
            country: &str,
        ) -> Result<crate::types::PhoneLease, Self::Error> {
            self.0.generate_phone(country).await
        }

        async fn get_messages(&self, lease_id: &LeaseId) -> Result<Vec<Message>, Self::Error> {
            tokio::time::sleep(Duration::from_secs(2)).await;
            self.0.get_messages(lease_id).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_fetch_in_flight() {
        let (backend, lease_id) = backend_with_lease().await;
        backend.deliver(&lease_id, "+100", "never shown").unwrap();
        let (snapshots, on_snapshot) = recorder();
        let poller = InboxPoller::start(SlowInbox(backend), lease_id, on_snapshot);

        // First fetch is pending until t = 2 s
        tokio::time::sleep(Duration::from_secs(1)).await;
        poller.cancel();
        tokio::time::sleep(POLL_INTERVAL * 3).await;
        assert!(snapshots.lock().unwrap().is_empty());
    }
}
