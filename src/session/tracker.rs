//! Countdown and expiry tracking for a single lease.

use crate::types::{COUNTDOWN_TICK, CountdownState, LeaseId, PhoneLease};
use crate::utils::clock::Clock;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Lifecycle of a tracked lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseState {
    /// The lease is running.
    Active,
    /// The lease ran out. Terminal.
    Expired,
}

/// Re-checks a lease's expiry every tick and fires a callback once it runs out.
///
/// The first check happens immediately. The callback runs exactly once, from
/// the tracker's own task, and never after [`ExpiryTracker::cancel`] or drop.
///
/// # Example
///
/// ```rust,ignore
/// let tracker = ExpiryTracker::start(&lease, clock, || println!("expired"));
/// println!("{} left", tracker.countdown());
/// ```
#[derive(Debug)]
pub struct ExpiryTracker {
    lease_id: LeaseId,
    countdown: watch::Receiver<CountdownState>,
    cancel: CancellationToken,
}

impl ExpiryTracker {
    /// Start tracking `lease` with the standard one-second tick.
    pub fn start<F>(lease: &PhoneLease, clock: Arc<dyn Clock>, on_expired: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self::start_with_token(lease, clock, CancellationToken::new(), on_expired)
    }

    /// Start tracking under an existing cancellation token.
    ///
    /// Cancelling `cancel` (or a parent of it) stops the tracker.
    pub fn start_with_token<F>(
        lease: &PhoneLease,
        clock: Arc<dyn Clock>,
        cancel: CancellationToken,
        on_expired: F,
    ) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let initial = CountdownState::at(lease.expires_at, clock.now());
        let (tx, rx) = watch::channel(initial);

        tokio::spawn(run(
            lease.id.clone(),
            lease.expires_at,
            clock,
            tx,
            cancel.clone(),
            on_expired,
        ));

        Self {
            lease_id: lease.id.clone(),
            countdown: rx,
            cancel,
        }
    }

    /// Lease being tracked.
    pub fn lease_id(&self) -> &LeaseId {
        &self.lease_id
    }

    /// Countdown as of the latest tick.
    pub fn countdown(&self) -> CountdownState {
        *self.countdown.borrow()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LeaseState {
        if self.countdown().is_expired() {
            LeaseState::Expired
        } else {
            LeaseState::Active
        }
    }

    /// Receiver notified on every tick.
    pub fn subscribe(&self) -> watch::Receiver<CountdownState> {
        self.countdown.clone()
    }

    /// Stop re-checking. The callback will not fire afterwards.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for ExpiryTracker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<F>(
    _lease_id: LeaseId,
    expires_at: DateTime<Utc>,
    clock: Arc<dyn Clock>,
    tx: watch::Sender<CountdownState>,
    cancel: CancellationToken,
    on_expired: F,
) where
    F: FnOnce() + Send + 'static,
{
    let mut ticker = interval(COUNTDOWN_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    #[cfg(feature = "tracing")]
    debug!(lease_id = %_lease_id, expires_at = %expires_at, "Countdown started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                #[cfg(feature = "tracing")]
                debug!(lease_id = %_lease_id, "Countdown cancelled");
                return;
            }
            _ = ticker.tick() => {}
        }

        let state = CountdownState::at(expires_at, clock.now());
        tx.send_replace(state);

        if state.is_expired() {
            if cancel.is_cancelled() {
                return;
            }
            #[cfg(feature = "tracing")]
            info!(lease_id = %_lease_id, "Lease expired");

            on_expired();
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LEASE_DURATION;
    use crate::utils::clock::TokioClock;
    use chrono::TimeDelta;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn setup() -> (PhoneLease, Arc<dyn Clock>) {
        let clock = TokioClock::new();
        let lease = PhoneLease::new("lease-1", "+1 (555) 555-5555", "US", clock.now());
        (lease, Arc::new(clock))
    }

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let fired = Arc::new(AtomicUsize::new(0));
        let handle = Arc::clone(&fired);
        (fired, move || {
            handle.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_at_start_then_decreasing() {
        let (lease, clock) = setup();
        let (_fired, on_expired) = counter();
        let tracker = ExpiryTracker::start(&lease, clock, on_expired);

        assert_eq!(tracker.countdown().fraction_remaining, 1.0);
        assert_eq!(tracker.state(), LeaseState::Active);

        tokio::time::sleep(Duration::from_millis(500)).await;
        let mut previous = tracker.countdown().fraction_remaining;
        for _ in 0..5 {
            tokio::time::sleep(COUNTDOWN_TICK).await;
            let current = tracker.countdown().fraction_remaining;
            assert!(current < previous, "{current} should be below {previous}");
            previous = current;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_within_one_tick_of_expiry() {
        let (lease, clock) = setup();
        let (fired, on_expired) = counter();
        let tracker = ExpiryTracker::start(&lease, clock, on_expired);

        tokio::time::sleep(LEASE_DURATION - Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.state(), LeaseState::Active);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.state(), LeaseState::Expired);
        assert_eq!(tracker.countdown().remaining_ms(), 0);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_expired_lease_fires_immediately() {
        let clock = TokioClock::new();
        let lease = PhoneLease::new(
            "old",
            "+1 (555) 555-5555",
            "US",
            clock.now() - TimeDelta::hours(2),
        );
        let (fired, on_expired) = counter();
        let _tracker = ExpiryTracker::start(&lease, Arc::new(clock), on_expired);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_callback() {
        let (lease, clock) = setup();
        let (fired, on_expired) = counter();
        let tracker = ExpiryTracker::start(&lease, clock, on_expired);

        tracker.cancel();
        assert!(tracker.is_cancelled());
        tokio::time::sleep(LEASE_DURATION + Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_tracking() {
        let (lease, clock) = setup();
        let (fired, on_expired) = counter();
        let tracker = ExpiryTracker::start(&lease, clock, on_expired);
        let countdown = tracker.subscribe();

        drop(tracker);
        tokio::time::sleep(LEASE_DURATION + Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(countdown.has_changed().is_err());
    }
}
