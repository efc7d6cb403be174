//! Session coordinator owning the active lease and its periodic tasks.

use super::clipboard::Clipboard;
use super::error::{Notice, SessionError};
use super::poller::InboxPoller;
use super::tracker::ExpiryTracker;
use crate::backends::traits::Backend;
use crate::countries::Country;
use crate::errors::RetryableError;
use crate::types::{COPIED_DISPLAY, CountdownState, LeaseId, Message, PhoneLease};
use crate::utils::clock::{Clock, TokioClock};
use crate::utils::metrics;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

/// Read-only view of a session, as a UI would render it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    /// The active lease, if any.
    pub lease: Option<PhoneLease>,
    /// Countdown of the active lease as of its latest tick.
    pub countdown: Option<CountdownState>,
    /// Inbox of the active lease, in backend order.
    pub messages: Vec<Message>,
    /// A generation request is pending.
    pub generating: bool,
    /// The number was copied less than two seconds ago.
    pub copied: bool,
    /// Notice waiting to be shown.
    pub notice: Option<Notice>,
}

struct ActiveLease {
    lease: PhoneLease,
    tracker: ExpiryTracker,
    // Held for its drop, which stops polling.
    _poller: InboxPoller,
}

#[derive(Default)]
struct SessionState {
    active: Option<ActiveLease>,
    messages: Vec<Message>,
    generating: bool,
    copied: bool,
    copy_epoch: u64,
    copied_reset: Option<CancellationToken>,
    notice: Option<Notice>,
}

impl SessionState {
    fn reset_copied(&mut self) {
        if let Some(token) = self.copied_reset.take() {
            token.cancel();
        }
        self.copied = false;
    }
}

struct Inner<B: Backend, C: Clipboard> {
    backend: B,
    clipboard: C,
    clock: Arc<dyn Clock>,
    state: Mutex<SessionState>,
    root: CancellationToken,
}

impl<B: Backend, C: Clipboard> Inner<B, C> {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn expire(&self, lease_id: &LeaseId) -> bool {
        let removed = {
            let mut state = self.lock();
            match &state.active {
                Some(active) if active.lease.id == *lease_id => {}
                _ => return false,
            }
            let removed = state.active.take();
            state.messages.clear();
            state.reset_copied();
            state.notice = Some(Notice::NumberExpired);
            removed
        };

        #[cfg(feature = "tracing")]
        info!(lease_id = %lease_id, "Number expired, session cleared");

        drop(removed);
        true
    }

    fn replace_messages(&self, lease_id: &LeaseId, messages: Vec<Message>) {
        let mut state = self.lock();
        if state
            .active
            .as_ref()
            .is_some_and(|active| active.lease.id == *lease_id)
        {
            state.messages = messages;
        }
    }

    fn finish_copied(&self, epoch: u64) {
        let mut state = self.lock();
        if state.copy_epoch == epoch {
            state.copied = false;
            state.copied_reset = None;
        }
    }
}

impl<B: Backend, C: Clipboard> Drop for Inner<B, C> {
    fn drop(&mut self) {
        self.root.cancel();
    }
}

/// Coordinates one disposable number at a time.
///
/// Owns the active [`PhoneLease`], its inbox and the two periodic tasks
/// attached to it: an [`ExpiryTracker`] ticking every second and an
/// [`InboxPoller`] fetching every three seconds. Acquiring a new lease fully
/// supersedes the previous one, including any fetch it had in flight.
///
/// Handles are cheap to clone and share state. Background tasks stop once
/// [`SessionCoordinator::shutdown`] is called or the last handle is dropped.
///
/// # Example
///
/// ```rust,ignore
/// use disposable_sms::{MemoryClipboard, SessionCoordinator};
/// use disposable_sms::memory::InMemoryBackend;
///
/// let session = SessionCoordinator::new(InMemoryBackend::default(), MemoryClipboard::new());
/// let lease = session.generate("US").await?;
/// session.copy_number().await?;
///
/// let view = session.snapshot();
/// println!("{} ({} left)", lease.number, view.countdown.unwrap());
/// ```
pub struct SessionCoordinator<B: Backend, C: Clipboard> {
    inner: Arc<Inner<B, C>>,
}

impl<B: Backend, C: Clipboard> Clone for SessionCoordinator<B, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: Backend, C: Clipboard> Debug for SessionCoordinator<B, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("SessionCoordinator")
            .field(
                "active_lease",
                &state.active.as_ref().map(|active| &active.lease.id),
            )
            .field("messages", &state.messages.len())
            .field("generating", &state.generating)
            .field("closed", &self.inner.root.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<B: Backend, C: Clipboard> SessionCoordinator<B, C> {
    /// Create a session driven by the tokio wall clock.
    pub fn new(backend: B, clipboard: C) -> Self {
        Self::builder(backend, clipboard).build()
    }

    /// Create a builder for a session.
    pub fn builder(backend: B, clipboard: C) -> SessionCoordinatorBuilder<B, C> {
        SessionCoordinatorBuilder::new(backend, clipboard)
    }

    /// Backend the session acquires leases from.
    pub fn backend(&self) -> &B {
        &self.inner.backend
    }

    /// Clipboard numbers are copied to.
    pub fn clipboard(&self) -> &C {
        &self.inner.clipboard
    }

    /// Countries offered for generation, default first.
    pub fn countries(&self) -> &'static [Country] {
        &Country::ALL
    }

    /// Request a new number for `country_code`.
    ///
    /// On success any previous lease is discarded together with its inbox,
    /// countdown and poller, and tracking starts for the new one. On failure a
    /// notice is raised and no lease is left active.
    ///
    /// Only one request may be pending; overlapping calls fail with
    /// [`SessionError::GenerationInProgress`] and change nothing.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session.generate", skip_all, fields(country = %country_code))
    )]
    pub async fn generate(&self, country_code: &str) -> Result<PhoneLease, SessionError> {
        {
            let mut state = self.inner.lock();
            if self.inner.root.is_cancelled() {
                return Err(SessionError::Closed);
            }
            if state.generating {
                return Err(SessionError::GenerationInProgress);
            }
            state.generating = true;
        }
        let _pending = PendingGeneration { inner: &*self.inner };

        #[cfg(feature = "tracing")]
        debug!("Requesting phone number");

        match self.inner.backend.generate_phone(country_code).await {
            Ok(lease) => {
                metrics::lease_generated(country_code);
                self.activate(lease.clone())?;

                #[cfg(feature = "tracing")]
                info!(lease_id = %lease.id, expires_at = %lease.expires_at, "Phone number acquired");

                Ok(lease)
            }
            Err(e) => {
                metrics::generation_failed(country_code);

                #[cfg(feature = "tracing")]
                warn!(error = %e, "Phone number generation failed");

                let notice = if e.no_numbers_available() {
                    Notice::NoNumbersAvailable {
                        country: Country::resolve(country_code).display_name().to_string(),
                    }
                } else {
                    Notice::GenerationFailed {
                        reason: e.to_string(),
                    }
                };

                let removed = {
                    let mut state = self.inner.lock();
                    let removed = state.active.take();
                    state.messages.clear();
                    state.reset_copied();
                    state.notice = Some(notice);
                    removed
                };
                drop(removed);

                Err(SessionError::generation(e, country_code))
            }
        }
    }

    fn activate(&self, lease: PhoneLease) -> Result<(), SessionError> {
        let weak: Weak<Inner<B, C>> = Arc::downgrade(&self.inner);

        let previous = {
            let mut state = self.inner.lock();
            if self.inner.root.is_cancelled() {
                return Err(SessionError::Closed);
            }

            // Started under the lock so an immediate expiry waits for the
            // lease to be installed.
            let tracker = ExpiryTracker::start_with_token(
                &lease,
                Arc::clone(&self.inner.clock),
                self.inner.root.child_token(),
                {
                    let weak = weak.clone();
                    let lease_id = lease.id.clone();
                    move || {
                        if let Some(inner) = weak.upgrade() {
                            inner.expire(&lease_id);
                        }
                    }
                },
            );
            let poller = InboxPoller::start_with_token(
                self.inner.backend.clone(),
                lease.id.clone(),
                self.inner.root.child_token(),
                {
                    let lease_id = lease.id.clone();
                    move |messages| {
                        if let Some(inner) = weak.upgrade() {
                            inner.replace_messages(&lease_id, messages);
                        }
                    }
                },
            );

            let previous = state.active.replace(ActiveLease {
                lease,
                tracker,
                _poller: poller,
            });
            state.messages.clear();
            state.reset_copied();
            state.notice = None;
            previous
        };

        if let Some(_previous) = previous {
            #[cfg(feature = "tracing")]
            debug!(lease_id = %_previous.lease.id, "Previous lease superseded");
        }
        Ok(())
    }

    /// Handle expiry of `lease_id`.
    ///
    /// Clears the lease and its inbox, stops polling and raises
    /// [`Notice::NumberExpired`]. Returns `false` for ids that are no longer
    /// active.
    pub fn on_expired(&self, lease_id: &LeaseId) -> bool {
        self.inner.expire(lease_id)
    }

    /// Copy the active number to the clipboard.
    ///
    /// Sets `copied` for two seconds; copying again restarts the window. A
    /// clipboard failure raises [`Notice::CopyFailed`] and leaves the lease
    /// untouched. If the lease is replaced or expires while the clipboard is
    /// written, `copied` stays unset and [`SessionError::LeaseReplaced`] is
    /// returned.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "session.copy_number", skip_all)
    )]
    pub async fn copy_number(&self) -> Result<(), SessionError> {
        let (lease_id, number) = {
            let state = self.inner.lock();
            state
                .active
                .as_ref()
                .map(|active| (active.lease.id.clone(), active.lease.number.clone()))
        }
        .ok_or(SessionError::NoActiveLease)?;

        if let Err(e) = self.inner.clipboard.write_text(&number).await {
            #[cfg(feature = "tracing")]
            warn!(error = %e, "Clipboard write failed");

            self.inner.lock().notice = Some(Notice::CopyFailed {
                reason: e.to_string(),
            });
            return Err(e.into());
        }

        let token = self.inner.root.child_token();
        let epoch = {
            let mut state = self.inner.lock();
            if !state
                .active
                .as_ref()
                .is_some_and(|active| active.lease.id == lease_id)
            {
                return Err(SessionError::LeaseReplaced);
            }
            state.reset_copied();
            state.copy_epoch += 1;
            state.copied = true;
            state.copied_reset = Some(token.clone());
            state.copy_epoch
        };

        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(COPIED_DISPLAY) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.finish_copied(epoch);
                    }
                }
            }
        });

        Ok(())
    }

    /// Current state of the session.
    pub fn snapshot(&self) -> SessionView {
        let state = self.inner.lock();
        SessionView {
            lease: state.active.as_ref().map(|active| active.lease.clone()),
            countdown: state.active.as_ref().map(|active| active.tracker.countdown()),
            messages: state.messages.clone(),
            generating: state.generating,
            copied: state.copied,
            notice: state.notice.clone(),
        }
    }

    /// The active lease, if any.
    pub fn active_lease(&self) -> Option<PhoneLease> {
        self.inner
            .lock()
            .active
            .as_ref()
            .map(|active| active.lease.clone())
    }

    /// Inbox of the active lease.
    pub fn messages(&self) -> Vec<Message> {
        self.inner.lock().messages.clone()
    }

    /// Hide the current notice.
    pub fn dismiss_notice(&self) {
        self.inner.lock().notice = None;
    }

    /// Stop every periodic task and drop the active lease.
    ///
    /// The session cannot generate afterwards.
    pub fn shutdown(&self) {
        self.inner.root.cancel();
        let removed = {
            let mut state = self.inner.lock();
            state.messages.clear();
            state.reset_copied();
            state.active.take()
        };
        drop(removed);

        #[cfg(feature = "tracing")]
        debug!("Session shut down");
    }

    /// True once [`SessionCoordinator::shutdown`] was called or the parent
    /// token was cancelled.
    pub fn is_closed(&self) -> bool {
        self.inner.root.is_cancelled()
    }
}

/// Clears the pending flag when a generation finishes or its future is dropped.
struct PendingGeneration<'a, B: Backend, C: Clipboard> {
    inner: &'a Inner<B, C>,
}

impl<B: Backend, C: Clipboard> Drop for PendingGeneration<'_, B, C> {
    fn drop(&mut self) {
        self.inner.lock().generating = false;
    }
}

/// Builder for [`SessionCoordinator`].
///
/// # Example
///
/// ```rust,ignore
/// use disposable_sms::{CancellationToken, MemoryClipboard, SessionCoordinator};
///
/// let app_token = CancellationToken::new();
/// let session = SessionCoordinator::builder(backend, MemoryClipboard::new())
///     .cancellation_token(app_token.clone())
///     .build();
///
/// // Later: stops the session together with the rest of the app.
/// app_token.cancel();
/// ```
pub struct SessionCoordinatorBuilder<B: Backend, C: Clipboard> {
    backend: B,
    clipboard: C,
    clock: Option<Arc<dyn Clock>>,
    parent: Option<CancellationToken>,
}

impl<B: Backend, C: Clipboard> SessionCoordinatorBuilder<B, C> {
    /// Create a new builder.
    pub fn new(backend: B, clipboard: C) -> Self {
        Self {
            backend,
            clipboard,
            clock: None,
            parent: None,
        }
    }

    /// Clock used for countdowns.
    ///
    /// Default: [`TokioClock`]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Tie the session's lifetime to `token`; cancelling it shuts the
    /// session's tasks down.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.parent = Some(token);
        self
    }

    /// Build the session.
    pub fn build(self) -> SessionCoordinator<B, C> {
        let root = match self.parent {
            Some(parent) => parent.child_token(),
            None => CancellationToken::new(),
        };
        SessionCoordinator {
            inner: Arc::new(Inner {
                backend: self.backend,
                clipboard: self.clipboard,
                clock: self.clock.unwrap_or_else(|| Arc::new(TokioClock::new())),
                state: Mutex::new(SessionState::default()),
                root,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryBackend, InMemoryBackendConfig};
    use crate::session::clipboard::{ClipboardError, MemoryClipboard};
    use std::time::Duration;

    fn session() -> SessionCoordinator<InMemoryBackend, MemoryClipboard> {
        let backend = InMemoryBackend::new(
            InMemoryBackendConfig::default()
                .without_simulated_delivery()
                .with_seed(5),
        );
        SessionCoordinator::new(backend, MemoryClipboard::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_installs_lease() {
        let session = session();
        let lease = session.generate("DE").await.unwrap();

        let view = session.snapshot();
        assert_eq!(view.lease.as_ref(), Some(&lease));
        assert!(!view.generating);
        assert!(view.notice.is_none());
        assert!(view.countdown.unwrap().fraction_remaining > 0.999);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_expiry_is_ignored() {
        let session = session();
        let first = session.generate("US").await.unwrap();
        let second = session.generate("US").await.unwrap();

        assert!(!session.on_expired(&first.id));
        assert_eq!(session.active_lease().unwrap().id, second.id);
        assert!(session.snapshot().notice.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_expired_clears_active_lease() {
        let session = session();
        let lease = session.generate("US").await.unwrap();
        session
            .backend()
            .deliver(&lease.id, "+100", "code")
            .unwrap();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(session.messages().len(), 1);

        assert!(session.on_expired(&lease.id));
        let view = session.snapshot();
        assert!(view.lease.is_none());
        assert!(view.messages.is_empty());
        assert_eq!(view.notice, Some(Notice::NumberExpired));
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_without_lease() {
        let session = session();
        let err = session.copy_number().await.unwrap_err();
        assert!(matches!(err, SessionError::NoActiveLease));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_copy_restarts_window() {
        let session = session();
        session.generate("US").await.unwrap();

        session.copy_number().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        session.copy_number().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(session.snapshot().copied);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(!session.snapshot().copied);
    }

    /// Clipboard that takes a second per write.
    #[derive(Debug, Clone, Default)]
    struct SlowClipboard(MemoryClipboard);

    impl Clipboard for SlowClipboard {
        async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
            tokio::time::sleep(Duration::from_secs(1)).await;
            self.0.write_text(text).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_copy_of_replaced_lease_is_not_marked_copied() {
        let backend = InMemoryBackend::new(
            InMemoryBackendConfig::default()
                .without_simulated_delivery()
                .with_seed(5),
        );
        let session = SessionCoordinator::new(backend, SlowClipboard::default());
        let first = session.generate("US").await.unwrap();

        let copy = tokio::spawn({
            let session = session.clone();
            async move { session.copy_number().await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = session.generate("US").await.unwrap();

        let err = copy.await.unwrap().unwrap_err();
        assert!(matches!(err, SessionError::LeaseReplaced));
        let view = session.snapshot();
        assert!(!view.copied);
        assert_eq!(view.lease.unwrap().id, second.id);
        assert_eq!(session.clipboard().0.contents(), Some(first.number));

        session.copy_number().await.unwrap();
        assert!(session.snapshot().copied);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismiss_notice() {
        let session = session();
        let lease = session.generate("US").await.unwrap();
        session.on_expired(&lease.id);
        assert!(session.snapshot().notice.is_some());

        session.dismiss_notice();
        assert!(session.snapshot().notice.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_final() {
        let session = session();
        session.generate("US").await.unwrap();
        session.shutdown();

        assert!(session.is_closed());
        assert!(session.active_lease().is_none());
        assert!(matches!(
            session.generate("US").await.unwrap_err(),
            SessionError::Closed
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_token_closes_session() {
        let parent = CancellationToken::new();
        let session = SessionCoordinator::builder(
            InMemoryBackend::new(InMemoryBackendConfig::default().without_simulated_delivery()),
            MemoryClipboard::new(),
        )
        .cancellation_token(parent.clone())
        .build();

        parent.cancel();
        assert!(session.is_closed());
    }

    #[test]
    fn test_countries_default_first() {
        let backend = InMemoryBackend::new(InMemoryBackendConfig::default());
        let session = SessionCoordinator::new(backend, MemoryClipboard::new());
        assert_eq!(session.countries().len(), 8);
        assert_eq!(session.countries()[0], Country::DEFAULT);
    }
}
