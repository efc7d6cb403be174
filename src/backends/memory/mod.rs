//! In-process backend.
//!
//! Behaves like the hosted handlers: minting a lease purges expired rows,
//! stores the new lease and schedules one simulated inbound SMS drawn from a
//! [`MessagePool`]. Useful for local development, demos and tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use disposable_sms::memory::{InMemoryBackend, InMemoryBackendConfig};
//! use disposable_sms::Backend;
//!
//! let backend = InMemoryBackend::new(InMemoryBackendConfig::default().with_seed(7));
//! let lease = backend.generate_phone("FR").await?;
//! ```

mod pool;
mod store;

pub use pool::{MessagePool, SampleMessage};

use crate::backends::traits::Backend;
use crate::errors::RetryableError;
use crate::types::{LeaseId, Message, MessageId, PhoneLease};
use crate::utils::clock::{Clock, TokioClock};
use crate::utils::number_format::generate_number_with;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use store::Store;
use thiserror::Error;
use uuid::Uuid;

#[cfg(feature = "tracing")]
use crate::countries::Country;
#[cfg(feature = "tracing")]
use tracing::{debug, info};

/// Delay before the simulated SMS reaches a new lease.
pub const DEFAULT_DELIVERY_DELAY: Duration = Duration::from_secs(5);

/// Errors of the in-memory backend.
#[derive(Debug, Clone, Error)]
pub enum MemoryBackendError {
    /// The country is configured as exhausted.
    #[error("No phone numbers available for country {country}")]
    NoNumbers { country: String },

    /// The backend was switched offline.
    #[error("Backend unavailable")]
    Unavailable,

    /// A message was addressed to a lease that does not exist.
    #[error("Unknown lease {lease_id}")]
    UnknownLease { lease_id: LeaseId },
}

impl RetryableError for MemoryBackendError {
    fn is_retryable(&self) -> bool {
        matches!(self, MemoryBackendError::Unavailable)
    }

    fn should_retry_operation(&self) -> bool {
        match self {
            MemoryBackendError::Unavailable | MemoryBackendError::NoNumbers { .. } => true,
            MemoryBackendError::UnknownLease { .. } => false,
        }
    }

    fn no_numbers_available(&self) -> bool {
        matches!(self, MemoryBackendError::NoNumbers { .. })
    }
}

/// Configuration for [`InMemoryBackend`].
#[derive(Debug, Clone)]
pub struct InMemoryBackendConfig {
    /// Messages to draw simulated deliveries from.
    pub message_pool: MessagePool,
    /// Delay before the simulated SMS; `None` disables simulation.
    pub delivery_delay: Option<Duration>,
    /// Country codes that have no numbers left.
    pub exhausted_countries: HashSet<String>,
    /// Seed for number and message synthesis; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for InMemoryBackendConfig {
    fn default() -> Self {
        Self {
            message_pool: MessagePool::default(),
            delivery_delay: Some(DEFAULT_DELIVERY_DELAY),
            exhausted_countries: HashSet::new(),
            seed: None,
        }
    }
}

impl InMemoryBackendConfig {
    /// Use a custom message pool.
    pub fn with_message_pool(mut self, pool: MessagePool) -> Self {
        self.message_pool = pool;
        self
    }

    /// Set the simulated delivery delay.
    pub fn with_delivery_delay(mut self, delay: Duration) -> Self {
        self.delivery_delay = Some(delay);
        self
    }

    /// Disable simulated delivery.
    pub fn without_simulated_delivery(mut self) -> Self {
        self.delivery_delay = None;
        self
    }

    /// Mark a country as having no numbers left.
    pub fn with_exhausted_country(mut self, code: impl Into<String>) -> Self {
        self.exhausted_countries
            .insert(code.into().trim().to_ascii_uppercase());
        self
    }

    /// Seed the random source.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

struct Inner {
    config: InMemoryBackendConfig,
    clock: Arc<dyn Clock>,
    store: Mutex<Store>,
    rng: Mutex<StdRng>,
    offline: AtomicBool,
}

/// Backend that keeps leases and messages in process memory.
#[derive(Clone)]
pub struct InMemoryBackend {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for InMemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackend")
            .field("config", &self.inner.config)
            .field("offline", &self.inner.offline.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new(InMemoryBackendConfig::default())
    }
}

impl InMemoryBackend {
    /// Create a backend using the tokio-driven wall clock.
    pub fn new(config: InMemoryBackendConfig) -> Self {
        Self::with_clock(config, Arc::new(TokioClock::new()))
    }

    /// Create a backend with a custom clock.
    pub fn with_clock(config: InMemoryBackendConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner: Arc::new(Inner {
                config,
                clock,
                store: Mutex::new(Store::default()),
                rng: Mutex::new(rng),
                offline: AtomicBool::new(false),
            }),
        }
    }

    /// Make every call fail with [`MemoryBackendError::Unavailable`] until
    /// switched back.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of leases currently stored.
    pub fn lease_count(&self) -> usize {
        lock(&self.inner.store).lease_count()
    }

    /// Store an inbound SMS for a lease, as the delivery provider would.
    pub fn deliver(
        &self,
        lease_id: &LeaseId,
        sender: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<Message, MemoryBackendError> {
        Inner::deliver(&self.inner, lease_id, sender.into(), body.into())
    }

    fn ensure_online(&self) -> Result<(), MemoryBackendError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(MemoryBackendError::Unavailable);
        }
        Ok(())
    }

    fn schedule_delivery(&self, lease_id: LeaseId) {
        let Some(delay) = self.inner.config.delivery_delay else {
            return;
        };
        let sample = {
            let mut rng = lock(&self.inner.rng);
            self.inner.config.message_pool.pick(&mut *rng).cloned()
        };
        let Some(sample) = sample else {
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                // The lease may have been purged meanwhile
                let _ = Inner::deliver(&inner, &lease_id, sample.sender, sample.body);
            }
        });
    }
}

impl Inner {
    fn deliver(
        inner: &Arc<Inner>,
        lease_id: &LeaseId,
        sender: String,
        body: String,
    ) -> Result<Message, MemoryBackendError> {
        let message = Message {
            id: MessageId::new(Uuid::new_v4().to_string()),
            lease_id: lease_id.clone(),
            sender_address: sender,
            body,
            received_at: inner.clock.now(),
        };

        if !lock(&inner.store).insert_message(message.clone()) {
            return Err(MemoryBackendError::UnknownLease {
                lease_id: lease_id.clone(),
            });
        }

        #[cfg(feature = "tracing")]
        debug!(lease_id = %lease_id, message_id = %message.id, "Message delivered");

        Ok(message)
    }
}

impl Backend for InMemoryBackend {
    type Error = MemoryBackendError;

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "InMemoryBackend::generate_phone", skip_all, fields(country = %country))
    )]
    async fn generate_phone(&self, country: &str) -> Result<PhoneLease, Self::Error> {
        self.ensure_online()?;

        let normalized = country.trim().to_ascii_uppercase();
        if self.inner.config.exhausted_countries.contains(&normalized) {
            return Err(MemoryBackendError::NoNumbers {
                country: country.to_string(),
            });
        }

        let now = self.inner.clock.now();
        let number = {
            let mut rng = lock(&self.inner.rng);
            generate_number_with(country, &mut *rng)
        };
        let lease = PhoneLease::new(Uuid::new_v4().to_string(), number, country, now);

        {
            let mut store = lock(&self.inner.store);
            let _purged = store.purge_expired(now);
            store.insert_lease(lease.clone());

            #[cfg(feature = "tracing")]
            info!(
                lease_id = %lease.id,
                country = %Country::resolve(country).display_name(),
                purged = _purged,
                "Lease minted"
            );
        }

        self.schedule_delivery(lease.id.clone());
        Ok(lease)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "InMemoryBackend::get_messages", skip_all, fields(lease_id = %lease_id))
    )]
    async fn get_messages(&self, lease_id: &LeaseId) -> Result<Vec<Message>, Self::Error> {
        self.ensure_online()?;
        Ok(lock(&self.inner.store).messages_for(lease_id))
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
