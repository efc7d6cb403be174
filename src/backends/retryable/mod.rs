//! Retryable backend wrapper.

use super::traits::Backend;
use crate::errors::RetryableError;
use crate::types::{LeaseId, Message, PhoneLease};
use crate::utils::retry::RetryConfig;
use backon::Retryable;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "tracing")]
use tracing::debug;

/// Callback type for retry notifications.
///
/// Receives the error that caused the retry and the delay before the next
/// attempt.
pub type OnRetryCallback<E> = Arc<dyn Fn(&E, Duration) + Send + Sync>;

/// Wrapper that adds automatic retry logic to any Backend.
///
/// `generate_phone` errors are retried while `is_retryable()` holds, with
/// exponential backoff. `get_messages` is never retried: the session's inbox
/// poller refetches on its own fixed interval.
///
/// # Example
///
/// ```rust,ignore
/// use disposable_sms::{RetryableBackend, RetryConfig};
/// use disposable_sms::http::HttpBackend;
/// use std::time::Duration;
///
/// let backend = HttpBackend::new("https://project.supabase.co", "anon-key")?;
/// let backend = RetryableBackend::with_config(
///     backend,
///     RetryConfig::default().with_min_delay(Duration::from_millis(500)),
/// );
/// ```
pub struct RetryableBackend<B: Backend> {
    inner: Arc<B>,
    retry_config: RetryConfig,
    on_retry: Option<OnRetryCallback<B::Error>>,
}

impl<B: Backend> Clone for RetryableBackend<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            retry_config: self.retry_config.clone(),
            on_retry: self.on_retry.clone(),
        }
    }
}

impl<B: Backend + Debug> Debug for RetryableBackend<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryableBackend")
            .field("inner", &self.inner)
            .field("retry_config", &self.retry_config)
            .field("on_retry", &self.on_retry.as_ref().map(|_| "..."))
            .finish()
    }
}

impl<B: Backend> RetryableBackend<B> {
    /// Wrap a backend with default retry logic.
    pub fn new(inner: B) -> Self {
        Self::with_config(inner, RetryConfig::default())
    }

    /// Wrap a backend with custom retry configuration.
    pub fn with_config(inner: B, retry_config: RetryConfig) -> Self {
        Self {
            inner: Arc::new(inner),
            retry_config,
            on_retry: None,
        }
    }

    /// Set a callback to be invoked on each retry attempt.
    pub fn with_on_retry<F>(mut self, callback: F) -> Self
    where
        F: Fn(&B::Error, Duration) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(callback));
        self
    }

    /// Get reference to the inner backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    /// Get reference to the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }
}

impl<B: Backend> Backend for RetryableBackend<B>
where
    B::Error: Debug,
{
    type Error = B::Error;

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "RetryableBackend::generate_phone", skip_all, fields(country = %country))
    )]
    async fn generate_phone(&self, country: &str) -> Result<PhoneLease, Self::Error> {
        let inner = Arc::clone(&self.inner);
        let on_retry = self.on_retry.clone();
        let country = country.to_string();
        let country_for_notify = country.clone();
        (|| {
            let inner = Arc::clone(&inner);
            let country = country.clone();
            async move { inner.generate_phone(&country).await }
        })
        .retry(self.retry_config.build_strategy())
        .when(|err: &Self::Error| err.is_retryable())
        .notify(move |err, duration| {
            if let Some(ref callback) = on_retry {
                callback(err, duration);
            }

            #[cfg(feature = "tracing")]
            debug!(
                error = ?err,
                country = %country_for_notify,
                retry_after_secs = %duration.as_secs_f64(),
                "Retrying generate_phone"
            );
            #[cfg(not(feature = "tracing"))]
            let _ = &country_for_notify;
        })
        .await
    }

    /// Passed straight through. The inbox poller refetches on its own
    /// interval, and backing off here would push its ticks back.
    async fn get_messages(&self, lease_id: &LeaseId) -> Result<Vec<Message>, Self::Error> {
        self.inner.get_messages(lease_id).await
    }
}
