//! Backend trait definition.

use crate::errors::RetryableError;
use crate::types::{LeaseId, Message, PhoneLease};
use std::error::Error as StdError;
use std::future::Future;

/// Core trait that all lease backends must implement.
///
/// A backend mints phone leases and lists the messages delivered to them:
/// - `generate_phone` persists a new lease, purges expired ones and may
///   trigger an initial SMS to the new number
/// - `get_messages` returns the messages of a lease, newest first
///
/// # Note on async methods
///
/// All async methods in this trait return `Send` futures, so the session can
/// poll a backend from spawned tasks on a multi-threaded runtime.
///
/// # Example
///
/// ```rust,ignore
/// use disposable_sms::{Backend, LeaseId, Message, PhoneLease};
///
/// #[derive(Clone)]
/// struct MyBackend { /* ... */ }
///
/// impl Backend for MyBackend {
///     type Error = MyError;
///
///     async fn generate_phone(&self, country: &str) -> Result<PhoneLease, Self::Error> {
///         // Mint and persist a lease
///     }
///
///     async fn get_messages(&self, lease_id: &LeaseId) -> Result<Vec<Message>, Self::Error> {
///         // List messages for the lease
///     }
/// }
/// ```
#[allow(async_fn_in_trait)]
pub trait Backend: Send + Sync + Clone + 'static {
    /// Error type returned by backend operations.
    type Error: StdError + RetryableError + Send + Sync + 'static;

    /// Mint a new lease for the given country code.
    ///
    /// The code is opaque; backends must accept codes they do not know.
    fn generate_phone(
        &self,
        country: &str,
    ) -> impl Future<Output = Result<PhoneLease, Self::Error>> + Send;

    /// List the messages delivered to a lease, newest first.
    ///
    /// Unknown or purged leases yield an empty list.
    fn get_messages(
        &self,
        lease_id: &LeaseId,
    ) -> impl Future<Output = Result<Vec<Message>, Self::Error>> + Send;
}
