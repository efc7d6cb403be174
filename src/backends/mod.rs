//! Lease backend implementations.

pub(crate) mod retryable;
pub(crate) mod traits;

pub mod http;
pub mod memory;

pub use retryable::{OnRetryCallback, RetryableBackend};
pub use traits::Backend;
