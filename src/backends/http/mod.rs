//! Hosted backend reached over HTTP.
//!
//! The deployed project exposes a `generate-phone` function that mints a lease
//! and an `sms_messages` table read through its REST interface.
//!
//! # Example
//!
//! ```rust,ignore
//! use disposable_sms::http::HttpBackend;
//! use disposable_sms::{RetryableBackend, SessionCoordinator};
//!
//! let backend = HttpBackend::new("https://project.supabase.co", "anon-key")?;
//! let session = SessionCoordinator::new(RetryableBackend::new(backend), clipboard);
//!
//! let lease = session.generate("US").await?;
//! println!("Got number: {}", lease.number);
//! ```

pub mod client;
pub mod errors;
pub mod types;

pub use client::{HttpBackend, HttpBackendBuilder};
pub use errors::{HttpBackendError, HttpServiceError, ServiceErrorCode};
