//! # Disposable SMS
//!
//! Temporary phone numbers with a live inbox.
//!
//! A [`SessionCoordinator`] leases one number at a time from a [`Backend`],
//! counts its one-hour lifetime down every second, polls its inbox every three
//! seconds and tears everything down when the number expires or is replaced.
//!
//! ## Backends
//!
//! | Backend | Module | Use |
//! |---------|--------|-----|
//! | Hosted REST functions | [`http`] | Production |
//! | In-process store | [`memory`] | Local development, demos, tests |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use disposable_sms::http::HttpBackend;
//! use disposable_sms::{MemoryClipboard, RetryableBackend, SessionCoordinator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = HttpBackend::new("https://project.supabase.co", "anon-key")?;
//!     let session = SessionCoordinator::new(
//!         RetryableBackend::new(backend),
//!         MemoryClipboard::new(),
//!     );
//!
//!     let lease = session.generate("GB").await?;
//!     println!("Your number: {}", lease.number);
//!
//!     tokio::time::sleep(std::time::Duration::from_secs(30)).await;
//!     for message in session.messages() {
//!         println!("{}: {}", message.sender_address, message.body);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! SessionCoordinator<B, C>
//!     ├── ExpiryTracker      (1 s countdown, fires once on expiry)
//!     ├── InboxPoller        (3 s full-replace fetch)
//!     └── Clipboard          (trait: MemoryClipboard, ...)
//!             │
//!             ▼
//! RetryableBackend<B>        (optional retry wrapper)
//!             │
//!             ▼
//!         Backend            (trait: HttpBackend, InMemoryBackend)
//! ```
//!
//! ## Features
//!
//! - `tracing` - tracing instrumentation with OpenTelemetry span status (enabled by default)
//! - `metrics` - OpenTelemetry counters for generated leases and failed polls

pub mod backends;
pub mod countries;
pub mod errors;
pub mod session;
pub mod types;
pub mod utils;

pub use backends::{http, memory};

// Re-export commonly used types at the crate root
pub use backends::{Backend, OnRetryCallback, RetryableBackend};
pub use countries::{Country, CountryError};
pub use errors::RetryableError;
pub use session::{
    Clipboard, ClipboardError, ExpiryTracker, InboxPoller, LeaseState, MemoryClipboard, Notice,
    SessionCoordinator, SessionCoordinatorBuilder, SessionError, SessionView,
};
pub use tokio_util::sync::CancellationToken;
pub use types::{
    COPIED_DISPLAY, COUNTDOWN_TICK, CountdownState, DialCode, DialCodeError, LEASE_DURATION,
    LeaseId, Message, MessageId, POLL_INTERVAL, PhoneLease, Urgency,
};
pub use utils::clock::{Clock, TokioClock};
pub use utils::number_format::{format_phone_number, generate_number, generate_number_with};
pub use utils::retry::RetryConfig;
