//! Disposable-number session: lease lifecycle, countdown, inbox and clipboard.

pub(crate) mod clipboard;
pub(crate) mod coordinator;
pub(crate) mod error;
pub(crate) mod poller;
pub(crate) mod tracker;

pub use clipboard::{Clipboard, ClipboardError, MemoryClipboard};
pub use coordinator::{SessionCoordinator, SessionCoordinatorBuilder, SessionView};
pub use error::{Notice, SessionError};
pub use poller::InboxPoller;
pub use tracker::{ExpiryTracker, LeaseState};
