//! Clipboard collaborator used by [`super::SessionCoordinator::copy_number`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors raised while writing to a clipboard.
#[derive(Debug, Clone, Error)]
pub enum ClipboardError {
    /// No clipboard is reachable in this environment.
    #[error("Clipboard unavailable")]
    Unavailable,

    /// The clipboard rejected the write.
    #[error("Clipboard write rejected: {message}")]
    WriteRejected { message: String },
}

/// Destination for copied phone numbers.
#[allow(async_fn_in_trait)]
pub trait Clipboard: Send + Sync + Clone + 'static {
    /// Replace the clipboard contents with `text`.
    fn write_text(&self, text: &str) -> impl Future<Output = Result<(), ClipboardError>> + Send;
}

/// Clipboard held in process memory.
///
/// Clones share contents. Writes can be made to fail with
/// [`MemoryClipboard::set_failing`].
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<Option<String>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryClipboard {
    /// Create an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text written, if any.
    pub fn contents(&self) -> Option<String> {
        self.contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Make subsequent writes fail with [`ClipboardError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Clipboard for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ClipboardError::Unavailable);
        }
        *self
            .contents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(text.to_string());
        Ok(())
    }
}
