//! Session-level errors and user-facing notices.

use super::clipboard::ClipboardError;
use crate::errors::RetryableError;
use std::error::Error as StdError;
use thiserror::Error;

/// Errors returned by [`super::SessionCoordinator`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A generation is already pending.
    #[error("A number is already being generated")]
    GenerationInProgress,

    /// The backend failed to issue a lease.
    #[error("Failed to generate a number for {country}: {source}")]
    Generation {
        #[source]
        source: Box<dyn StdError + Send + Sync>,
        /// Requested country code.
        country: String,
        /// The backend had nothing to allocate.
        no_numbers: bool,
    },

    /// There is no active lease to act on.
    #[error("No active number")]
    NoActiveLease,

    /// The lease changed while its number was being copied.
    #[error("Number changed while copying")]
    LeaseReplaced,

    /// The session was shut down.
    #[error("Session is closed")]
    Closed,

    /// Writing to the clipboard failed.
    #[error("Failed to copy number: {0}")]
    Clipboard(#[from] ClipboardError),
}

impl SessionError {
    pub(crate) fn generation<E>(error: E, country: &str) -> Self
    where
        E: StdError + RetryableError + Send + Sync + 'static,
    {
        let no_numbers = error.no_numbers_available();
        SessionError::Generation {
            source: Box::new(error),
            country: country.to_string(),
            no_numbers,
        }
    }
}

impl RetryableError for SessionError {
    fn is_retryable(&self) -> bool {
        false
    }

    fn no_numbers_available(&self) -> bool {
        matches!(
            self,
            SessionError::Generation {
                no_numbers: true,
                ..
            }
        )
    }
}

/// Non-blocking message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The backend had no number for the requested country.
    NoNumbersAvailable { country: String },
    /// Generation failed for another reason.
    GenerationFailed { reason: String },
    /// The active number ran out.
    NumberExpired,
    /// The number could not be copied.
    CopyFailed { reason: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::NoNumbersAvailable { country } => {
                write!(f, "No numbers available for {country}. Try another country.")
            }
            Notice::GenerationFailed { reason } => {
                write!(f, "Failed to generate number: {reason}")
            }
            Notice::NumberExpired => {
                write!(f, "Your number has expired. Generate a new one to continue.")
            }
            Notice::CopyFailed { reason } => write!(f, "Failed to copy number: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackendError;

    #[test]
    fn test_generation_error_keeps_classification() {
        let err = SessionError::generation(
            MemoryBackendError::NoNumbers {
                country: "JP".into(),
            },
            "JP",
        );
        assert!(err.no_numbers_available());
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("JP"));
    }

    #[test]
    fn test_outage_is_not_no_numbers() {
        let err = SessionError::generation(MemoryBackendError::Unavailable, "US");
        assert!(!err.no_numbers_available());
        assert!(matches!(err, SessionError::Generation { no_numbers: false, .. }));
        assert!(!SessionError::NoActiveLease.no_numbers_available());
    }

    #[test]
    fn test_notice_text() {
        let notice = Notice::NoNumbersAvailable {
            country: "Japan".into(),
        };
        assert_eq!(
            notice.to_string(),
            "No numbers available for Japan. Try another country."
        );
    }
}
