//! Error types for the hosted backend.

use super::types::ErrorBody;
use crate::errors::RetryableError;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

#[cfg(feature = "tracing")]
use tracing::warn;

/// Error codes returned in the `code` field of error bodies.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceErrorCode {
    /// No number can be allocated for the requested country.
    NoNumbers,
    /// Unknown error code from the backend.
    Unknown { raw: String },
}

impl ServiceErrorCode {
    /// Returns the wire representation.
    pub fn code_name(&self) -> &str {
        match self {
            Self::NoNumbers => "NO_NUMBERS",
            Self::Unknown { raw } => raw.as_str(),
        }
    }

    /// Parse an error code.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim() {
            "NO_NUMBERS" => Self::NoNumbers,
            other => Self::Unknown {
                raw: other.to_string(),
            },
        }
    }
}

impl Display for ServiceErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code_name())
    }
}

/// Error reported by the backend with a non-2xx status.
#[derive(Debug, Clone, Error)]
#[error("backend returned {status}: {message}")]
pub struct HttpServiceError {
    /// HTTP status code.
    pub status: u16,
    /// Error code, when the body carried one.
    pub code: Option<ServiceErrorCode>,
    /// Error message from the body, or the raw body.
    pub message: String,
}

impl HttpServiceError {
    /// Build from a status and raw response body.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let error = match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self {
                status,
                code: parsed.code.as_deref().map(ServiceErrorCode::from_raw),
                message: parsed.error,
            },
            Err(_) => Self {
                status,
                code: None,
                message: body.trim().to_string(),
            },
        };

        #[cfg(feature = "tracing")]
        warn!(
            status = error.status,
            code = ?error.code,
            message = %error.message,
            "Backend returned error"
        );

        error
    }

    /// True when the backend had no number to allocate.
    pub fn is_no_numbers(&self) -> bool {
        self.code == Some(ServiceErrorCode::NoNumbers) || self.status == 404
    }

    /// True for server-side or throttling failures.
    pub fn is_transient(&self) -> bool {
        !self.is_no_numbers() && (self.status >= 500 || self.status == 429)
    }
}

/// Main error type for hosted backend operations.
#[derive(Debug, Error)]
pub enum HttpBackendError {
    /// Failed to build HTTP client.
    #[error("Failed to build HTTP client: {0}")]
    BuildHttpClient(#[source] reqwest::Error),

    /// The configured endpoint is not a valid base URL.
    #[error("Invalid backend endpoint: {0}")]
    InvalidEndpoint(#[source] url::ParseError),

    /// The API key cannot be sent as a header value.
    #[error("API key is not a valid header value: {0}")]
    InvalidApiKey(#[source] reqwest::header::InvalidHeaderValue),

    /// Error building a request URL.
    #[error("Error building request URL: {0}")]
    BuildRequestUrl(#[source] serde_urlencoded::ser::Error),

    /// Failed to send HTTP request.
    #[error("Failed to send HTTP request: {0}")]
    HttpRequest(#[from] reqwest_middleware::Error),

    /// Failed to read response body.
    #[error("Failed to parse response: {0}")]
    ParseResponse(#[source] reqwest::Error),

    /// Failed to deserialize JSON response.
    #[error("Failed to deserialize JSON response: {0}")]
    DeserializeJson(#[source] serde_json::Error),

    /// Backend error response.
    #[error("Backend error: {0}")]
    Service(#[source] HttpServiceError),
}

pub type Result<T> = std::result::Result<T, HttpBackendError>;

impl RetryableError for HttpBackendError {
    fn is_retryable(&self) -> bool {
        match self {
            HttpBackendError::Service(error) => error.is_transient(),
            HttpBackendError::HttpRequest(_) => true,
            HttpBackendError::BuildHttpClient(_)
            | HttpBackendError::InvalidEndpoint(_)
            | HttpBackendError::InvalidApiKey(_)
            | HttpBackendError::BuildRequestUrl(_)
            | HttpBackendError::ParseResponse(_)
            | HttpBackendError::DeserializeJson(_) => false,
        }
    }

    fn should_retry_operation(&self) -> bool {
        match self {
            HttpBackendError::Service(error) => error.is_transient() || error.is_no_numbers(),
            HttpBackendError::HttpRequest(_) => true,
            HttpBackendError::BuildHttpClient(_)
            | HttpBackendError::InvalidEndpoint(_)
            | HttpBackendError::InvalidApiKey(_)
            | HttpBackendError::BuildRequestUrl(_)
            | HttpBackendError::ParseResponse(_)
            | HttpBackendError::DeserializeJson(_) => false,
        }
    }

    fn no_numbers_available(&self) -> bool {
        matches!(self, HttpBackendError::Service(error) if error.is_no_numbers())
    }
}
