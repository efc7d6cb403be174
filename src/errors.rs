//! Error classification shared by every backend.

/// Trait for errors that can be classified as retryable or permanent.
///
/// This trait provides three levels of classification:
///
/// 1. **Request-level** (`is_retryable`): Whether the same request should be
///    retried. Use this for transient errors like network timeouts or 5xx.
///
/// 2. **Operation-level** (`should_retry_operation`): Whether a fresh attempt
///    (for example generating a number for another country) might succeed.
///
/// 3. **Availability** (`no_numbers_available`): Whether the backend simply had
///    nothing to allocate. The session surfaces this separately so the user is
///    told to try another country instead of seeing a generic failure.
///
/// # Examples
///
/// ```rust
/// use disposable_sms::RetryableError;
///
/// enum MyError {
///     NetworkTimeout,
///     NoNumbers,
///     InvalidApiKey,
/// }
///
/// impl RetryableError for MyError {
///     fn is_retryable(&self) -> bool {
///         matches!(self, MyError::NetworkTimeout)
///     }
///
///     fn should_retry_operation(&self) -> bool {
///         match self {
///             MyError::NetworkTimeout | MyError::NoNumbers => true,
///             MyError::InvalidApiKey => false,
///         }
///     }
///
///     fn no_numbers_available(&self) -> bool {
///         matches!(self, MyError::NoNumbers)
///     }
/// }
/// ```
pub trait RetryableError {
    /// Returns true if this error represents a transient failure
    /// that might succeed when the same request is sent again.
    fn is_retryable(&self) -> bool;

    /// Returns true if a fresh operation might succeed.
    ///
    /// Default implementation returns the same as `is_retryable()`.
    fn should_retry_operation(&self) -> bool {
        self.is_retryable()
    }

    /// Returns true if the backend had no number to allocate for the
    /// requested country.
    fn no_numbers_available(&self) -> bool {
        false
    }
}
