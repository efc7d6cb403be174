//! Core types for disposable number sessions.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Lifetime of a generated number.
pub const LEASE_DURATION: Duration = Duration::from_secs(60 * 60);

/// Interval between countdown re-checks.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

/// Interval between inbox fetches.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// How long the "copied" acknowledgment stays visible.
pub const COPIED_DISPLAY: Duration = Duration::from_millis(2000);

/// [`LEASE_DURATION`] as a signed wall-clock delta.
pub(crate) fn lease_delta() -> TimeDelta {
    TimeDelta::seconds(LEASE_DURATION.as_secs() as i64)
}

// =============================================================================
// LeaseId
// =============================================================================

/// Unique identifier of a phone lease, as minted by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeaseId(String);

impl LeaseId {
    /// Create a new LeaseId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LeaseId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for LeaseId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for LeaseId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for LeaseId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// MessageId
// =============================================================================

/// Unique identifier of a received message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Create a new MessageId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl Display for MessageId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for MessageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

// =============================================================================
// DialCode
// =============================================================================

/// Error when parsing a dial code.
#[derive(Debug, Clone, Error)]
pub enum DialCodeError {
    /// Dial code contains non-digit characters.
    #[error("dial code must contain only digits")]
    NonDigit,
    /// Dial code is empty.
    #[error("dial code cannot be empty")]
    Empty,
}

/// Country dialing prefix (e.g., "1" for USA, "44" for the United Kingdom).
///
/// Dial codes are stored without the leading '+' sign.
///
/// # Example
///
/// ```rust
/// use disposable_sms::DialCode;
///
/// let dc = DialCode::new("+44").unwrap();
/// assert_eq!(dc.to_string(), "44");
/// assert_eq!(dc.with_plus_prefix(), "+44");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DialCode(String);

impl DialCode {
    /// Create a new DialCode from a string.
    ///
    /// The input can include a leading '+' which will be stripped.
    pub fn new(s: impl AsRef<str>) -> Result<Self, DialCodeError> {
        let n = s.as_ref().trim().trim_start_matches('+');
        if n.is_empty() {
            return Err(DialCodeError::Empty);
        }
        if !n.chars().all(|c| c.is_ascii_digit()) {
            return Err(DialCodeError::NonDigit);
        }
        Ok(Self(n.to_string()))
    }

    /// Dial code from the built-in country catalog, already known to be digits.
    pub(crate) fn from_catalog(digits: &'static str) -> Self {
        Self(digits.to_string())
    }

    /// Get the dial code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Render the dial code the way it is shown to users ("+44").
    pub fn with_plus_prefix(&self) -> String {
        format!("+{}", self.0)
    }
}

impl FromStr for DialCode {
    type Err = DialCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Display for DialCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for DialCode {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        DialCode::new(raw).map_err(de::Error::custom)
    }
}

impl Serialize for DialCode {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.0)
    }
}

// =============================================================================
// PhoneLease
// =============================================================================

/// Time-bounded association between a generated number and its expiry.
///
/// `expires_at` is always `issued_at + LEASE_DURATION`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneLease {
    /// Backend identifier of this lease.
    pub id: LeaseId,
    /// Formatted phone number, e.g. "+1 (415) 555-0134".
    pub number: String,
    /// Country code the number was requested for.
    pub country: String,
    /// When the lease was minted.
    pub issued_at: DateTime<Utc>,
    /// When the lease stops being valid.
    pub expires_at: DateTime<Utc>,
}

impl PhoneLease {
    /// Create a lease issued at `issued_at`.
    pub fn new(
        id: impl Into<LeaseId>,
        number: impl Into<String>,
        country: impl Into<String>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            country: country.into(),
            issued_at,
            expires_at: issued_at + lease_delta(),
        }
    }

    /// Rebuild a lease from its expiry, as reported by a backend that does
    /// not return the issue time.
    pub fn from_expiry(
        id: impl Into<LeaseId>,
        number: impl Into<String>,
        country: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            number: number.into(),
            country: country.into(),
            issued_at: expires_at - lease_delta(),
            expires_at,
        }
    }

    /// Whether the lease has run out at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

// =============================================================================
// Message
// =============================================================================

/// SMS message delivered to a leased number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Backend identifier of this message.
    pub id: MessageId,
    /// Lease the message was delivered to.
    pub lease_id: LeaseId,
    /// Sender phone number or short code.
    pub sender_address: String,
    /// Message text.
    pub body: String,
    /// When the backend stored the message.
    pub received_at: DateTime<Utc>,
}

// =============================================================================
// CountdownState
// =============================================================================

/// Color band of the countdown progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Urgency {
    /// More than half of the lease remains.
    Healthy,
    /// Between a quarter and a half remains.
    Warning,
    /// A quarter or less remains.
    Critical,
}

/// Remaining lifetime of a lease, recomputed on every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountdownState {
    /// Time left until expiry, never negative.
    pub remaining: Duration,
    /// `remaining / LEASE_DURATION`, clamped to `[0, 1]`.
    pub fraction_remaining: f64,
}

impl CountdownState {
    /// State of a freshly issued lease.
    pub fn full() -> Self {
        Self {
            remaining: LEASE_DURATION,
            fraction_remaining: 1.0,
        }
    }

    /// Derive the countdown for a lease expiring at `expires_at`.
    pub fn at(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining = (expires_at - now).to_std().unwrap_or(Duration::ZERO);
        let fraction_remaining =
            (remaining.as_secs_f64() / LEASE_DURATION.as_secs_f64()).clamp(0.0, 1.0);
        Self {
            remaining,
            fraction_remaining,
        }
    }

    /// Remaining time in milliseconds.
    pub fn remaining_ms(&self) -> u64 {
        self.remaining.as_millis() as u64
    }

    /// True once nothing remains.
    pub fn is_expired(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Progress bar color band.
    pub fn urgency(&self) -> Urgency {
        if self.fraction_remaining > 0.5 {
            Urgency::Healthy
        } else if self.fraction_remaining > 0.25 {
            Urgency::Warning
        } else {
            Urgency::Critical
        }
    }
}

/// Renders as `mm:ss`.
impl Display for CountdownState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let secs = self.remaining.as_secs();
        write!(f, "{:02}:{:02}", secs / 60, secs % 60)
    }
}
