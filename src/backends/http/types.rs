//! Wire types of the hosted backend.

use crate::types::{LeaseId, Message, MessageId, PhoneLease};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of the `generate-phone` function call.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratePhoneRequest<'a> {
    /// Requested country code.
    pub country: &'a str,
}

/// Response of the `generate-phone` function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePhoneResponse {
    /// Row id of the new lease.
    pub id: LeaseId,
    /// Formatted phone number.
    pub number: String,
    /// Country code stored with the lease.
    pub country: String,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
}

impl From<GeneratePhoneResponse> for PhoneLease {
    fn from(response: GeneratePhoneResponse) -> Self {
        PhoneLease::from_expiry(
            response.id,
            response.number,
            response.country,
            response.expires_at,
        )
    }
}

/// Row of the `sms_messages` table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageRow {
    pub id: MessageId,
    pub phone_number_id: LeaseId,
    pub from_number: String,
    pub content: String,
    pub received_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            lease_id: row.phone_number_id,
            sender_address: row.from_number,
            body: row.content,
            received_at: row.received_at,
        }
    }
}

/// Error body returned with non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    /// Human-readable error.
    #[serde(alias = "message")]
    pub error: String,
    /// Machine-readable error code, if any.
    #[serde(default)]
    pub code: Option<String>,
}
