//! Message and header value types per the ISB data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::offset::Offset;

/// Message header. Carried verbatim by a `BufferWriter` as broker-visible
/// headers so that a `BufferReader` can reconstruct it byte-for-byte (modulo
/// millisecond truncation of the time fields, which is the wire precision).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub id: String,
    pub key: String,
    pub event_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_window: bool,
}

impl Header {
    /// Truncate all time fields to millisecond precision, matching the wire
    /// format's resolution. Used so in-memory headers compare equal to the
    /// result of an encode/decode round-trip.
    #[must_use]
    pub fn truncated_to_millis(&self) -> Self {
        Self {
            id: self.id.clone(),
            key: self.key.clone(),
            event_time: truncate_millis(self.event_time),
            start_time: truncate_millis(self.start_time),
            end_time: truncate_millis(self.end_time),
            is_window: self.is_window,
        }
    }
}

fn truncate_millis(t: DateTime<Utc>) -> DateTime<Utc> {
    let millis = t.timestamp_millis();
    DateTime::from_timestamp_millis(millis).unwrap_or(t)
}

/// An opaque message body. Payload bytes are never interpreted by the core or
/// the ISB layer (schema validation of user payloads is a non-goal).
pub type Body = Vec<u8>;

/// A message as produced by a writer or consumed before a read offset is
/// attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub header: Header,
    pub body: Body,
}

/// A message as delivered by a `BufferReader`, carrying the offset under
/// which it must eventually be acknowledged or abandoned.
pub struct ReadMessage<O: Offset> {
    pub message: Message,
    pub offset: O,
}

impl<O: Offset> ReadMessage<O> {
    pub fn new(message: Message, offset: O) -> Self {
        Self { message, offset }
    }
}
