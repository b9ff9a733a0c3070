//! The `Offset` contract: an opaque token identifying a delivered message.
//!
//! Ownership: created by a reader for each delivered message; owned by
//! whoever currently holds the `ReadMessage`; must be either acknowledged
//! exactly once or abandoned (the broker redelivers after ack-wait expiry).
//! Acknowledgement is idempotent — a repeated or late ack returns success.

use std::fmt::Debug;
use std::future::Future;

use crate::errors::OffsetError;

/// Implemented by each broker adapter's concrete offset type (e.g. the
/// JetStream adapter's stream-sequence-backed offset). Pure domain code only
/// ever interacts with offsets through this trait.
pub trait Offset: Debug + Send + Sync {
    /// Stable string form of the offset, used in logs and metrics.
    fn to_string_offset(&self) -> String;

    /// Broker-assigned monotonic sequence number within the buffer.
    fn sequence(&self) -> i64;

    /// Acknowledge the message this offset identifies. Idempotent: calling
    /// this twice, or after the broker has already expired/redelivered the
    /// message, must resolve to `Ok(())`.
    fn ack_it(&self) -> impl Future<Output = Result<(), OffsetError>> + Send;
}
