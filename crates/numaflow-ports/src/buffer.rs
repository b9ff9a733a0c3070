//! `BufferReader`/`BufferWriter`: the read/write side of an Inter-Step Buffer.
//!
//! Every broker adapter (JetStream, and any future backend) implements these
//! two traits once; the processor vertex loop and the daemon's lag reporting
//! code are written entirely against them.

use std::future::Future;

use numaflow_core::message::{Message, ReadMessage};
use numaflow_core::offset::Offset;

use crate::errors::{AckError, ReadError, WriteError};

/// The read side of a buffer, bound to a specific consumer group.
pub trait BufferReader: Send + Sync {
    type Offset: Offset;

    /// Name of the buffer this reader consumes from.
    fn name(&self) -> &str;

    /// Fetch up to `count` messages, waiting no longer than the reader's
    /// configured read timeout. Returns fewer than `count` (including zero)
    /// when the buffer does not have that many messages ready.
    fn read(
        &self,
        count: usize,
    ) -> impl Future<Output = Result<Vec<ReadMessage<Self::Offset>>, ReadError>> + Send;

    /// Acknowledge a batch of previously read offsets. Returns one result per
    /// input offset, positionally aligned, so a poisoned offset never blocks
    /// acknowledgement of the rest of the batch (idempotent per
    /// [`Offset::ack_it`]).
    fn ack(
        &self,
        offsets: &[Self::Offset],
    ) -> impl Future<Output = Vec<Result<(), AckError>>> + Send;

    /// Release any held resources (consumer subscriptions, background
    /// heartbeat tasks). Safe to call more than once.
    fn close(&self) -> impl Future<Output = ()> + Send;
}

/// The write side of a buffer.
pub trait BufferWriter: Send + Sync {
    /// Name of the buffer this writer publishes to.
    fn name(&self) -> &str;

    /// Publish a batch of messages, preserving input order. Returns one
    /// result per input message; a single rejected message does not fail the
    /// rest of the batch.
    fn write(
        &self,
        messages: Vec<Message>,
    ) -> impl Future<Output = Vec<Result<(), WriteError>>> + Send;

    /// Release any held resources. Safe to call more than once.
    fn close(&self) -> impl Future<Output = ()> + Send;
}
