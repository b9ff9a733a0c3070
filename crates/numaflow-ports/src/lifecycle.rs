//! ISB lifecycle management: create, delete, and validate the durable
//! broker-side objects (streams/consumer groups) that back a pipeline's
//! buffers, independent of which broker implements them.

use std::future::Future;

use numaflow_core::spec::BufferSpec;

use crate::errors::LifecycleError;

/// Implemented once per ISB backend (JetStream streams, Redis consumer
/// groups). The CLI's `isbsvc-buffer-*` subcommands and the controller's
/// buffer-create Job dispatch to whichever implementation matches the
/// pipeline's configured `IsbSvcType`.
pub trait IsbLifecycle: Send + Sync {
    /// Create the durable objects backing every buffer, honoring each
    /// buffer's merged `max_length` when the backend supports a cap. Must
    /// be safe to call again against a buffer that already exists.
    fn create_buffers(
        &self,
        buffers: &[BufferSpec],
    ) -> impl Future<Output = Result<(), LifecycleError>> + Send;

    /// Delete the durable objects backing every named buffer. Must be a
    /// no-op, not an error, for a buffer that no longer exists.
    fn delete_buffers(
        &self,
        buffers: &[String],
    ) -> impl Future<Output = Result<(), LifecycleError>> + Send;

    /// Verify that every named buffer's durable objects exist and are
    /// correctly configured (e.g. the expected consumer group is present).
    fn validate_buffers(
        &self,
        buffers: &[String],
    ) -> impl Future<Output = Result<(), LifecycleError>> + Send;
}
