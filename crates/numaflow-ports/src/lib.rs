//! Port traits implemented by Numaflow's broker adapters.
//!
//! Mirrors the domain crate's "no infrastructure dependency" rule: this
//! crate depends only on `numaflow-core`, `thiserror`, and `futures` — no
//! concrete broker client.

pub mod buffer;
pub mod errors;
pub mod lifecycle;

pub use buffer::{BufferReader, BufferWriter};
pub use errors::{AckError, LifecycleError, ReadError, WriteError};
pub use lifecycle::IsbLifecycle;
