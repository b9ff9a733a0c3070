//! Broker adapters implementing `numaflow-ports`' trait contracts.

pub mod dispatch;
pub mod headers;
pub mod heartbeat;
pub mod jetstream;
pub mod redis_lifecycle;

pub use dispatch::AnyIsbLifecycle;
pub use jetstream::{JetStreamBufferReader, JetStreamBufferWriter, JetStreamConfig, JetStreamIsb, JetStreamOffset};
pub use redis_lifecycle::{RedisIsb, RedisIsbConfig};
