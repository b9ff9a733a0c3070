//! Errors raised while bootstrapping a vertex processor from its environment.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },

    #[error("failed to decode {name}: {message}")]
    DecodeFailed { name: &'static str, message: String },

    #[error("invalid replica index: {value}")]
    InvalidReplica { value: String },

    #[error("unrecognized built-in processor type: {kind}")]
    UnrecognizedProcessorType { kind: String },

    #[error(transparent)]
    Lifecycle(#[from] numaflow_ports::errors::LifecycleError),

    #[error(transparent)]
    Read(#[from] numaflow_ports::errors::ReadError),

    #[error(transparent)]
    Write(#[from] numaflow_ports::errors::WriteError),

    #[error(transparent)]
    Ack(#[from] numaflow_ports::errors::AckError),
}
