//! Error contracts shared by every ISB adapter implementation.

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum ReadError {
    #[error("broker unavailable: {message}")]
    BrokerUnavailable { message: String },

    #[error("fetch failed: {message}")]
    FetchFailed { message: String },
}

#[derive(Debug, Error, Clone)]
pub enum WriteError {
    #[error("broker unavailable: {message}")]
    BrokerUnavailable { message: String },

    #[error("publish failed: {message}")]
    PublishFailed { message: String },

    #[error("buffer full: {buffer}")]
    BufferFull { buffer: String },
}

#[derive(Debug, Error, Clone)]
pub enum AckError {
    #[error("broker unavailable: {message}")]
    BrokerUnavailable { message: String },

    #[error("ack failed: {message}")]
    AckFailed { message: String },
}

#[derive(Debug, Error, Clone)]
pub enum LifecycleError {
    #[error("broker unavailable: {message}")]
    BrokerUnavailable { message: String },

    #[error("setup failed: {message}")]
    SetupFailed { message: String },

    #[error("empty buffer list")]
    EmptyBufferList,

    #[error("unsupported isb service type: {kind}")]
    UnsupportedIsbSvcType { kind: String },

    #[error("missing required environment variable: {name}")]
    MissingEnv { name: String },
}
