//! Domain errors shared by all higher layers.

use thiserror::Error;

/// Domain-level errors raised while building or validating pipeline state.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("duplicate vertex name: {name}")]
    DuplicateVertexName { name: String },

    #[error("edge references unknown vertex: {vertex}")]
    UnknownEdgeVertex { vertex: String },

    #[error("pipeline has no source vertex")]
    NoSourceVertex,

    #[error("vertex {name} has no inbound edge but is not a source")]
    MiscategorizedSource { name: String },

    #[error("sink vertex {name} has an outbound edge")]
    SinkHasOutboundEdge { name: String },

    #[error("pipeline graph is not acyclic")]
    CyclicGraph,

    #[error("vertex {name} must be exactly one of source, udf, sink")]
    AmbiguousVertexKind { name: String },
}

/// Errors surfaced by the offset/ack lifecycle, shared across broker adapters.
#[derive(Debug, Error, Clone)]
pub enum OffsetError {
    #[error("broker unavailable: {message}")]
    BrokerUnavailable { message: String },

    #[error("ack failed: {message}")]
    AckFailed { message: String },
}
