//! Controller-level errors: reconcile failures wrap the lower-layer errors
//! from the domain, port, and adapter crates plus the kube client itself.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("kube api error: {0}")]
    Kube(#[from] kube::Error),

    #[error("finalizer error: {0}")]
    Finalizer(#[from] Box<kube::runtime::finalizer::Error<ControllerError>>),

    #[error(transparent)]
    Domain(#[from] numaflow_core::errors::DomainError),

    #[error(transparent)]
    Lifecycle(#[from] numaflow_ports::errors::LifecycleError),

    #[error("pipeline object has no name")]
    MissingName,

    #[error("pipeline object has no namespace")]
    MissingNamespace,
}
