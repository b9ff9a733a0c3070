//! Dispatches ISB lifecycle commands to whichever backend a pipeline's
//! `IsbSvcType` names, without the CLI or controller needing to know the
//! concrete adapter type.

use numaflow_core::spec::{BufferSpec, IsbSvcType};
use numaflow_ports::errors::LifecycleError;
use numaflow_ports::IsbLifecycle;

use crate::jetstream::{JetStreamConfig, JetStreamIsb};
use crate::redis_lifecycle::{RedisIsb, RedisIsbConfig};

/// Either concrete lifecycle backend, behind one `IsbLifecycle` impl.
pub enum AnyIsbLifecycle {
    Redis(RedisIsb),
    JetStream(JetStreamIsb),
}

impl AnyIsbLifecycle {
    /// Connect to whichever backend `kind` names, reading that backend's
    /// settings from its own environment variables.
    pub async fn connect(kind: IsbSvcType) -> Result<Self, LifecycleError> {
        match kind {
            IsbSvcType::Redis => Ok(Self::Redis(RedisIsb::connect(RedisIsbConfig::from_env()).await?)),
            IsbSvcType::JetStream => {
                Ok(Self::JetStream(JetStreamIsb::connect(JetStreamConfig::from_env()).await?))
            }
        }
    }
}

impl IsbLifecycle for AnyIsbLifecycle {
    async fn create_buffers(&self, buffers: &[BufferSpec]) -> Result<(), LifecycleError> {
        match self {
            Self::Redis(inner) => inner.create_buffers(buffers).await,
            Self::JetStream(inner) => inner.create_buffers(buffers).await,
        }
    }

    async fn delete_buffers(&self, buffers: &[String]) -> Result<(), LifecycleError> {
        match self {
            Self::Redis(inner) => inner.delete_buffers(buffers).await,
            Self::JetStream(inner) => inner.delete_buffers(buffers).await,
        }
    }

    async fn validate_buffers(&self, buffers: &[String]) -> Result<(), LifecycleError> {
        match self {
            Self::Redis(inner) => inner.validate_buffers(buffers).await,
            Self::JetStream(inner) => inner.validate_buffers(buffers).await,
        }
    }
}
