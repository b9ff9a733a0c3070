//! Redis Streams ISB lifecycle adapter: consumer-group create/delete/validate
//! only. Numaflow's Redis ISB backend uses a single stream per buffer with
//! one consumer group shared by every vertex replica.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, info};

use numaflow_ports::errors::LifecycleError;
use numaflow_ports::IsbLifecycle;

/// Connection settings for the Redis Streams ISB backend.
#[derive(Debug, Clone)]
pub struct RedisIsbConfig {
    pub url: String,
    pub consumer_group: String,
}

impl Default for RedisIsbConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
            consumer_group: "isb-processor".to_string(),
        }
    }
}

impl RedisIsbConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: std::env::var("ISBSVC_REDIS_URL").unwrap_or(defaults.url),
            consumer_group: std::env::var("ISBSVC_REDIS_CONSUMER_GROUP")
                .unwrap_or(defaults.consumer_group),
        }
    }
}

fn stream_key(buffer: &str) -> String {
    format!("isb:{buffer}")
}

/// A connected handle to the Redis Streams ISB backend.
#[derive(Clone)]
pub struct RedisIsb {
    conn: ConnectionManager,
    config: RedisIsbConfig,
}

impl RedisIsb {
    pub async fn connect(config: RedisIsbConfig) -> Result<Self, LifecycleError> {
        let client = redis::Client::open(config.url.as_str())
            .map_err(|e| LifecycleError::BrokerUnavailable { message: e.to_string() })?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| LifecycleError::BrokerUnavailable { message: e.to_string() })?;
        Ok(Self { conn, config })
    }
}

impl IsbLifecycle for RedisIsb {
    async fn create_buffers(&self, buffers: &[numaflow_core::spec::BufferSpec]) -> Result<(), LifecycleError> {
        if buffers.is_empty() {
            return Err(LifecycleError::EmptyBufferList);
        }
        let mut conn = self.conn.clone();
        for buffer in buffers {
            let key = stream_key(&buffer.name);
            let result: redis::RedisResult<()> = redis::cmd("XGROUP")
                .arg("CREATE")
                .arg(&key)
                .arg(&self.config.consumer_group)
                .arg("$")
                .arg("MKSTREAM")
                .query_async(&mut conn)
                .await;

            match result {
                Ok(()) => info!(stream = %key, "created redis stream and consumer group"),
                Err(e) if e.to_string().contains("BUSYGROUP") => {
                    debug!(stream = %key, "consumer group already exists");
                }
                Err(e) => return Err(LifecycleError::SetupFailed { message: e.to_string() }),
            }
        }
        Ok(())
    }

    async fn delete_buffers(&self, buffers: &[String]) -> Result<(), LifecycleError> {
        if buffers.is_empty() {
            return Err(LifecycleError::EmptyBufferList);
        }
        let mut conn = self.conn.clone();
        for buffer in buffers {
            let key = stream_key(buffer);

            let _: redis::RedisResult<()> = redis::cmd("XGROUP")
                .arg("DESTROY")
                .arg(&key)
                .arg(&self.config.consumer_group)
                .query_async(&mut conn)
                .await;

            let _: redis::RedisResult<()> = conn.del(&key).await;
            info!(stream = %key, "deleted redis stream");
        }
        Ok(())
    }

    async fn validate_buffers(&self, buffers: &[String]) -> Result<(), LifecycleError> {
        if buffers.is_empty() {
            return Err(LifecycleError::EmptyBufferList);
        }
        let mut conn = self.conn.clone();
        for buffer in buffers {
            let key = stream_key(buffer);

            let exists: bool = conn
                .exists(&key)
                .await
                .map_err(|e| LifecycleError::SetupFailed { message: e.to_string() })?;
            if !exists {
                return Err(LifecycleError::SetupFailed {
                    message: format!("stream {key} does not exist"),
                });
            }

            let groups: redis::Value = redis::cmd("XINFO")
                .arg("GROUPS")
                .arg(&key)
                .query_async(&mut conn)
                .await
                .map_err(|e| LifecycleError::SetupFailed { message: e.to_string() })?;

            let has_group = match &groups {
                redis::Value::Array(entries) => entries
                    .iter()
                    .any(|entry| format!("{entry:?}").contains(&self.config.consumer_group)),
                _ => false,
            };
            if !has_group {
                return Err(LifecycleError::SetupFailed {
                    message: format!(
                        "consumer group {} missing on stream {key}",
                        self.config.consumer_group
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_key_is_namespaced() {
        assert_eq!(stream_key("p.a-b"), "isb:p.a-b");
    }

    #[test]
    fn config_from_env_falls_back_to_defaults() {
        let config = RedisIsbConfig::default();
        assert_eq!(config.url, "redis://localhost:6379");
        assert_eq!(config.consumer_group, "isb-processor");
    }
}
