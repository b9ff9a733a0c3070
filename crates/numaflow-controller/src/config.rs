//! Controller process configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub namespace: Option<String>,
    pub default_isb_svc_name: String,
    pub requeue_secs: u64,
    pub health_port: u16,
    pub log_level: String,
    /// Image reference stamped onto buffer-create/cleanup Job pod templates,
    /// running the workspace's own CLI binary.
    pub numaflow_image: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            default_isb_svc_name: "default".to_string(),
            requeue_secs: 30,
            health_port: 8080,
            log_level: "info".to_string(),
            numaflow_image: "numaflow:latest".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Build from `NUMAFLOW_CONTROLLER_*` environment variables, falling
    /// back to defaults for anything unset. `namespace` unset means
    /// cluster-wide watch.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            namespace: std::env::var("NUMAFLOW_CONTROLLER_NAMESPACE").ok(),
            default_isb_svc_name: std::env::var("NUMAFLOW_CONTROLLER_DEFAULT_ISBSVC_NAME")
                .unwrap_or(defaults.default_isb_svc_name),
            requeue_secs: std::env::var("NUMAFLOW_CONTROLLER_REQUEUE_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.requeue_secs),
            health_port: std::env::var("NUMAFLOW_CONTROLLER_HEALTH_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.health_port),
            log_level: std::env::var("NUMAFLOW_CONTROLLER_LOG_LEVEL").unwrap_or(defaults.log_level),
            numaflow_image: std::env::var("NumaflowImage").unwrap_or(defaults.numaflow_image),
        }
    }

    #[must_use]
    pub fn requeue_after(&self) -> Duration {
        Duration::from_secs(self.requeue_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = ControllerConfig::default();
        assert_eq!(config.default_isb_svc_name, "default");
        assert_eq!(config.requeue_after(), Duration::from_secs(30));
        assert!(config.namespace.is_none());
    }
}
