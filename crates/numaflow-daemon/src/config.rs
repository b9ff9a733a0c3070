//! Daemon process configuration.

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub host: String,
    pub port: u16,
    pub pipeline_name: String,
    pub log_level: String,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4327,
            pipeline_name: String::new(),
            log_level: "info".to_string(),
        }
    }
}

impl DaemonConfig {
    /// Build from `NUMAFLOW_DAEMON_*` environment variables. `PIPELINE_NAME`
    /// is required in a real deployment but left empty (not fatal) so the
    /// health endpoints still work during local development.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("NUMAFLOW_DAEMON_HOST").unwrap_or(defaults.host),
            port: std::env::var("NUMAFLOW_DAEMON_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            pipeline_name: std::env::var("PIPELINE_NAME").unwrap_or_default(),
            log_level: std::env::var("NUMAFLOW_DAEMON_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_to_the_standard_daemon_port() {
        let config = DaemonConfig::default();
        assert_eq!(config.bind_addr(), "0.0.0.0:4327");
    }
}
