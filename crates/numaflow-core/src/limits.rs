//! Limit propagation: per-field precedence merge of vertex/edge overrides
//! over pipeline-wide defaults.

use crate::spec::{EdgeLimits, Limits, VertexLimits};

/// Resolve the effective read limits for a vertex: each field independently
/// takes the vertex's own override if set, else the pipeline default, else
/// stays unset.
#[must_use]
pub fn copy_vertex_limits(pipeline: Option<&Limits>, vertex: Option<&VertexLimits>) -> VertexLimits {
    VertexLimits {
        read_batch_size: vertex
            .and_then(|v| v.read_batch_size)
            .or_else(|| pipeline.and_then(|p| p.read_batch_size)),
        read_timeout_ms: vertex
            .and_then(|v| v.read_timeout_ms)
            .or_else(|| pipeline.and_then(|p| p.read_timeout_ms)),
    }
}

/// Resolve the effective buffer limits for an edge, with the same
/// vertex/edge-over-pipeline precedence as `copy_vertex_limits`.
#[must_use]
pub fn copy_edge_limits(pipeline: Option<&Limits>, edge: Option<&EdgeLimits>) -> EdgeLimits {
    EdgeLimits {
        buffer_max_length: edge
            .and_then(|e| e.buffer_max_length)
            .or_else(|| pipeline.and_then(|p| p.buffer_max_length)),
        buffer_usage_limit_permille: edge
            .and_then(|e| e.buffer_usage_limit_permille)
            .or_else(|| pipeline.and_then(|p| p.buffer_usage_limit_permille)),
    }
}

/// Default read batch size applied when neither vertex nor pipeline set one.
pub const DEFAULT_READ_BATCH_SIZE: u64 = 500;

/// Default read timeout applied when neither vertex nor pipeline set one.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1_000;

/// Default buffer max length applied when neither edge nor pipeline set one.
pub const DEFAULT_BUFFER_MAX_LENGTH: u64 = 30_000;

/// Default buffer usage limit (per-mille of max length) applied when neither
/// edge nor pipeline set one.
pub const DEFAULT_BUFFER_USAGE_LIMIT_PERMILLE: u32 = 800;

impl VertexLimits {
    /// Fill any unset field with the documented system default.
    #[must_use]
    pub fn or_defaults(self) -> Self {
        Self {
            read_batch_size: Some(self.read_batch_size.unwrap_or(DEFAULT_READ_BATCH_SIZE)),
            read_timeout_ms: Some(self.read_timeout_ms.unwrap_or(DEFAULT_READ_TIMEOUT_MS)),
        }
    }
}

impl EdgeLimits {
    /// Fill any unset field with the documented system default.
    #[must_use]
    pub fn or_defaults(self) -> Self {
        Self {
            buffer_max_length: Some(self.buffer_max_length.unwrap_or(DEFAULT_BUFFER_MAX_LENGTH)),
            buffer_usage_limit_permille: Some(
                self.buffer_usage_limit_permille
                    .unwrap_or(DEFAULT_BUFFER_USAGE_LIMIT_PERMILLE),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_override_wins_over_pipeline() {
        let pipeline = Limits {
            read_batch_size: Some(100),
            read_timeout_ms: Some(500),
            ..Default::default()
        };
        let vertex = VertexLimits {
            read_batch_size: Some(250),
            read_timeout_ms: None,
        };
        let merged = copy_vertex_limits(Some(&pipeline), Some(&vertex));
        assert_eq!(merged.read_batch_size, Some(250));
        assert_eq!(merged.read_timeout_ms, Some(500));
    }

    #[test]
    fn unset_everywhere_stays_unset() {
        let merged = copy_vertex_limits(None, None);
        assert_eq!(merged.read_batch_size, None);
        assert_eq!(merged.read_timeout_ms, None);
    }

    #[test]
    fn or_defaults_fills_gaps() {
        let merged = copy_vertex_limits(None, None).or_defaults();
        assert_eq!(merged.read_batch_size, Some(DEFAULT_READ_BATCH_SIZE));
        assert_eq!(merged.read_timeout_ms, Some(DEFAULT_READ_TIMEOUT_MS));
    }

    #[test]
    fn edge_override_wins_over_pipeline() {
        let pipeline = Limits {
            buffer_max_length: Some(10_000),
            buffer_usage_limit_permille: Some(750),
            ..Default::default()
        };
        let edge = EdgeLimits {
            buffer_max_length: None,
            buffer_usage_limit_permille: Some(900),
        };
        let merged = copy_edge_limits(Some(&pipeline), Some(&edge));
        assert_eq!(merged.buffer_max_length, Some(10_000));
        assert_eq!(merged.buffer_usage_limit_permille, Some(900));
    }
}
