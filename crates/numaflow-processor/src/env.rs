//! Bootstraps a processor's view of its own vertex from the environment the
//! controller set on the pod spec: a base64-encoded JSON `Vertex` object, the
//! pod name, and the replica index.

use base64::Engine;
use numaflow_core::spec::Vertex;

use crate::errors::ProcessorError;

pub struct ProcessorEnv {
    pub vertex: Vertex,
    pub pod_name: String,
    pub replica: u32,
}

impl ProcessorEnv {
    pub fn from_env() -> Result<Self, ProcessorError> {
        let encoded = std::env::var("VERTEX_OBJECT")
            .map_err(|_| ProcessorError::MissingEnv { name: "VERTEX_OBJECT" })?;
        let decoded_bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| ProcessorError::DecodeFailed { name: "VERTEX_OBJECT", message: e.to_string() })?;
        let vertex: Vertex = serde_json::from_slice(&decoded_bytes)
            .map_err(|e| ProcessorError::DecodeFailed { name: "VERTEX_OBJECT", message: e.to_string() })?;

        let pod_name =
            std::env::var("POD_NAME").map_err(|_| ProcessorError::MissingEnv { name: "POD_NAME" })?;

        let replica_raw = std::env::var("VERTEX_REPLICA")
            .map_err(|_| ProcessorError::MissingEnv { name: "VERTEX_REPLICA" })?;
        let replica: u32 = replica_raw
            .parse()
            .map_err(|_| ProcessorError::InvalidReplica { value: replica_raw })?;

        Ok(Self { vertex, pod_name, replica })
    }
}

#[cfg(test)]
mod tests {
    use numaflow_core::spec::{VertexKind, VertexLimits};

    use super::*;

    fn sample_vertex() -> Vertex {
        Vertex {
            name: "p-cat".to_string(),
            pipeline_name: "p".to_string(),
            from_vertices: vec!["in".to_string()],
            to_vertices: vec!["out".to_string()],
            replicas: 1,
            limits: VertexLimits::default(),
            kind: VertexKind::Udf(serde_json::json!({"builtin": "cat"})),
        }
    }

    #[test]
    fn decodes_a_well_formed_vertex_object() {
        let vertex = sample_vertex();
        let json = serde_json::to_vec(&vertex).unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);

        std::env::set_var("VERTEX_OBJECT", &encoded);
        std::env::set_var("POD_NAME", "p-cat-0");
        std::env::set_var("VERTEX_REPLICA", "0");

        let env = ProcessorEnv::from_env().unwrap();
        assert_eq!(env.vertex.name, "p-cat");
        assert_eq!(env.pod_name, "p-cat-0");
        assert_eq!(env.replica, 0);

        std::env::remove_var("VERTEX_OBJECT");
        std::env::remove_var("POD_NAME");
        std::env::remove_var("VERTEX_REPLICA");
    }

    #[test]
    fn invalid_replica_is_reported() {
        let vertex = sample_vertex();
        let json = serde_json::to_vec(&vertex).unwrap();
        let encoded = base64::engine::general_purpose::STANDARD.encode(json);

        std::env::set_var("VERTEX_OBJECT", &encoded);
        std::env::set_var("POD_NAME", "p-cat-0");
        std::env::set_var("VERTEX_REPLICA", "not-a-number");

        let err = ProcessorEnv::from_env().unwrap_err();
        assert!(matches!(err, ProcessorError::InvalidReplica { .. }));

        std::env::remove_var("VERTEX_OBJECT");
        std::env::remove_var("POD_NAME");
        std::env::remove_var("VERTEX_REPLICA");
    }
}
