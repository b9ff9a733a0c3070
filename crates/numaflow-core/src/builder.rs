//! Deterministic construction of the derived Vertex set from a Pipeline spec.

use std::collections::BTreeMap;

use crate::limits::copy_vertex_limits;
use crate::spec::{Pipeline, Vertex};

/// Build the complete set of derived Vertex objects for a pipeline.
///
/// Deterministic: the same `Pipeline` value always produces the same map,
/// keyed by `<pipeline>-<vertex>` as returned by [`Pipeline::vertex_name`].
/// `from_vertices`/`to_vertices` on each entry are derived from the edge list
/// and sorted for stable output regardless of edge declaration order.
#[must_use]
pub fn build_vertices(pipeline: &Pipeline) -> BTreeMap<String, Vertex> {
    let mut from_vertices: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    let mut to_vertices: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    for edge in &pipeline.edges {
        to_vertices.entry(edge.from.as_str()).or_default().push(edge.to.as_str());
        from_vertices.entry(edge.to.as_str()).or_default().push(edge.from.as_str());
    }

    pipeline
        .vertices
        .iter()
        .map(|v| {
            let name = pipeline.vertex_name(&v.name);
            let limits = copy_vertex_limits(pipeline.limits.as_ref(), v.limits.as_ref()).or_defaults();

            let mut from: Vec<String> = from_vertices
                .get(v.name.as_str())
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(str::to_string)
                .collect();
            from.sort();

            let mut to: Vec<String> = to_vertices
                .get(v.name.as_str())
                .cloned()
                .unwrap_or_default()
                .into_iter()
                .map(str::to_string)
                .collect();
            to.sort();

            let vertex = Vertex {
                name: name.clone(),
                pipeline_name: pipeline.name.clone(),
                from_vertices: from,
                to_vertices: to,
                replicas: v.replicas.unwrap_or(Vertex::DEFAULT_REPLICAS),
                limits,
                kind: v.kind.clone(),
            };

            (name, vertex)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::spec::{EdgeSpec, VertexKind, VertexSpec};

    fn sample_pipeline() -> Pipeline {
        Pipeline {
            name: "simple".to_string(),
            namespace: "default".to_string(),
            vertices: vec![
                VertexSpec {
                    name: "in".to_string(),
                    kind: VertexKind::Source(json!({})),
                    replicas: None,
                    limits: None,
                },
                VertexSpec {
                    name: "cat".to_string(),
                    kind: VertexKind::Udf(json!({})),
                    replicas: Some(3),
                    limits: None,
                },
                VertexSpec {
                    name: "out".to_string(),
                    kind: VertexKind::Sink(json!({})),
                    replicas: None,
                    limits: None,
                },
            ],
            edges: vec![
                EdgeSpec { from: "in".to_string(), to: "cat".to_string(), limits: None },
                EdgeSpec { from: "cat".to_string(), to: "out".to_string(), limits: None },
            ],
            limits: None,
            isb_svc_name: None,
        }
    }

    #[test]
    fn builds_one_vertex_per_declared_vertex() {
        let pipeline = sample_pipeline();
        let vertices = build_vertices(&pipeline);
        assert_eq!(vertices.len(), 3);
        assert!(vertices.contains_key("simple-in"));
        assert!(vertices.contains_key("simple-cat"));
        assert!(vertices.contains_key("simple-out"));
    }

    #[test]
    fn derives_from_and_to_vertices_from_edges() {
        let pipeline = sample_pipeline();
        let vertices = build_vertices(&pipeline);

        let cat = &vertices["simple-cat"];
        assert_eq!(cat.from_vertices, vec!["in".to_string()]);
        assert_eq!(cat.to_vertices, vec!["out".to_string()]);

        let source = &vertices["simple-in"];
        assert!(source.from_vertices.is_empty());
        assert_eq!(source.to_vertices, vec!["cat".to_string()]);
    }

    #[test]
    fn replica_override_is_respected_and_default_applies_otherwise() {
        let pipeline = sample_pipeline();
        let vertices = build_vertices(&pipeline);
        assert_eq!(vertices["simple-cat"].replicas, 3);
        assert_eq!(vertices["simple-in"].replicas, Vertex::DEFAULT_REPLICAS);
    }

    #[test]
    fn is_deterministic_across_calls() {
        let pipeline = sample_pipeline();
        assert_eq!(build_vertices(&pipeline), build_vertices(&pipeline));
    }
}
