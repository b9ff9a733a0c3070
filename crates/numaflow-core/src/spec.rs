//! Declarative data model: Pipeline, Vertex, Edge, and their limits.
//!
//! These are plain value types — no Kubernetes or broker dependency lives
//! here. `numaflow-controller` owns the `kube::CustomResource`-derived wire
//! types and converts them into these before calling into this crate's pure
//! functions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which ISB service backend a pipeline buffer is provisioned against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IsbSvcType {
    Redis,
    JetStream,
}

impl FromStr for IsbSvcType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "jetstream" => Ok(Self::JetStream),
            other => Err(other.to_string()),
        }
    }
}

impl std::fmt::Display for IsbSvcType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Redis => write!(f, "redis"),
            Self::JetStream => write!(f, "jetstream"),
        }
    }
}

/// Pipeline-wide or vertex-level read/write limits. Every field is
/// independently optional so callers can apply per-field override precedence
/// (vertex/edge value wins, else pipeline value, else unset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub read_batch_size: Option<u64>,
    pub read_timeout_ms: Option<u64>,
    pub buffer_max_length: Option<u64>,
    pub buffer_usage_limit_permille: Option<u32>,
}

/// The subset of `Limits` that applies to a vertex's read behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexLimits {
    pub read_batch_size: Option<u64>,
    pub read_timeout_ms: Option<u64>,
}

/// The subset of `Limits` that applies to an edge's backing buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLimits {
    pub buffer_max_length: Option<u64>,
    pub buffer_usage_limit_permille: Option<u32>,
}

/// One buffer to create, carrying the merged `buffer_max_length` that
/// `copy_edge_limits` computed for its owning edge. Passed (JSON-encoded) to
/// the `isbsvc-buffer-create` command so the merged limit actually reaches
/// the broker-side stream/queue instead of being computed and discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferSpec {
    pub name: String,
    pub max_length: Option<u64>,
}

/// A vertex is exactly one of source, UDF, or sink. The payload of each
/// variant is intentionally opaque (`serde_json::Value`) — container image
/// packaging and built-in UDF bodies are external collaborators per spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VertexKind {
    Source(serde_json::Value),
    Udf(serde_json::Value),
    Sink(serde_json::Value),
}

impl VertexKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Source(_) => "source",
            Self::Udf(_) => "udf",
            Self::Sink(_) => "sink",
        }
    }
}

/// One vertex as declared in a Pipeline spec, prior to limit merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexSpec {
    pub name: String,
    pub kind: VertexKind,
    pub replicas: Option<u32>,
    pub limits: Option<VertexLimits>,
}

/// A directed connection between two declared vertices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    pub limits: Option<EdgeLimits>,
}

/// The declarative Pipeline object: vertices, edges, pipeline-wide limits,
/// and the ISBSvc reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub name: String,
    pub namespace: String,
    pub vertices: Vec<VertexSpec>,
    pub edges: Vec<EdgeSpec>,
    pub limits: Option<Limits>,
    pub isb_svc_name: Option<String>,
}

/// Default ISBSvc name used when a Pipeline does not reference one.
pub const DEFAULT_ISBSVC_NAME: &str = "default";

impl Pipeline {
    /// The ISBSvc name this pipeline resolves against.
    #[must_use]
    pub fn isb_svc_name(&self) -> &str {
        self.isb_svc_name
            .as_deref()
            .unwrap_or(DEFAULT_ISBSVC_NAME)
    }

    /// Derived name for a Vertex belonging to this pipeline: `<pipeline>-<vertex>`.
    #[must_use]
    pub fn vertex_name(&self, vertex: &str) -> String {
        format!("{}-{}", self.name, vertex)
    }

    /// Derived name for the edge's backing buffer: `<pipeline>.<from>-<to>`.
    #[must_use]
    pub fn buffer_name(&self, edge: &EdgeSpec) -> String {
        format!("{}.{}-{}", self.name, edge.from, edge.to)
    }

    /// Name of the daemon Deployment: `<pipeline>-daemon`.
    #[must_use]
    pub fn daemon_deployment_name(&self) -> String {
        format!("{}-daemon", self.name)
    }

    /// Name of the daemon ClusterIP Service: `<pipeline>-daemon-svc`.
    #[must_use]
    pub fn daemon_service_name(&self) -> String {
        format!("{}-daemon-svc", self.name)
    }

    /// Validate the structural invariants from the data model: unique vertex
    /// names, edges referencing declared vertices, exactly one source with no
    /// inbound edge, no outbound edges from a sink, and an acyclic graph.
    pub fn validate(&self) -> Result<(), crate::errors::DomainError> {
        use std::collections::{HashMap, HashSet};

        let mut seen = HashSet::new();
        for v in &self.vertices {
            if !seen.insert(v.name.as_str()) {
                return Err(crate::errors::DomainError::DuplicateVertexName {
                    name: v.name.clone(),
                });
            }
        }

        let names: HashSet<&str> = self.vertices.iter().map(|v| v.name.as_str()).collect();
        for e in &self.edges {
            if !names.contains(e.from.as_str()) {
                return Err(crate::errors::DomainError::UnknownEdgeVertex {
                    vertex: e.from.clone(),
                });
            }
            if !names.contains(e.to.as_str()) {
                return Err(crate::errors::DomainError::UnknownEdgeVertex {
                    vertex: e.to.clone(),
                });
            }
        }

        let mut has_inbound: HashMap<&str, bool> = names.iter().map(|n| (*n, false)).collect();
        let mut has_outbound: HashMap<&str, bool> = names.iter().map(|n| (*n, false)).collect();
        for e in &self.edges {
            has_inbound.insert(e.to.as_str(), true);
            has_outbound.insert(e.from.as_str(), true);
        }

        let without_inbound: Vec<&str> = has_inbound
            .iter()
            .filter(|(_, inbound)| !**inbound)
            .map(|(name, _)| *name)
            .collect();
        if without_inbound.len() != 1 {
            return Err(crate::errors::DomainError::NoSourceVertex);
        }
        let declared_source = without_inbound[0];
        let source_vertex = self.vertices.iter().find(|v| v.name == declared_source);
        if !matches!(source_vertex.map(|v| &v.kind), Some(VertexKind::Source(_))) {
            return Err(crate::errors::DomainError::MiscategorizedSource {
                name: declared_source.to_string(),
            });
        }

        for v in &self.vertices {
            if matches!(v.kind, VertexKind::Sink(_)) && *has_outbound.get(v.name.as_str()).unwrap_or(&false) {
                return Err(crate::errors::DomainError::SinkHasOutboundEdge { name: v.name.clone() });
            }
        }

        if has_cycle(&self.vertices, &self.edges) {
            return Err(crate::errors::DomainError::CyclicGraph);
        }

        Ok(())
    }
}

fn has_cycle(vertices: &[VertexSpec], edges: &[EdgeSpec]) -> bool {
    use std::collections::{HashMap, HashSet};

    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    for v in vertices {
        adjacency.entry(v.name.as_str()).or_default();
    }
    for e in edges {
        adjacency.entry(e.from.as_str()).or_default().push(e.to.as_str());
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Visiting,
        Done,
    }

    let mut marks: HashMap<&str, Mark> = HashMap::new();

    fn visit<'a>(
        node: &'a str,
        adjacency: &HashMap<&'a str, Vec<&'a str>>,
        marks: &mut HashMap<&'a str, Mark>,
    ) -> bool {
        match marks.get(node) {
            Some(Mark::Done) => return false,
            Some(Mark::Visiting) => return true,
            None => {}
        }
        marks.insert(node, Mark::Visiting);
        if let Some(next) = adjacency.get(node) {
            for n in next {
                if visit(n, adjacency, marks) {
                    return true;
                }
            }
        }
        marks.insert(node, Mark::Done);
        false
    }

    let all: HashSet<&str> = adjacency.keys().copied().collect();
    for node in all {
        if visit(node, &adjacency, &mut marks) {
            return true;
        }
    }
    false
}

/// A derived Vertex resource: one per declared pipeline vertex.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub name: String,
    pub pipeline_name: String,
    pub from_vertices: Vec<String>,
    pub to_vertices: Vec<String>,
    pub replicas: u32,
    pub limits: VertexLimits,
    pub kind: VertexKind,
}

impl Vertex {
    /// Default replica count applied when a vertex does not set one.
    pub const DEFAULT_REPLICAS: u32 = 1;
}
