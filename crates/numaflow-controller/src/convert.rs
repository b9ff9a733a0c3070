//! Conversions between the Kubernetes wire types in `crd.rs` and the pure
//! domain types in `numaflow_core`.

use numaflow_core::phase::{Condition, PipelinePhase, PipelineStatus};
use numaflow_core::spec::{
    EdgeLimits, EdgeSpec, Limits, Pipeline as DomainPipeline, Vertex as DomainVertex, VertexKind,
    VertexLimits, VertexSpec,
};

use crate::crd::{
    ConditionCrd, EdgeLimitsCrd, EdgeSpecCrd, LimitsCrd, Pipeline as PipelineCrd, PipelineStatusCrd,
    VertexKindCrd, VertexLimitsCrd, VertexSpecCrd,
};

fn kind_from_crd(kind: VertexKindCrd) -> VertexKind {
    match kind {
        VertexKindCrd::Source(v) => VertexKind::Source(v),
        VertexKindCrd::Udf(v) => VertexKind::Udf(v),
        VertexKindCrd::Sink(v) => VertexKind::Sink(v),
    }
}

fn kind_to_crd(kind: &VertexKind) -> VertexKindCrd {
    match kind {
        VertexKind::Source(v) => VertexKindCrd::Source(v.clone()),
        VertexKind::Udf(v) => VertexKindCrd::Udf(v.clone()),
        VertexKind::Sink(v) => VertexKindCrd::Sink(v.clone()),
    }
}

fn limits_from_crd(limits: LimitsCrd) -> Limits {
    Limits {
        read_batch_size: limits.read_batch_size,
        read_timeout_ms: limits.read_timeout_ms,
        buffer_max_length: limits.buffer_max_length,
        buffer_usage_limit_permille: limits.buffer_usage_limit_permille,
    }
}

fn vertex_limits_from_crd(limits: VertexLimitsCrd) -> VertexLimits {
    VertexLimits { read_batch_size: limits.read_batch_size, read_timeout_ms: limits.read_timeout_ms }
}

pub fn vertex_limits_to_crd(limits: &VertexLimits) -> VertexLimitsCrd {
    VertexLimitsCrd { read_batch_size: limits.read_batch_size, read_timeout_ms: limits.read_timeout_ms }
}

fn edge_limits_from_crd(limits: EdgeLimitsCrd) -> EdgeLimits {
    EdgeLimits {
        buffer_max_length: limits.buffer_max_length,
        buffer_usage_limit_permille: limits.buffer_usage_limit_permille,
    }
}

/// Build the pure domain `Pipeline` that `numaflow-core`'s builder functions
/// operate on, from an observed Pipeline custom resource.
pub fn pipeline_to_domain(name: &str, namespace: &str, cr: &PipelineCrd) -> DomainPipeline {
    let spec = &cr.spec;
    DomainPipeline {
        name: name.to_string(),
        namespace: namespace.to_string(),
        vertices: spec
            .vertices
            .iter()
            .cloned()
            .map(|v: VertexSpecCrd| VertexSpec {
                name: v.name,
                kind: kind_from_crd(v.kind),
                replicas: v.replicas,
                limits: v.limits.map(vertex_limits_from_crd),
            })
            .collect(),
        edges: spec
            .edges
            .iter()
            .cloned()
            .map(|e: EdgeSpecCrd| EdgeSpec { from: e.from, to: e.to, limits: e.limits.map(edge_limits_from_crd) })
            .collect(),
        limits: spec.limits.clone().map(limits_from_crd),
        isb_svc_name: spec.isb_svc_name.clone(),
    }
}

/// Render a `PipelineStatus` into its wire representation.
pub fn status_to_crd(status: &PipelineStatus) -> PipelineStatusCrd {
    PipelineStatusCrd {
        phase: status.phase.map(|p| format!("{p:?}")),
        conditions: status
            .conditions
            .iter()
            .map(|c: &Condition| ConditionCrd {
                kind: c.kind.clone(),
                status: c.status,
                reason: c.reason.clone(),
                message: c.message.clone(),
            })
            .collect(),
        observed_generation: status.observed_generation,
        message: status.message.clone(),
    }
}

/// Parse a status' phase string back into the domain enum, used when
/// deciding whether a transition is valid before writing a new phase.
#[must_use]
pub fn phase_from_crd(phase: &str) -> Option<PipelinePhase> {
    match phase {
        "Pending" => Some(PipelinePhase::Pending),
        "Waiting" => Some(PipelinePhase::Waiting),
        "Deploying" => Some(PipelinePhase::Deploying),
        "Running" => Some(PipelinePhase::Running),
        "Deleting" => Some(PipelinePhase::Deleting),
        "Gone" => Some(PipelinePhase::Gone),
        _ => None,
    }
}

/// Render the limits on a derived `numaflow_core::Vertex` back to wire form,
/// used when building the desired Vertex custom resource.
#[must_use]
pub fn vertex_to_crd_fields(vertex: &DomainVertex) -> (VertexLimitsCrd, VertexKindCrd) {
    (vertex_limits_to_crd(&vertex.limits), kind_to_crd(&vertex.kind))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::crd::PipelineSpec as PipelineSpecCrd;
    use kube::core::ObjectMeta;

    #[test]
    fn converts_minimal_pipeline_round_trip() {
        let cr = PipelineCrd {
            metadata: ObjectMeta { name: Some("p".to_string()), ..Default::default() },
            spec: PipelineSpecCrd {
                vertices: vec![VertexSpecCrd {
                    name: "in".to_string(),
                    kind: VertexKindCrd::Source(json!({})),
                    replicas: None,
                    limits: None,
                }],
                edges: vec![],
                limits: None,
                isb_svc_name: None,
            },
            status: None,
        };

        let domain = pipeline_to_domain("p", "default", &cr);
        assert_eq!(domain.name, "p");
        assert_eq!(domain.vertices.len(), 1);
        assert_eq!(domain.vertices[0].name, "in");
    }

    #[test]
    fn phase_round_trips_through_its_debug_string() {
        for phase in [
            PipelinePhase::Pending,
            PipelinePhase::Waiting,
            PipelinePhase::Deploying,
            PipelinePhase::Running,
            PipelinePhase::Deleting,
            PipelinePhase::Gone,
        ] {
            let rendered = format!("{phase:?}");
            assert_eq!(phase_from_crd(&rendered), Some(phase));
        }
    }
}
