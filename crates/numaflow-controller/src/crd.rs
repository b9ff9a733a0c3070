//! Kubernetes wire types for the Pipeline custom resource.
//!
//! Kept deliberately separate from `numaflow_core`'s pure domain types: this
//! module owns everything that needs a `kube`/`k8s-openapi`/`schemars`
//! dependency, and `convert.rs` bridges the two. The domain crate stays
//! free of any Kubernetes-client dependency.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LimitsCrd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_batch_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_usage_limit_permille: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VertexLimitsCrd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_batch_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EdgeLimitsCrd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer_usage_limit_permille: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum VertexKindCrd {
    Source(serde_json::Value),
    Udf(serde_json::Value),
    Sink(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VertexSpecCrd {
    pub name: String,
    #[serde(flatten)]
    pub kind: VertexKindCrd,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<VertexLimitsCrd>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EdgeSpecCrd {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<EdgeLimitsCrd>,
}

/// The Pipeline custom resource's spec. `kube::CustomResource` generates the
/// top-level `Pipeline` struct (with `metadata`/`spec`/`status`) from this.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "numaflow.numaproj.io",
    version = "v1alpha1",
    kind = "Pipeline",
    namespaced,
    status = "PipelineStatusCrd",
    shortname = "pl"
)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSpec {
    pub vertices: Vec<VertexSpecCrd>,
    pub edges: Vec<EdgeSpecCrd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<LimitsCrd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isb_svc_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionCrd {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: bool,
    pub reason: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStatusCrd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default)]
    pub conditions: Vec<ConditionCrd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The Vertex custom resource's spec: one per derived `numaflow_core::Vertex`.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "numaflow.numaproj.io",
    version = "v1alpha1",
    kind = "Vertex",
    namespaced,
    status = "VertexStatusCrd",
    shortname = "vt"
)]
#[serde(rename_all = "camelCase")]
pub struct VertexSpecFull {
    pub pipeline_name: String,
    pub from_vertices: Vec<String>,
    pub to_vertices: Vec<String>,
    pub replicas: u32,
    pub limits: VertexLimitsCrd,
    #[serde(flatten)]
    pub kind: VertexKindCrd,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VertexStatusCrd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_replicas: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JetStreamIsbConfigCrd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RedisIsbConfigCrd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The InterStepBufferService custom resource's spec: names the broker type
/// backing a pipeline's buffers. Only one of `jetstream`/`redis` is set.
#[derive(CustomResource, Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "numaflow.numaproj.io",
    version = "v1alpha1",
    kind = "InterStepBufferService",
    namespaced,
    status = "IsbServiceStatusCrd",
    shortname = "isbsvc"
)]
#[serde(rename_all = "camelCase")]
pub struct IsbServiceSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jetstream: Option<JetStreamIsbConfigCrd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redis: Option<RedisIsbConfigCrd>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IsbServiceStatusCrd {
    #[serde(default)]
    pub conditions: Vec<ConditionCrd>,
}

impl IsbServiceStatusCrd {
    /// True once both the `Configured` and `Deployed` conditions report
    /// `status: true`. The reconciler reads this and nothing else to decide
    /// whether a pipeline may proceed past the ISBSvc readiness gate.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        let has = |kind: &str| self.conditions.iter().any(|c| c.kind == kind && c.status);
        has("Configured") && has("Deployed")
    }
}
