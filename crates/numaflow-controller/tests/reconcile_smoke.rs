//! Reconciler smoke test against a real cluster.
//!
//! Requires a reachable cluster via the ambient kubeconfig with the
//! Pipeline/Vertex/InterStepBufferService CRDs installed. Gated behind
//! `#[ignore]` since CI does not run a cluster by default.

use std::sync::Arc;
use std::time::Duration;

use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams};
use kube::core::ObjectMeta;
use kube::{Client, ResourceExt};
use serde_json::json;

use numaflow_controller::crd::{
    ConditionCrd, EdgeSpecCrd, InterStepBufferService, IsbServiceSpec, IsbServiceStatusCrd,
    JetStreamIsbConfigCrd, Pipeline, PipelineSpec, Vertex, VertexKindCrd, VertexSpecCrd,
};
use numaflow_controller::{reconcile, Context, ControllerConfig};

const NAMESPACE: &str = "default";
const MANAGER: &str = "reconcile-smoke-test";

fn three_vertex_spec() -> PipelineSpec {
    PipelineSpec {
        vertices: vec![
            VertexSpecCrd {
                name: "input".to_string(),
                kind: VertexKindCrd::Source(json!({})),
                replicas: None,
                limits: None,
            },
            VertexSpecCrd {
                name: "cat".to_string(),
                kind: VertexKindCrd::Udf(json!({"builtin": "cat"})),
                replicas: None,
                limits: None,
            },
            VertexSpecCrd {
                name: "output".to_string(),
                kind: VertexKindCrd::Sink(json!({})),
                replicas: None,
                limits: None,
            },
        ],
        edges: vec![
            EdgeSpecCrd { from: "input".to_string(), to: "cat".to_string(), limits: None },
            EdgeSpecCrd { from: "cat".to_string(), to: "output".to_string(), limits: None },
        ],
        limits: None,
        isb_svc_name: None,
    }
}

async fn ensure_ready_isb_svc(client: &Client) {
    let api: Api<InterStepBufferService> = Api::namespaced(client.clone(), NAMESPACE);
    let isbsvc = InterStepBufferService {
        metadata: ObjectMeta { name: Some("default".to_string()), ..Default::default() },
        spec: IsbServiceSpec { jetstream: Some(JetStreamIsbConfigCrd { url: None }), redis: None },
        status: Some(IsbServiceStatusCrd {
            conditions: vec![
                ConditionCrd {
                    kind: "Configured".to_string(),
                    status: true,
                    reason: "ok".to_string(),
                    message: String::new(),
                },
                ConditionCrd {
                    kind: "Deployed".to_string(),
                    status: true,
                    reason: "ok".to_string(),
                    message: String::new(),
                },
            ],
        }),
    };
    api.patch("default", &PatchParams::apply(MANAGER), &Patch::Apply(&isbsvc)).await.expect("seed isbsvc");
}

// S4 — reconcile a 3-vertex pipeline against a ready ISBSvc.
#[tokio::test]
#[ignore]
async fn reconciling_a_three_vertex_pipeline_creates_vertices_and_a_buffer_create_job() {
    let client = Client::try_default().await.expect("kube client");
    ensure_ready_isb_svc(&client).await;

    let pipelines: Api<Pipeline> = Api::namespaced(client.clone(), NAMESPACE);
    let pipeline = Pipeline {
        metadata: ObjectMeta { name: Some("smoke-s4".to_string()), ..Default::default() },
        spec: three_vertex_spec(),
        status: None,
    };
    pipelines.patch("smoke-s4", &PatchParams::apply(MANAGER), &Patch::Apply(&pipeline)).await.expect("apply pipeline");
    let pipeline = pipelines.get("smoke-s4").await.expect("fetch created pipeline");

    let ctx = Arc::new(Context { client: client.clone(), config: ControllerConfig::default() });
    reconcile(Arc::new(pipeline), ctx).await.expect("reconcile succeeds");

    let vertices: Api<Vertex> = Api::namespaced(client.clone(), NAMESPACE);
    let list = vertices
        .list(&ListParams::default().labels("numaflow.numaproj.io/pipeline-name=smoke-s4"))
        .await
        .expect("list vertices");
    assert_eq!(list.items.len(), 3);

    let jobs: Api<k8s_openapi::api::batch::v1::Job> = Api::namespaced(client.clone(), NAMESPACE);
    let job_list = jobs.list(&ListParams::default()).await.expect("list jobs");
    let create_jobs: Vec<_> =
        job_list.items.iter().filter(|j| j.name_any().starts_with("smoke-s4-buffer-create-")).collect();
    assert_eq!(create_jobs.len(), 1);

    pipelines.delete("smoke-s4", &DeleteParams::default()).await.ok();
}

// S7 — cleanup with ISBSvc present and healthy produces exactly one Job
// whose name contains `cleanup` and has no ownerReferences.
#[tokio::test]
#[ignore]
async fn deleting_a_pipeline_with_a_healthy_isbsvc_dispatches_one_cleanup_job() {
    let client = Client::try_default().await.expect("kube client");
    ensure_ready_isb_svc(&client).await;

    let pipelines: Api<Pipeline> = Api::namespaced(client.clone(), NAMESPACE);
    let pipeline = Pipeline {
        metadata: ObjectMeta { name: Some("smoke-s7".to_string()), ..Default::default() },
        spec: three_vertex_spec(),
        status: None,
    };
    pipelines.patch("smoke-s7", &PatchParams::apply(MANAGER), &Patch::Apply(&pipeline)).await.expect("apply pipeline");

    let applied = pipelines.get("smoke-s7").await.expect("fetch created pipeline");
    let ctx = Arc::new(Context { client: client.clone(), config: ControllerConfig::default() });
    reconcile(Arc::new(applied), ctx.clone()).await.expect("first reconcile runs apply");

    pipelines.delete("smoke-s7", &DeleteParams::default()).await.expect("request deletion");
    tokio::time::sleep(Duration::from_millis(200)).await;
    let deleting = pipelines.get("smoke-s7").await.expect("fetch pipeline pending deletion");
    reconcile(Arc::new(deleting), ctx).await.expect("second reconcile runs cleanup");

    let jobs: Api<k8s_openapi::api::batch::v1::Job> = Api::namespaced(client.clone(), NAMESPACE);
    let job_list = jobs.list(&ListParams::default()).await.expect("list jobs");
    let cleanup_jobs: Vec<_> = job_list.items.iter().filter(|j| j.name_any().contains("cleanup")).collect();
    assert_eq!(cleanup_jobs.len(), 1);
    assert!(cleanup_jobs[0].metadata.owner_references.as_ref().map_or(true, |refs| refs.is_empty()));
}
