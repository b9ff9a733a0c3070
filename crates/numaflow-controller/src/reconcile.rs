//! Pipeline reconcile loop.
//!
//! One pass does, in order: (1) resolve the object and its finalizer state,
//! short-circuiting into [`cleanup`] during deletion; (2) resolve the
//! referenced ISBSvc, parking in `Waiting` if it is missing or not both
//! `Configured` and `Deployed`; (3) derive the desired Vertex set; (4) derive
//! the desired edge buffers with merged limits; (5) reconcile each Vertex
//! object by spec-hash diff, deleting any no longer desired; (6) reconcile
//! the daemon Deployment and Service; (7) dispatch a buffer-create Job for
//! the pipeline's buffers, skipped if one already exists for the current
//! buffer spec; (8) compute and write the observed status.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, PodSpec, PodTemplateSpec, Service, ServicePort, ServiceSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, OwnerReference};
use kube::api::{Api, ListParams, Patch, PatchParams};
use kube::core::ObjectMeta;
use kube::runtime::controller::Action;
use kube::runtime::finalizer::{finalizer, Event as FinalizerEvent};
use kube::{Client, Resource, ResourceExt};
use tracing::{info, warn};

use numaflow_core::builder::build_vertices;
use numaflow_core::limits::copy_edge_limits;
use numaflow_core::phase::{spec_hash, Condition, PipelinePhase, PipelineStatus};
use numaflow_core::spec::{BufferSpec, IsbSvcType};

use crate::convert::{pipeline_to_domain, status_to_crd, vertex_to_crd_fields};
use crate::crd::{InterStepBufferService, Pipeline, VertexSpecFull};
use crate::errors::ControllerError;

pub const FINALIZER: &str = "numaflow.numaproj.io/pipeline-controller";
const MANAGER: &str = "numaflow-controller";
const PIPELINE_LABEL: &str = "numaflow.numaproj.io/pipeline-name";

pub struct Context {
    pub client: Client,
    pub config: crate::config::ControllerConfig,
}

pub async fn reconcile(pipeline: Arc<Pipeline>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let ns = pipeline.namespace().ok_or(ControllerError::MissingNamespace)?;
    let api: Api<Pipeline> = Api::namespaced(ctx.client.clone(), &ns);

    finalizer(&api, FINALIZER, pipeline, |event| async {
        match event {
            FinalizerEvent::Apply(pipeline) => apply(pipeline, ctx.clone()).await,
            FinalizerEvent::Cleanup(pipeline) => cleanup(pipeline, ctx.clone()).await,
        }
    })
    .await
    .map_err(|e| ControllerError::Finalizer(Box::new(e)))
}

/// Fetch the named ISBSvc in `namespace`, if it exists.
async fn resolve_isb_svc(
    ctx: &Context,
    namespace: &str,
    name: &str,
) -> Result<Option<InterStepBufferService>, ControllerError> {
    let api: Api<InterStepBufferService> = Api::namespaced(ctx.client.clone(), namespace);
    Ok(api.get_opt(name).await?)
}

/// Derive the `IsbSvcType` an ISBSvc resource is configured for from
/// whichever of its `jetstream`/`redis` spec fields is set, defaulting to
/// JetStream when both are absent (mirrors a resource with an empty spec
/// provisioning the most common backend).
fn isb_svc_type(isb_svc: &InterStepBufferService) -> IsbSvcType {
    if isb_svc.spec.redis.is_some() && isb_svc.spec.jetstream.is_none() {
        IsbSvcType::Redis
    } else {
        IsbSvcType::JetStream
    }
}

async fn apply(pipeline: Arc<Pipeline>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let name = pipeline.name_any();
    let namespace = pipeline.namespace().ok_or(ControllerError::MissingNamespace)?;
    let domain = pipeline_to_domain(&name, &namespace, &pipeline);
    domain.validate()?;

    let isb_svc_name = domain.isb_svc_name().to_string();
    let isb_svc = resolve_isb_svc(&ctx, &namespace, &isb_svc_name).await?;
    let ready = isb_svc.as_ref().and_then(|svc| svc.status.as_ref()).is_some_and(|s| s.is_ready());

    if !ready {
        let reason = if isb_svc.is_none() {
            format!("isbsvc {isb_svc_name} not found")
        } else {
            format!("isbsvc {isb_svc_name} not yet configured and deployed")
        };
        warn!(pipeline = %name, %reason, "waiting on isbsvc");
        write_status(&pipeline, &ctx, PipelinePhase::Waiting, reason).await?;
        return Ok(Action::requeue(Duration::from_secs(10)));
    }
    let isb_svc = isb_svc.expect("ready implies present");

    let vertices = build_vertices(&domain);
    reconcile_vertices(&pipeline, &ctx, &vertices).await?;
    reconcile_daemon(&pipeline, &ctx).await?;

    let buffers: Vec<BufferSpec> = domain
        .edges
        .iter()
        .map(|edge| {
            let limits = copy_edge_limits(domain.limits.as_ref(), edge.limits.as_ref()).or_defaults();
            BufferSpec { name: domain.buffer_name(edge), max_length: limits.buffer_max_length }
        })
        .collect();

    if !buffers.is_empty() {
        dispatch_buffer_create_job(&pipeline, &ctx, &buffers, isb_svc_type(&isb_svc)).await?;
    }

    write_status(&pipeline, &ctx, PipelinePhase::Running, format!("isbsvc {isb_svc_name} ready")).await?;

    Ok(Action::requeue(ctx.config.requeue_after()))
}

async fn cleanup(pipeline: Arc<Pipeline>, ctx: Arc<Context>) -> Result<Action, ControllerError> {
    let name = pipeline.name_any();
    let namespace = pipeline.namespace().ok_or(ControllerError::MissingNamespace)?;
    let domain = pipeline_to_domain(&name, &namespace, &pipeline);
    let buffer_names: Vec<String> = domain.edges.iter().map(|e| domain.buffer_name(e)).collect();

    let isb_svc = resolve_isb_svc(&ctx, &namespace, domain.isb_svc_name()).await?;
    let ready = isb_svc.as_ref().and_then(|svc| svc.status.as_ref()).is_some_and(|s| s.is_ready());

    if ready && !buffer_names.is_empty() {
        let kind = isb_svc_type(&isb_svc.expect("ready implies present"));
        dispatch_buffer_cleanup_job(&pipeline, &ctx, &buffer_names, kind).await?;
    } else {
        info!(pipeline = %name, "isbsvc absent or not ready, skipping cleanup job");
    }

    info!(pipeline = %name, "pipeline cleanup complete");
    Ok(Action::await_change())
}

async fn reconcile_vertices(
    pipeline: &Pipeline,
    ctx: &Context,
    vertices: &BTreeMap<String, numaflow_core::spec::Vertex>,
) -> Result<(), ControllerError> {
    let namespace = pipeline.namespace().ok_or(ControllerError::MissingNamespace)?;
    let api: Api<crate::crd::Vertex> = Api::namespaced(ctx.client.clone(), &namespace);
    let owner = owner_reference(pipeline)?;
    let pipeline_name = pipeline.name_any();

    for vertex in vertices.values() {
        let (limits, kind) = vertex_to_crd_fields(vertex);
        let desired = VertexSpecFull {
            pipeline_name: vertex.pipeline_name.clone(),
            from_vertices: vertex.from_vertices.clone(),
            to_vertices: vertex.to_vertices.clone(),
            replicas: vertex.replicas,
            limits,
            kind,
        };
        let desired_hash = spec_hash(&desired);

        let existing = api.get_opt(&vertex.name).await?;
        let needs_write = match &existing {
            None => true,
            Some(current) => spec_hash(&current.spec) != desired_hash,
        };

        if !needs_write {
            continue;
        }

        let object = crate::crd::Vertex {
            metadata: ObjectMeta {
                name: Some(vertex.name.clone()),
                namespace: Some(namespace.clone()),
                owner_references: Some(vec![owner.clone()]),
                labels: Some(BTreeMap::from([(PIPELINE_LABEL.to_string(), pipeline_name.clone())])),
                ..Default::default()
            },
            spec: desired,
            status: None,
        };

        api.patch(
            &vertex.name,
            &PatchParams::apply(MANAGER),
            &Patch::Apply(&object),
        )
        .await?;
        info!(vertex = %vertex.name, "reconciled vertex object");
    }

    let list_params = ListParams::default().labels(&format!("{PIPELINE_LABEL}={pipeline_name}"));
    let existing_names: Vec<String> =
        api.list(&list_params).await?.into_iter().map(|v| v.name_any()).collect();

    for existing_name in existing_names {
        if !vertices.contains_key(&existing_name) {
            api.delete(&existing_name, &Default::default()).await?;
            info!(vertex = %existing_name, "deleted orphaned vertex object");
        }
    }

    Ok(())
}

async fn reconcile_daemon(pipeline: &Pipeline, ctx: &Context) -> Result<(), ControllerError> {
    let name = pipeline.name_any();
    let namespace = pipeline.namespace().ok_or(ControllerError::MissingNamespace)?;
    let domain = pipeline_to_domain(&name, &namespace, pipeline);
    let owner = owner_reference(pipeline)?;

    let labels: BTreeMap<String, String> =
        BTreeMap::from([(PIPELINE_LABEL.to_string(), name.clone())]);

    let deployment_api: Api<Deployment> = Api::namespaced(ctx.client.clone(), &namespace);
    let deployment = Deployment {
        metadata: ObjectMeta {
            name: Some(domain.daemon_deployment_name()),
            namespace: Some(namespace.clone()),
            owner_references: Some(vec![owner.clone()]),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(1),
            selector: LabelSelector { match_labels: Some(labels.clone()), ..Default::default() },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta { labels: Some(labels.clone()), ..Default::default() }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "daemon".to_string(),
                        image: Some(ctx.config.numaflow_image.clone()),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    };

    deployment_api
        .patch(
            &domain.daemon_deployment_name(),
            &PatchParams::apply(MANAGER),
            &Patch::Apply(&deployment),
        )
        .await?;

    let service_api: Api<Service> = Api::namespaced(ctx.client.clone(), &namespace);
    let service = Service {
        metadata: ObjectMeta {
            name: Some(domain.daemon_service_name()),
            namespace: Some(namespace.clone()),
            owner_references: Some(vec![owner]),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            selector: Some(labels),
            ports: Some(vec![ServicePort {
                name: Some("grpc".to_string()),
                port: 4327,
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    };

    service_api
        .patch(
            &domain.daemon_service_name(),
            &PatchParams::apply(MANAGER),
            &Patch::Apply(&service),
        )
        .await?;

    Ok(())
}

/// Base64-encode a `{buffer_name: max_length}` map for the `BUFFER_LIMITS`
/// env var, carrying each buffer's merged limit into the Job's CLI process
/// without changing the documented `--buffers=<a,b,...>` argument shape.
fn encode_buffer_limits(buffers: &[BufferSpec]) -> String {
    let map: BTreeMap<&str, u64> = buffers
        .iter()
        .filter_map(|b| b.max_length.map(|max_length| (b.name.as_str(), max_length)))
        .collect();
    let json = serde_json::to_vec(&map).unwrap_or_default();
    base64::engine::general_purpose::STANDARD.encode(json)
}

/// Dispatch a one-shot Job running `isbsvc-buffer-create` for the pipeline's
/// buffers, named `<pipeline>-buffer-create-<hash>` where `<hash>` is a
/// prefix of the buffer spec's content hash, so a Job is only ever created
/// once per distinct set of buffers/limits.
async fn dispatch_buffer_create_job(
    pipeline: &Pipeline,
    ctx: &Context,
    buffers: &[BufferSpec],
    isbsvc_type: IsbSvcType,
) -> Result<(), ControllerError> {
    let name = pipeline.name_any();
    let namespace = pipeline.namespace().ok_or(ControllerError::MissingNamespace)?;
    let owner = owner_reference(pipeline)?;
    let job_api: Api<Job> = Api::namespaced(ctx.client.clone(), &namespace);

    let hash = &spec_hash(buffers)[..10];
    let job_name = format!("{name}-buffer-create-{hash}");

    if job_api.get_opt(&job_name).await?.is_some() {
        return Ok(());
    }

    let buffer_names = buffers.iter().map(|b| b.name.clone()).collect::<Vec<_>>().join(",");

    let job = Job {
        metadata: ObjectMeta {
            name: Some(job_name.clone()),
            namespace: Some(namespace.clone()),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(JobSpec {
            template: PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    restart_policy: Some("OnFailure".to_string()),
                    containers: vec![Container {
                        name: "buffer-create".to_string(),
                        image: Some(ctx.config.numaflow_image.clone()),
                        args: Some(vec![
                            "isbsvc-buffer-create".to_string(),
                            format!("--isbsvc-type={isbsvc_type}"),
                            format!("--buffers={buffer_names}"),
                        ]),
                        env: Some(vec![
                            EnvVar { name: "PipelineName".to_string(), value: Some(name.clone()), ..Default::default() },
                            EnvVar {
                                name: "BUFFER_LIMITS".to_string(),
                                value: Some(encode_buffer_limits(buffers)),
                                ..Default::default()
                            },
                        ]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            backoff_limit: Some(3),
            ..Default::default()
        }),
        ..Default::default()
    };

    job_api.patch(&job_name, &PatchParams::apply(MANAGER), &Patch::Apply(&job)).await?;
    info!(job = %job_name, "dispatched buffer-create job");
    Ok(())
}

/// Dispatch a one-shot Job running `isbsvc-buffer-delete` for the pipeline's
/// buffers. Carries no ownerReference, by design (§4.4.4): garbage
/// collection must not be able to remove this Job as a side effect of the
/// Pipeline itself being deleted.
async fn dispatch_buffer_cleanup_job(
    pipeline: &Pipeline,
    ctx: &Context,
    buffer_names: &[String],
    isbsvc_type: IsbSvcType,
) -> Result<(), ControllerError> {
    let name = pipeline.name_any();
    let namespace = pipeline.namespace().ok_or(ControllerError::MissingNamespace)?;
    let job_api: Api<Job> = Api::namespaced(ctx.client.clone(), &namespace);

    let job_name = format!("{name}-buffer-cleanup");
    let buffers = buffer_names.join(",");

    let job = Job {
        metadata: ObjectMeta { name: Some(job_name.clone()), namespace: Some(namespace.clone()), ..Default::default() },
        spec: Some(JobSpec {
            template: PodTemplateSpec {
                metadata: None,
                spec: Some(PodSpec {
                    restart_policy: Some("OnFailure".to_string()),
                    containers: vec![Container {
                        name: "buffer-cleanup".to_string(),
                        image: Some(ctx.config.numaflow_image.clone()),
                        args: Some(vec![
                            "isbsvc-buffer-delete".to_string(),
                            format!("--isbsvc-type={isbsvc_type}"),
                            format!("--buffers={buffers}"),
                        ]),
                        env: Some(vec![EnvVar {
                            name: "PipelineName".to_string(),
                            value: Some(name.clone()),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            backoff_limit: Some(3),
            ..Default::default()
        }),
        ..Default::default()
    };

    job_api.patch(&job_name, &PatchParams::apply(MANAGER), &Patch::Apply(&job)).await?;
    info!(job = %job_name, "dispatched buffer-cleanup job");
    Ok(())
}

async fn write_status(
    pipeline: &Pipeline,
    ctx: &Context,
    phase: PipelinePhase,
    message: String,
) -> Result<(), ControllerError> {
    let namespace = pipeline.namespace().ok_or(ControllerError::MissingNamespace)?;
    let api: Api<Pipeline> = Api::namespaced(ctx.client.clone(), &namespace);

    let status = PipelineStatus {
        phase: Some(phase),
        conditions: vec![Condition {
            kind: "Ready".to_string(),
            status: matches!(phase, PipelinePhase::Running),
            reason: format!("{phase:?}"),
            message: message.clone(),
        }],
        observed_generation: pipeline.meta().generation,
        message: Some(message),
    };

    let patch = serde_json::json!({ "status": status_to_crd(&status) });
    api.patch_status(&pipeline.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

fn owner_reference(pipeline: &Pipeline) -> Result<OwnerReference, ControllerError> {
    Ok(OwnerReference {
        api_version: Pipeline::api_version(&()).to_string(),
        kind: Pipeline::kind(&()).to_string(),
        name: pipeline.name_any(),
        uid: pipeline.uid().ok_or(ControllerError::MissingName)?,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

pub fn error_policy(_pipeline: Arc<Pipeline>, error: &ControllerError, _ctx: Arc<Context>) -> Action {
    warn!(error = %error, "reconcile error");
    Action::requeue(Duration::from_secs(5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{IsbServiceStatusCrd, PipelineSpec, PipelineStatusCrd};

    fn sample_pipeline(uid: Option<String>) -> Pipeline {
        Pipeline {
            metadata: ObjectMeta {
                name: Some("p".to_string()),
                namespace: Some("default".to_string()),
                uid,
                ..Default::default()
            },
            spec: PipelineSpec { vertices: vec![], edges: vec![], limits: None, isb_svc_name: None },
            status: Some(PipelineStatusCrd::default()),
        }
    }

    #[test]
    fn owner_reference_requires_a_uid() {
        let pipeline = sample_pipeline(None);
        assert!(owner_reference(&pipeline).is_err());
    }

    #[test]
    fn owner_reference_carries_the_pipeline_identity() {
        let pipeline = sample_pipeline(Some("abc-123".to_string()));
        let owner = owner_reference(&pipeline).unwrap();
        assert_eq!(owner.name, "p");
        assert_eq!(owner.uid, "abc-123");
        assert_eq!(owner.controller, Some(true));
    }

    #[test]
    fn isb_svc_not_ready_without_both_conditions() {
        let status = IsbServiceStatusCrd {
            conditions: vec![crate::crd::ConditionCrd {
                kind: "Configured".to_string(),
                status: true,
                reason: "ok".to_string(),
                message: String::new(),
            }],
        };
        assert!(!status.is_ready());
    }

    #[test]
    fn isb_svc_ready_with_both_conditions_true() {
        let status = IsbServiceStatusCrd {
            conditions: vec![
                crate::crd::ConditionCrd {
                    kind: "Configured".to_string(),
                    status: true,
                    reason: "ok".to_string(),
                    message: String::new(),
                },
                crate::crd::ConditionCrd {
                    kind: "Deployed".to_string(),
                    status: true,
                    reason: "ok".to_string(),
                    message: String::new(),
                },
            ],
        };
        assert!(status.is_ready());
    }

    #[test]
    fn encode_buffer_limits_round_trips_through_base64_json() {
        let buffers = vec![
            BufferSpec { name: "p.in-cat".to_string(), max_length: Some(10_000) },
            BufferSpec { name: "p.cat-out".to_string(), max_length: None },
        ];
        let encoded = encode_buffer_limits(&buffers);
        let decoded = base64::engine::general_purpose::STANDARD.decode(encoded).unwrap();
        let map: BTreeMap<String, u64> = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(map.get("p.in-cat"), Some(&10_000));
        assert_eq!(map.get("p.cat-out"), None);
    }
}
