//! End-to-end environment scenarios, exercised against the library entry
//! points directly rather than as a subprocess. Each test corresponds to one
//! of the seeded scenarios: a missing precondition env var, an unsupported
//! backend name, and an unparsable replica index.

use numaflow_cli::commands::{isbsvc_buffer_command, BufferOp};

// Serialized: these tests mutate process-wide environment variables.
static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

// S1 — buffer-create without pipeline env.
#[tokio::test]
async fn buffer_create_without_pipeline_name_fails_with_pipeline_name_in_the_message() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::remove_var("PIPELINE_NAME");

    let err = isbsvc_buffer_command("jetstream", "b1", BufferOp::Create).await.unwrap_err();
    assert!(err.to_string().contains("PipelineName"), "got: {err}");
}

// S2 — buffer-create unsupported type.
#[tokio::test]
async fn buffer_create_with_unsupported_isbsvc_type_fails_before_touching_the_broker() {
    let _guard = ENV_LOCK.lock().unwrap();
    std::env::set_var("PIPELINE_NAME", "test-pl");

    let err = isbsvc_buffer_command("nonono", "b1", BufferOp::Create).await.unwrap_err();
    assert!(err.to_string().contains("unsupported isb service type"), "got: {err}");

    std::env::remove_var("PIPELINE_NAME");
}

// S3 — processor replica invalid.
#[test]
fn processor_bootstrap_rejects_a_non_numeric_replica() {
    let _guard = ENV_LOCK.lock().unwrap();

    let vertex = numaflow_core::spec::Vertex {
        name: "p-cat".to_string(),
        pipeline_name: "p".to_string(),
        from_vertices: vec!["in".to_string()],
        to_vertices: vec!["out".to_string()],
        replicas: 1,
        limits: numaflow_core::spec::VertexLimits::default(),
        kind: numaflow_core::spec::VertexKind::Udf(serde_json::json!({"builtin": "cat"})),
    };
    let encoded = {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.encode(serde_json::to_vec(&vertex).unwrap())
    };

    std::env::set_var("VERTEX_OBJECT", &encoded);
    std::env::set_var("POD_NAME", "p");
    std::env::set_var("VERTEX_REPLICA", "$$$");

    let err = numaflow_processor::ProcessorEnv::from_env().unwrap_err();
    assert!(err.to_string().contains("invalid replica"), "got: {err}");

    std::env::remove_var("VERTEX_OBJECT");
    std::env::remove_var("POD_NAME");
    std::env::remove_var("VERTEX_REPLICA");
}
