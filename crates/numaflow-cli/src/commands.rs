//! Subcommand bodies, kept free of `clap` types so they can be called
//! directly from tests with plain string arguments.

use std::collections::BTreeMap;

use base64::Engine;
use numaflow_adapters::AnyIsbLifecycle;
use numaflow_core::spec::{BufferSpec, IsbSvcType};
use numaflow_ports::errors::LifecycleError;
use numaflow_ports::IsbLifecycle;

/// Env var carrying a base64 JSON `{buffer_name: max_length}` map, set by the
/// reconciler's buffer-create Job so the merged per-edge limit (§4.4.2)
/// reaches the broker-side stream config instead of being dropped. Absent
/// for `isbsvc-buffer-delete`/`isbsvc-buffer-validate`, which don't need it.
const BUFFER_LIMITS_ENV: &str = "BUFFER_LIMITS";

fn buffer_limits_from_env() -> BTreeMap<String, u64> {
    std::env::var(BUFFER_LIMITS_ENV)
        .ok()
        .and_then(|encoded| base64::engine::general_purpose::STANDARD.decode(encoded.trim()).ok())
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

#[derive(Clone, Copy)]
pub enum BufferOp {
    Create,
    Delete,
    Validate,
}

/// Run one of the `isbsvc-buffer-*` subcommands. Fails fast with
/// `MissingEnv("PipelineName")` when the pipeline name is not set in the
/// environment, and with `UnsupportedIsbSvcType` for an unrecognized
/// `--isbsvc-type` value, before ever touching the broker.
pub async fn isbsvc_buffer_command(isbsvc_type: &str, buffers: &str, op: BufferOp) -> Result<(), anyhow::Error> {
    if std::env::var("PIPELINE_NAME").is_err() {
        return Err(LifecycleError::MissingEnv { name: "PipelineName".to_string() }.into());
    }

    let isbsvc_type: IsbSvcType = isbsvc_type
        .parse()
        .map_err(|kind: String| LifecycleError::UnsupportedIsbSvcType { kind })?;

    let buffers: Vec<String> = buffers
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    let isb = AnyIsbLifecycle::connect(isbsvc_type).await?;
    match op {
        BufferOp::Create => {
            let limits = buffer_limits_from_env();
            let specs: Vec<BufferSpec> = buffers
                .into_iter()
                .map(|name| {
                    let max_length = limits.get(&name).copied();
                    BufferSpec { name, max_length }
                })
                .collect();
            isb.create_buffers(&specs).await?;
        }
        BufferOp::Delete => isb.delete_buffers(&buffers).await?,
        BufferOp::Validate => isb.validate_buffers(&buffers).await?,
    }
    Ok(())
}

/// Run the `builtin-udf` subcommand: apply a built-in UDF to a JSON-encoded
/// batch of messages and return the resulting batch, also JSON-encoded.
pub fn builtin_udf_command(name: &str, args: &str) -> Result<String, anyhow::Error> {
    let spec = serde_json::json!({ "builtin": name });
    let udf = numaflow_processor::BuiltinUdf::from_spec(&spec)?;

    let messages: Vec<numaflow_core::message::Message> = serde_json::from_str(args)
        .map_err(|e| anyhow::anyhow!("failed to decode --args as a message batch: {e}"))?;
    let out = udf.apply(messages);
    Ok(serde_json::to_string(&out)?)
}
