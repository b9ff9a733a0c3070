//! Vertex processor entry point: the setup performed by every vertex pod
//! before it starts reading its incoming buffer(s) and writing its outgoing
//! buffer(s). The read → process → write → ack loop body itself is a
//! documented extension point (see [`BuiltinUdf::apply`]) and is not driven
//! here; this crate's job ends at "wiring is live, ready to loop."

pub mod builtin;
pub mod env;
pub mod errors;

use numaflow_adapters::jetstream::{JetStreamBufferReader, JetStreamBufferWriter, JetStreamIsb};
use numaflow_core::spec::VertexKind;
use tracing::info;

pub use builtin::BuiltinUdf;
pub use env::ProcessorEnv;
pub use errors::ProcessorError;

/// Readers and writers wired up for one vertex pod, plus the built-in UDF to
/// apply (if this vertex is a `udf` vertex running a built-in rather than a
/// user container).
pub struct ProcessorWiring {
    pub readers: Vec<JetStreamBufferReader>,
    pub writers: Vec<JetStreamBufferWriter>,
    pub udf: Option<BuiltinUdf>,
}

/// Bootstrap a vertex processor from its environment: decode `VertexObject`,
/// validate `Pod`/`Replica`, connect to the ISB, and construct one reader per
/// `from_vertices` entry and one writer per `to_vertices` entry.
pub async fn bootstrap() -> Result<(ProcessorEnv, ProcessorWiring), ProcessorError> {
    let processor_env = ProcessorEnv::from_env()?;
    info!(
        vertex = %processor_env.vertex.name,
        pod = %processor_env.pod_name,
        replica = processor_env.replica,
        kind = processor_env.vertex.kind.label(),
        "starting vertex processor"
    );

    let isb = JetStreamIsb::connect(numaflow_adapters::jetstream::JetStreamConfig::from_env())
        .await
        .map_err(ProcessorError::from)?;

    let wiring = wire(&processor_env, &isb).await?;
    Ok((processor_env, wiring))
}

async fn wire(processor_env: &ProcessorEnv, isb: &JetStreamIsb) -> Result<ProcessorWiring, ProcessorError> {
    let vertex = &processor_env.vertex;
    let pipeline = &vertex.pipeline_name;
    let bare_self = strip_pipeline_prefix(pipeline, &vertex.name);

    let upstream_buffers: Vec<String> = vertex
        .from_vertices
        .iter()
        .map(|from| format!("{pipeline}.{from}-{bare_self}"))
        .collect();
    let downstream_buffers: Vec<String> = vertex
        .to_vertices
        .iter()
        .map(|to| format!("{pipeline}.{bare_self}-{to}"))
        .collect();

    let mut readers = Vec::with_capacity(upstream_buffers.len());
    for buffer in &upstream_buffers {
        readers.push(isb.buffer_reader(buffer).await?);
    }
    let writers: Vec<_> = downstream_buffers.iter().map(|b| isb.buffer_writer(b)).collect();

    let udf = match &vertex.kind {
        VertexKind::Udf(spec) => Some(BuiltinUdf::from_spec(spec)?),
        VertexKind::Source(_) | VertexKind::Sink(_) => None,
    };

    info!(
        vertex = %vertex.name,
        upstream = ?upstream_buffers,
        downstream = ?downstream_buffers,
        "processor wired"
    );

    Ok(ProcessorWiring { readers, writers, udf })
}

/// `from_vertices`/`to_vertices` on a `Vertex` are bare vertex names, but a
/// buffer name is `<pipeline>.<from>-<to>` where `from`/`to` are the bare
/// names on both sides (per `numaflow_core::spec::Pipeline::buffer_name`);
/// this undoes the `<pipeline>-` prefix `build_vertices` applies to the
/// vertex's own name so it matches the bare form on the buffer's other side.
fn strip_pipeline_prefix(pipeline: &str, vertex_name: &str) -> String {
    vertex_name
        .strip_prefix(&format!("{pipeline}-"))
        .unwrap_or(vertex_name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_the_pipeline_prefix_from_a_derived_vertex_name() {
        assert_eq!(strip_pipeline_prefix("p", "p-cat"), "cat");
    }

    #[test]
    fn leaves_bare_names_unchanged() {
        assert_eq!(strip_pipeline_prefix("p", "cat"), "cat");
    }
}
