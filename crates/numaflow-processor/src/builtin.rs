//! Built-in UDF registry: UDFs that ship with Numaflow and run in-process
//! rather than as a user container. Running arbitrary user UDF containers is
//! out of scope for this processor binary.

use numaflow_core::message::Message;

use crate::errors::ProcessorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinUdf {
    /// Pass every message through unchanged.
    Cat,
}

impl BuiltinUdf {
    pub fn from_spec(spec: &serde_json::Value) -> Result<Self, ProcessorError> {
        let name = spec
            .get("builtin")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("cat");
        match name {
            "cat" => Ok(Self::Cat),
            other => Err(ProcessorError::UnrecognizedProcessorType { kind: other.to_string() }),
        }
    }

    /// Apply the UDF to one batch, producing the messages to forward
    /// downstream. `cat` is the identity transform.
    #[must_use]
    pub fn apply(self, batch: Vec<Message>) -> Vec<Message> {
        match self {
            Self::Cat => batch,
        }
    }
}
