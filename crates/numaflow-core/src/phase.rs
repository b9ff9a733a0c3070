//! Pipeline lifecycle phase state machine and finalizer/spec-hash diffing.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The lifecycle phase reported on a Pipeline's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PipelinePhase {
    /// Freshly created, no reconcile pass has completed yet.
    Pending,
    /// Reconciling but blocked on the referenced ISBSvc becoming ready.
    Waiting,
    /// ISBSvc is ready; vertices, daemon, and buffers are being reconciled.
    Deploying,
    /// Steady state: desired objects match observed objects.
    Running,
    /// Deletion requested; finalizer cleanup is in progress.
    Deleting,
    /// Cleanup finished; the object is eligible for finalizer removal.
    Gone,
}

impl PipelinePhase {
    /// Valid forward transitions per the lifecycle state machine. Any
    /// transition not in this table (other than a repeat of the same phase)
    /// is a logic error in the caller.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use PipelinePhase::{Deleting, Deploying, Gone, Pending, Running, Waiting};

        if self == next {
            return true;
        }
        matches!(
            (self, next),
            (Pending, Waiting)
                | (Pending, Deploying)
                | (Pending, Deleting)
                | (Waiting, Deploying)
                | (Waiting, Deleting)
                | (Deploying, Running)
                | (Deploying, Waiting)
                | (Deploying, Deleting)
                | (Running, Waiting)
                | (Running, Deploying)
                | (Running, Deleting)
                | (Deleting, Gone)
        )
    }
}

/// A single status condition, mirroring the `metav1.Condition` shape used
/// throughout the object's status subresource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: bool,
    pub reason: String,
    pub message: String,
}

/// The status subresource carried by a Pipeline object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub phase: Option<PipelinePhase>,
    pub conditions: Vec<Condition>,
    pub observed_generation: Option<i64>,
    pub message: Option<String>,
}

/// Stable content hash of any serializable spec, used to detect whether a
/// desired object actually differs from what is currently observed.
pub fn spec_hash<T: Serialize>(value: &T) -> String {
    let bytes = serde_json::to_vec(value).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}

/// Whether a desired object needs to be created or updated: true when there
/// is no prior observed hash, the finalizer set differs, or the spec content
/// differs.
#[must_use]
pub fn needs_update(
    prior_spec_hash: Option<&str>,
    desired_spec_hash: &str,
    prior_finalizers: &[String],
    desired_finalizers: &[String],
) -> bool {
    match prior_spec_hash {
        None => true,
        Some(prior) => prior != desired_spec_hash || prior_finalizers != desired_finalizers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_to_waiting_is_valid() {
        assert!(PipelinePhase::Pending.can_transition_to(PipelinePhase::Waiting));
    }

    #[test]
    fn running_to_pending_is_invalid() {
        assert!(!PipelinePhase::Running.can_transition_to(PipelinePhase::Pending));
    }

    #[test]
    fn deleting_to_gone_is_valid_but_not_reverse() {
        assert!(PipelinePhase::Deleting.can_transition_to(PipelinePhase::Gone));
        assert!(!PipelinePhase::Gone.can_transition_to(PipelinePhase::Deleting));
    }

    #[test]
    fn same_phase_is_always_a_valid_transition() {
        assert!(PipelinePhase::Running.can_transition_to(PipelinePhase::Running));
    }

    #[test]
    fn needs_update_true_when_no_prior_hash() {
        assert!(needs_update(None, "abc", &[], &[]));
    }

    #[test]
    fn needs_update_false_when_hash_and_finalizers_match() {
        let finalizers = vec!["numaflow.numaproj.io/pipeline-controller".to_string()];
        assert!(!needs_update(
            Some("abc"),
            "abc",
            &finalizers,
            &finalizers
        ));
    }

    #[test]
    fn needs_update_true_when_finalizers_differ() {
        let prior = vec![];
        let desired = vec!["numaflow.numaproj.io/pipeline-controller".to_string()];
        assert!(needs_update(Some("abc"), "abc", &prior, &desired));
    }

    #[test]
    fn spec_hash_is_stable_for_equal_values() {
        let a = PipelineStatus::default();
        let b = PipelineStatus::default();
        assert_eq!(spec_hash(&a), spec_hash(&b));
    }
}
