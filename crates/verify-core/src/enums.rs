//! Closed enums shared by every crate in the workspace.

use serde::{Deserialize, Serialize};

/// Hierarchical verification levels for scientific claims.
///
/// Each level subsumes all guarantees of the levels below it. Variant order
/// is the level order: `VerificationLevel::L2... < VerificationLevel::L3...`
/// holds via the derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationLevel {
    /// No verification has been performed.
    L0Unverified,
    /// Code parses without syntax errors.
    L1SyntaxVerified,
    /// Code executes to completion without runtime errors.
    L2ExecutionVerified,
    /// Outputs match expected values via deterministic comparison.
    L3OutputVerifiedDeterministic,
    /// Outputs match expected distributions via statistical tests.
    L4OutputVerifiedStatistical,
    /// Results independently replicated by a separate runner/environment.
    L5IndependentlyReplicated,
    /// Correctness established through formal proof (e.g. Lean 4).
    L6FormallyProven,
}

/// Supported execution environments for verification jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunnerKind {
    PythonScript,
    PythonNotebook,
    RScript,
    RMarkdown,
    Julia,
    Lean4,
    Sympy,
    Sage,
}

/// Lifecycle states for a verification job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Pending,
    Queued,
    Running,
    Completed,
    Failed,
    TimedOut,
    Cancelled,
}

impl JobStatus {
    /// Whether this status is a terminal state; no further transitions occur.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::TimedOut | JobStatus::Cancelled
        )
    }

    /// Whether `self -> next` is a legal transition in the job state machine:
    /// `PENDING -> QUEUED -> RUNNING -> {COMPLETED|FAILED|TIMED_OUT|CANCELLED}`.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Queued)
                | (Queued, Running)
                | (Queued, Cancelled)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, TimedOut)
                | (Running, Cancelled)
        )
    }
}

/// Methods for comparing actual outputs against expected outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComparisonMethod {
    Exact,
    NumericalTolerance,
    Statistical,
    PerceptualHash,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_level_is_totally_ordered() {
        assert!(VerificationLevel::L0Unverified < VerificationLevel::L1SyntaxVerified);
        assert!(VerificationLevel::L2ExecutionVerified < VerificationLevel::L6FormallyProven);
        assert!(VerificationLevel::L6FormallyProven > VerificationLevel::L5IndependentlyReplicated);
    }

    #[test]
    fn terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::TimedOut.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
    }

    #[test]
    fn legal_transitions() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Queued));
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Running));
        assert!(JobStatus::Running.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Running));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Queued));
    }

    #[test]
    fn enum_serialization_matches_wire_format() {
        let json = serde_json::to_string(&JobStatus::TimedOut).unwrap();
        assert_eq!(json, "\"TIMED_OUT\"");
        let json = serde_json::to_string(&ComparisonMethod::NumericalTolerance).unwrap();
        assert_eq!(json, "\"NUMERICAL_TOLERANCE\"");
        let json = serde_json::to_string(&RunnerKind::RMarkdown).unwrap();
        assert_eq!(json, "\"R_MARKDOWN\"");
    }
}
