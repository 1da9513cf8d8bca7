use crate::job::JobPhase;

/// Domain-level error taxonomy.
///
/// `Parse`, `Validation`, `AlreadyRunning`, and `NotFound` are recoverable
/// and end up as structured reply fields. `InvalidTransition` and
/// `Internal` are programming-error classes: they are logged and, should
/// they ever reach a handler, surface as a generic failure.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The command was recognized but an argument is malformed or missing.
    #[error("{0}")]
    Parse(String),

    /// A base or seat token violates the token shape rules.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A run was requested for a key whose current job is still active.
    #[error("Optimization already running for base={base}, seat={seat}")]
    AlreadyRunning {
        base: String,
        seat: String,
        /// Phase of the job that holds the exclusivity (Queued or Running).
        phase: JobPhase,
    },

    /// A status or logs query referenced a key with no recorded job.
    #[error("No optimization found for base={base}, seat={seat}")]
    NotFound { base: String, seat: String },

    /// A phase transition that violates the job lifecycle order, or one
    /// issued against a superseded attempt.
    #[error("Invalid job phase transition: {from} -> {to}")]
    InvalidTransition { from: JobPhase, to: JobPhase },

    #[error("Internal error: {0}")]
    Internal(String),
}
