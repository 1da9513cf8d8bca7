//! Solver boundary for crew-pairing optimization runs.
//!
//! The actual optimization algorithm is opaque to the control plane: it is
//! anything that can produce a stream of log lines and a terminal outcome
//! for a (base, seat) pair. This crate defines that capability as the
//! [`Solver`] trait plus two implementations:
//!
//! - [`CommandSolver`] shells out to a configured external optimizer
//!   command and streams its stdout.
//! - [`SimulatedSolver`] fabricates plausible pairing-pass output, for
//!   development and tests.

mod command;
mod simulated;

pub use command::CommandSolver;
pub use simulated::SimulatedSolver;

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Successful terminal result of one solver run.
///
/// The payload is opaque text as far as the control plane is concerned.
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    /// One-line human-readable result summary.
    pub summary: String,
}

/// Failure of one solver run.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    /// The solver could not be started or its output could not be read.
    #[error("solver I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The solver ran but reported failure.
    #[error("solver exited with status {status}: {detail}")]
    Failed { status: i32, detail: String },
}

/// The optimization work behind the job runner.
///
/// Implementations push progress lines into `log` as they become available
/// (the registry appends them immediately, so status queries observe
/// progress mid-run) and resolve to a terminal outcome. A closed `log`
/// receiver is not an error; implementations simply stop reporting.
#[async_trait]
pub trait Solver: Send + Sync {
    async fn run(
        &self,
        base: &str,
        seat: &str,
        log: mpsc::Sender<String>,
    ) -> Result<SolverOutcome, SolverError>;
}
