//! Simulated solver for development and tests.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::mpsc;

use crate::{Solver, SolverError, SolverOutcome};

/// Fabricates pairing-pass output without doing any real work.
///
/// Used when no external solver command is configured, and by the API
/// integration tests (with near-zero delays) to exercise the full job
/// lifecycle.
#[derive(Debug, Clone)]
pub struct SimulatedSolver {
    /// Number of improvement passes to report.
    pub passes: u32,
    /// Base delay between passes. Actual delay adds a small random jitter.
    pub step_delay: Duration,
}

impl Default for SimulatedSolver {
    fn default() -> Self {
        Self {
            passes: 6,
            step_delay: Duration::from_millis(400),
        }
    }
}

impl SimulatedSolver {
    pub fn new(passes: u32, step_delay: Duration) -> Self {
        Self { passes, step_delay }
    }
}

#[async_trait]
impl Solver for SimulatedSolver {
    async fn run(
        &self,
        base: &str,
        seat: &str,
        log: mpsc::Sender<String>,
    ) -> Result<SolverOutcome, SolverError> {
        let _ = log
            .send(format!("loading pairing data for base={base} seat={seat}"))
            .await;

        let mut cost = 100_000i64;
        for pass in 1..=self.passes {
            let (jitter_ms, improvement) = {
                let mut rng = rand::rng();
                (
                    rng.random_range(0..=self.step_delay.as_millis().max(1) as u64 / 2),
                    rng.random_range(500..5_000),
                )
            };
            tokio::time::sleep(self.step_delay + Duration::from_millis(jitter_ms)).await;

            cost -= improvement;
            let _ = log
                .send(format!(
                    "pairing pass {pass}/{}: objective cost {cost}",
                    self.passes
                ))
                .await;
        }

        Ok(SolverOutcome {
            summary: format!(
                "optimization complete after {} passes, final cost {cost}",
                self.passes
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reports_one_line_per_pass_plus_preamble() {
        let solver = SimulatedSolver::new(3, Duration::from_millis(1));
        let (tx, mut rx) = mpsc::channel(64);

        let outcome = solver.run("BUR", "FA", tx).await.unwrap();

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("base=BUR seat=FA"));
        assert!(lines[3].starts_with("pairing pass 3/3"));
        assert!(outcome.summary.contains("3 passes"));
    }

    #[tokio::test]
    async fn closed_receiver_does_not_fail_the_run() {
        let solver = SimulatedSolver::new(2, Duration::from_millis(1));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        assert!(solver.run("OAK", "CA", tx).await.is_ok());
    }
}
