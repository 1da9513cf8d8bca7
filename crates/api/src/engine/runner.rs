//! Job runner: executes one accepted optimization attempt.
//!
//! Fire-and-forget from the dispatcher's point of view. The runner owns
//! the attempt's phase transitions after creation: Queued -> Running on
//! start, then exactly one terminal transition when the solver resolves.
//! Solver failures and panics are caught here and become Failed jobs;
//! they never propagate as unhandled faults.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crewopt_core::job::JobPhase;
use crewopt_core::types::JobKey;
use crewopt_solver::Solver;

use crate::engine::registry::JobRegistry;

/// Capacity of the solver -> registry log channel. The registry appends
/// lines as fast as it can take the write lock, so a small buffer is
/// enough to decouple the two.
const LOG_CHANNEL_CAPACITY: usize = 64;

/// Spawn the runner task for a freshly created attempt.
///
/// The returned handle is not normally awaited; it exists for tests and
/// shutdown diagnostics.
pub fn spawn(
    registry: Arc<JobRegistry>,
    solver: Arc<dyn Solver>,
    key: JobKey,
    job_id: Uuid,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        run_job(registry, solver, key, job_id).await;
    })
}

async fn run_job(registry: Arc<JobRegistry>, solver: Arc<dyn Solver>, key: JobKey, job_id: Uuid) {
    if let Err(e) = registry
        .transition(&key, job_id, JobPhase::Running, None)
        .await
    {
        tracing::error!(%key, error = %e, "Failed to move job to Running");
        return;
    }
    tracing::info!(%key, %job_id, "Optimization started");

    let (tx, mut rx) = mpsc::channel(LOG_CHANNEL_CAPACITY);

    // Run the solver in its own task so a panic inside the optimization
    // work surfaces as a join error instead of killing the runner.
    let solver_task = {
        let solver = Arc::clone(&solver);
        let base = key.base().to_string();
        let seat = key.seat().to_string();
        tokio::spawn(async move { solver.run(&base, &seat, tx).await })
    };

    // Forward log lines as they arrive; a concurrent status query sees
    // progress immediately. The loop ends when the solver drops its
    // sender.
    while let Some(line) = rx.recv().await {
        registry.append_log(&key, job_id, line).await;
    }

    let (next, error) = match solver_task.await {
        Ok(Ok(outcome)) => {
            registry.append_log(&key, job_id, outcome.summary).await;
            (JobPhase::Succeeded, None)
        }
        Ok(Err(e)) => (JobPhase::Failed, Some(e.to_string())),
        Err(join_err) => (
            JobPhase::Failed,
            Some(format!("optimization task aborted: {join_err}")),
        ),
    };

    match registry.transition(&key, job_id, next, error).await {
        Ok(()) => tracing::info!(%key, %job_id, phase = %next, "Optimization finished"),
        // The watchdog may have timed the attempt out while the solver was
        // still resolving; losing that race is not an error.
        Err(e) => tracing::warn!(%key, %job_id, error = %e, "Terminal transition rejected"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use crewopt_solver::{SimulatedSolver, SolverError, SolverOutcome};

    use super::*;

    struct FailingSolver;

    #[async_trait]
    impl Solver for FailingSolver {
        async fn run(
            &self,
            _base: &str,
            _seat: &str,
            log: mpsc::Sender<String>,
        ) -> Result<SolverOutcome, SolverError> {
            let _ = log.send("loading pairing data".into()).await;
            Err(SolverError::Failed {
                status: 1,
                detail: "infeasible pairing problem".into(),
            })
        }
    }

    struct PanickingSolver;

    #[async_trait]
    impl Solver for PanickingSolver {
        async fn run(
            &self,
            _base: &str,
            _seat: &str,
            _log: mpsc::Sender<String>,
        ) -> Result<SolverOutcome, SolverError> {
            panic!("solver bug");
        }
    }

    async fn start_and_join(solver: Arc<dyn Solver>) -> (Arc<JobRegistry>, JobKey) {
        let registry = Arc::new(JobRegistry::new(8));
        let key = JobKey::new("bur", "fa").unwrap();
        let job_id = registry.try_start(&key).await.unwrap();

        spawn(Arc::clone(&registry), solver, key.clone(), job_id)
            .await
            .unwrap();
        (registry, key)
    }

    #[tokio::test]
    async fn successful_run_reaches_succeeded_with_logs() {
        let solver = Arc::new(SimulatedSolver::new(2, Duration::from_millis(1)));
        let (registry, key) = start_and_join(solver).await;

        let job = registry.get(&key).await.unwrap().job;
        assert_eq!(job.phase, JobPhase::Succeeded);
        assert!(job.finished_at.is_some());
        assert!(job.error.is_none());
        // Preamble + two passes + outcome summary.
        assert_eq!(job.log_lines.len(), 4);
    }

    #[tokio::test]
    async fn solver_failure_becomes_a_failed_job() {
        let (registry, key) = start_and_join(Arc::new(FailingSolver)).await;

        let job = registry.get(&key).await.unwrap().job;
        assert_eq!(job.phase, JobPhase::Failed);
        assert!(job.finished_at.is_some());
        assert!(job
            .error
            .as_deref()
            .unwrap()
            .contains("infeasible pairing problem"));
        assert_eq!(job.log_lines, vec!["loading pairing data".to_string()]);
    }

    #[tokio::test]
    async fn solver_panic_is_contained() {
        let (registry, key) = start_and_join(Arc::new(PanickingSolver)).await;

        let job = registry.get(&key).await.unwrap().job;
        assert_eq!(job.phase, JobPhase::Failed);
        assert!(job.error.as_deref().unwrap().contains("aborted"));
    }

    #[tokio::test]
    async fn key_can_be_rerun_after_the_runner_finishes() {
        let solver = Arc::new(SimulatedSolver::new(1, Duration::from_millis(1)));
        let (registry, key) = start_and_join(solver).await;

        assert!(registry.try_start(&key).await.is_ok());
    }
}
