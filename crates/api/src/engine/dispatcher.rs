//! Command dispatcher: the façade behind `POST /command`.
//!
//! Routes a parsed [`Intent`] to the registry/runner and shapes the reply.
//! Domain-level failures (unrecognized input, already running, not found)
//! become structured reply fields with status 200; only genuinely
//! unexpected faults bubble out as [`AppError`].

use std::sync::Arc;

use crewopt_core::command::{self, Intent};
use crewopt_core::error::CoreError;
use crewopt_core::job::JobPhase;
use crewopt_core::types::JobKey;
use crewopt_solver::Solver;

use crate::engine::registry::JobRegistry;
use crate::engine::runner;
use crate::error::AppResult;
use crate::response::{Reply, StartedView, StatusView};

pub struct CommandDispatcher {
    registry: Arc<JobRegistry>,
    solver: Arc<dyn Solver>,
    /// Bases expanded by `run all`.
    crew_bases: Vec<String>,
}

impl CommandDispatcher {
    pub fn new(
        registry: Arc<JobRegistry>,
        solver: Arc<dyn Solver>,
        crew_bases: Vec<String>,
    ) -> Self {
        Self {
            registry,
            solver,
            crew_bases,
        }
    }

    /// Evaluate one raw command line.
    ///
    /// Each call is an independent evaluation: repeating a `run` while the
    /// first attempt is still active yields the already-running reply and
    /// leaves the original job untouched.
    pub async fn handle(&self, raw: &str) -> AppResult<Reply> {
        let intent = match command::parse(raw) {
            Ok(intent) => intent,
            Err(e @ (CoreError::Parse(_) | CoreError::Validation(_))) => {
                return Ok(Reply::message(user_message(&e)));
            }
            Err(other) => return Err(other.into()),
        };

        match intent {
            Intent::Run { key } => self.run_one(&key).await,
            Intent::RunAll { seat } => self.run_all(&seat).await,
            Intent::ListCommands => Ok(Reply::instructions()),
            Intent::Status { key } => Ok(self.status_one(&key).await),
            Intent::AllStatus => Ok(self.status_all().await),
            Intent::Logs { key } => Ok(self.logs_one(&key).await),
            Intent::Unrecognized { raw } => Ok(Reply::message(format!(
                "I didn't understand \"{raw}\". Type \"commands\" to see the available command formats."
            ))),
        }
    }

    /// Atomically create the attempt and hand it to the runner.
    async fn start(&self, key: &JobKey) -> Result<(), CoreError> {
        let job_id = self.registry.try_start(key).await?;
        runner::spawn(
            Arc::clone(&self.registry),
            Arc::clone(&self.solver),
            key.clone(),
            job_id,
        );
        tracing::info!(%key, %job_id, "Optimization accepted");
        Ok(())
    }

    async fn run_one(&self, key: &JobKey) -> AppResult<Reply> {
        match self.start(key).await {
            Ok(()) => Ok(Reply::Started(StartedView::accepted(key, JobPhase::Queued))),
            Err(CoreError::AlreadyRunning { phase, .. }) => {
                Ok(Reply::Started(StartedView::already_running(key, phase)))
            }
            Err(other) => Err(other.into()),
        }
    }

    async fn run_all(&self, seat: &str) -> AppResult<Reply> {
        let mut lines = Vec::with_capacity(self.crew_bases.len());
        for base in &self.crew_bases {
            let key = JobKey::new(base, seat)?;
            match self.start(&key).await {
                Ok(()) => lines.push(format!(
                    "Started optimization for base={}, seat={}.",
                    key.base(),
                    key.seat()
                )),
                Err(CoreError::AlreadyRunning { .. }) => lines.push(format!(
                    "Optimization already running for base={}, seat={}.",
                    key.base(),
                    key.seat()
                )),
                Err(other) => return Err(other.into()),
            }
        }
        Ok(Reply::logs(lines))
    }

    async fn status_one(&self, key: &JobKey) -> Reply {
        match self.registry.get(key).await {
            Some(snapshot) => Reply::Status(StatusView::from_snapshot(&snapshot)),
            None => Reply::Status(StatusView::not_found(key)),
        }
    }

    async fn status_all(&self) -> Reply {
        let views = self
            .registry
            .get_all()
            .await
            .iter()
            .map(StatusView::from_snapshot)
            .collect();
        Reply::all_statuses(views)
    }

    async fn logs_one(&self, key: &JobKey) -> Reply {
        match self.registry.get(key).await {
            Some(snapshot) => Reply::logs(snapshot.job.log_lines),
            None => Reply::message(format!(
                "No optimization found for base={}, seat={}. Run one first, or type \"commands\".",
                key.base(),
                key.seat()
            )),
        }
    }
}

/// User-facing wording for recoverable command problems.
fn user_message(err: &CoreError) -> String {
    match err {
        // Parse messages are already written for the user.
        CoreError::Parse(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;
    use crewopt_solver::SimulatedSolver;

    use super::*;

    fn dispatcher(step_delay: Duration) -> CommandDispatcher {
        CommandDispatcher::new(
            Arc::new(JobRegistry::new(8)),
            Arc::new(SimulatedSolver::new(2, step_delay)),
            vec!["BUR".into(), "DAL".into()],
        )
    }

    #[tokio::test]
    async fn run_acknowledges_with_queued_status() {
        let d = dispatcher(Duration::from_millis(50));
        let reply = d
            .handle("run optimization with base BUR seat FA")
            .await
            .unwrap();

        assert_matches!(reply, Reply::Started(view) => {
            assert_eq!(view.base, "BUR");
            assert_eq!(view.seat, "FA");
            assert_eq!(view.status, "Queued");
            assert!(view.error.is_none());
        });
    }

    #[tokio::test]
    async fn duplicate_run_surfaces_already_running_as_error_field() {
        let d = dispatcher(Duration::from_millis(200));
        d.handle("run optimization with base BUR seat FA")
            .await
            .unwrap();

        let reply = d
            .handle("run optimization with base bur seat fa")
            .await
            .unwrap();
        assert_matches!(reply, Reply::Started(view) => {
            assert!(view.error.as_deref().unwrap().contains("already running"));
        });
    }

    #[tokio::test]
    async fn commands_returns_instructions() {
        let d = dispatcher(Duration::from_millis(1));
        assert_matches!(
            d.handle("commands").await.unwrap(),
            Reply::Instructions { .. }
        );
    }

    #[tokio::test]
    async fn missing_seat_becomes_a_message() {
        let d = dispatcher(Duration::from_millis(1));
        let reply = d.handle("run optimization with base bur").await.unwrap();
        assert_matches!(reply, Reply::Message { message } => {
            assert_eq!(message, "Seat argument is missing in your command.");
        });
    }

    #[tokio::test]
    async fn unknown_key_status_is_not_found() {
        let d = dispatcher(Duration::from_millis(1));
        let reply = d.handle("status base XYZ seat ZZ").await.unwrap();
        assert_matches!(reply, Reply::Status(view) => {
            assert_eq!(view.base, "XYZ");
            assert_eq!(view.error.as_deref(), Some("not found"));
            assert!(view.running.is_none());
        });
    }

    #[tokio::test]
    async fn gibberish_gets_a_hint() {
        let d = dispatcher(Duration::from_millis(1));
        let reply = d.handle("make me a sandwich").await.unwrap();
        assert_matches!(reply, Reply::Message { message } => {
            assert!(message.contains("commands"));
        });
    }

    #[tokio::test]
    async fn run_all_reports_one_line_per_base() {
        let d = dispatcher(Duration::from_millis(200));
        d.handle("run optimization with base BUR seat FA")
            .await
            .unwrap();

        let reply = d.handle("run all seat fa").await.unwrap();
        assert_matches!(reply, Reply::Logs { logs } => {
            assert_eq!(logs.len(), 2);
            assert!(logs[0].contains("already running"));
            assert!(logs[1].starts_with("Started optimization for base=DAL"));
        });
    }

    #[tokio::test]
    async fn logs_for_unknown_key_is_a_message() {
        let d = dispatcher(Duration::from_millis(1));
        let reply = d.handle("logs base bur seat fa").await.unwrap();
        assert_matches!(reply, Reply::Message { .. });
    }
}
