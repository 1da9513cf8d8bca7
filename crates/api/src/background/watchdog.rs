//! Periodic timeout of stuck optimization runs.
//!
//! Spawns a background loop that fails any job still Running whose
//! `last_updated` is older than the configured timeout. Runs on a fixed
//! interval using `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crewopt_core::job::JobPhase;

use crate::engine::registry::JobRegistry;

/// Default timeout for a Running job with no progress: 2 hours.
const DEFAULT_TIMEOUT_MINUTES: i64 = 120;

/// How often the watchdog checks for stuck jobs.
const CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Run the stuck-job watchdog loop.
///
/// Fails Running jobs that made no progress for `JOB_TIMEOUT_MINUTES`
/// (defaults to 120). Runs until `cancel` is triggered. The transition
/// carries the attempt id, so a runner finishing at the same moment wins
/// the race cleanly.
pub async fn run(registry: Arc<JobRegistry>, cancel: CancellationToken) {
    let timeout_minutes: i64 = std::env::var("JOB_TIMEOUT_MINUTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_MINUTES);

    tracing::info!(
        timeout_minutes,
        interval_secs = CHECK_INTERVAL.as_secs(),
        "Job watchdog started"
    );

    let mut interval = tokio::time::interval(CHECK_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Job watchdog stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::minutes(timeout_minutes);
                for (key, job_id) in registry.stale_running_jobs(cutoff).await {
                    let error = format!(
                        "timed out after {timeout_minutes} minutes without progress"
                    );
                    match registry
                        .transition(&key, job_id, JobPhase::Failed, Some(error))
                        .await
                    {
                        Ok(()) => {
                            tracing::warn!(%key, %job_id, "Watchdog timed out stuck optimization");
                        }
                        Err(e) => {
                            // The runner finished between the scan and the
                            // transition; its result stands.
                            tracing::debug!(%key, %job_id, error = %e, "Watchdog lost the race");
                        }
                    }
                }
            }
        }
    }
}
