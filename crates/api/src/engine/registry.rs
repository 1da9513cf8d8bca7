//! In-memory job registry.
//!
//! The authoritative map from a (base, seat) key to its latest optimization
//! attempt. All mutation goes through [`JobRegistry::try_start`],
//! [`JobRegistry::transition`], and [`JobRegistry::append_log`]; each holds
//! the write lock only for the duration of the map update, never across
//! solver execution, so status reads always observe a consistent snapshot.

use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crewopt_core::error::CoreError;
use crewopt_core::job::{Job, JobPhase};
use crewopt_core::types::{JobKey, Timestamp};

/// Point-in-time view of a key's latest attempt.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub job: Job,
    /// 1-based attempt ordinal for the key (prior attempts live in the
    /// bounded history).
    pub attempt: usize,
}

struct JobEntry {
    current: Job,
    /// Prior terminal attempts, oldest first. Bounded by the registry's
    /// history limit.
    history: Vec<Job>,
}

/// Process-wide job state, shared via `Arc` and guarded by an `RwLock`.
///
/// Keys are stored in first-seen order, so [`JobRegistry::get_all`] returns
/// a stable listing across calls.
pub struct JobRegistry {
    jobs: RwLock<IndexMap<JobKey, JobEntry>>,
    history_limit: usize,
}

impl JobRegistry {
    pub fn new(history_limit: usize) -> Self {
        Self {
            jobs: RwLock::new(IndexMap::new()),
            history_limit,
        }
    }

    /// Atomically check-and-create a new attempt for `key`.
    ///
    /// Fails with [`CoreError::AlreadyRunning`] if the key's current job is
    /// Queued or Running. Otherwise the prior terminal attempt (if any) is
    /// archived into the bounded history and a fresh Queued job is stored.
    /// The check and the insert happen under one write lock, so concurrent
    /// `run` commands for the same key can never both succeed.
    pub async fn try_start(&self, key: &JobKey) -> Result<Uuid, CoreError> {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(key) {
            Some(entry) if entry.current.phase.is_active() => Err(CoreError::AlreadyRunning {
                base: key.base().to_string(),
                seat: key.seat().to_string(),
                phase: entry.current.phase,
            }),
            Some(entry) => {
                let job = Job::new(key.clone());
                let id = job.id;
                let prior = std::mem::replace(&mut entry.current, job);
                entry.history.push(prior);
                if entry.history.len() > self.history_limit {
                    entry.history.remove(0);
                }
                Ok(id)
            }
            None => {
                let job = Job::new(key.clone());
                let id = job.id;
                jobs.insert(
                    key.clone(),
                    JobEntry {
                        current: job,
                        history: Vec::new(),
                    },
                );
                Ok(id)
            }
        }
    }

    /// Snapshot of the latest attempt for `key`, if the key was ever
    /// referenced.
    pub async fn get(&self, key: &JobKey) -> Option<JobSnapshot> {
        let jobs = self.jobs.read().await;
        jobs.get(key).map(|entry| JobSnapshot {
            job: entry.current.clone(),
            attempt: entry.history.len() + 1,
        })
    }

    /// Snapshot of the latest attempt per known key, in first-seen key
    /// order.
    pub async fn get_all(&self) -> Vec<JobSnapshot> {
        let jobs = self.jobs.read().await;
        jobs.values()
            .map(|entry| JobSnapshot {
                job: entry.current.clone(),
                attempt: entry.history.len() + 1,
            })
            .collect()
    }

    /// Apply a phase transition to the attempt identified by `job_id`.
    ///
    /// Rejects transitions that violate the lifecycle order, and
    /// transitions whose `job_id` no longer matches the current attempt
    /// (a stale writer such as the watchdog racing a finishing runner).
    /// Phase, timestamps, and terminal fields are updated in one critical
    /// section.
    pub async fn transition(
        &self,
        key: &JobKey,
        job_id: Uuid,
        next: JobPhase,
        error: Option<String>,
    ) -> Result<(), CoreError> {
        let mut jobs = self.jobs.write().await;
        let entry = jobs.get_mut(key).ok_or_else(|| CoreError::NotFound {
            base: key.base().to_string(),
            seat: key.seat().to_string(),
        })?;
        if entry.current.id != job_id {
            return Err(CoreError::InvalidTransition {
                from: entry.current.phase,
                to: next,
            });
        }
        entry.current.apply_transition(next, error)
    }

    /// Append a solver log line to the attempt identified by `job_id`.
    ///
    /// Silently ignored (logged at debug) if the attempt was superseded or
    /// is no longer Running.
    pub async fn append_log(&self, key: &JobKey, job_id: Uuid, line: String) {
        let mut jobs = self.jobs.write().await;
        match jobs.get_mut(key) {
            Some(entry)
                if entry.current.id == job_id && entry.current.phase == JobPhase::Running =>
            {
                entry.current.append_log(line);
            }
            _ => {
                tracing::debug!(%key, %job_id, "Dropping log line for stale job");
            }
        }
    }

    /// Keys whose current attempt is Running but has not made progress
    /// since `cutoff`. Used by the watchdog.
    pub async fn stale_running_jobs(&self, cutoff: Timestamp) -> Vec<(JobKey, Uuid)> {
        let jobs = self.jobs.read().await;
        jobs.iter()
            .filter(|(_, entry)| {
                entry.current.phase == JobPhase::Running && entry.current.last_updated < cutoff
            })
            .map(|(key, entry)| (key.clone(), entry.current.id))
            .collect()
    }

    /// Number of keys whose current attempt holds run exclusivity.
    pub async fn active_count(&self) -> usize {
        let jobs = self.jobs.read().await;
        jobs.values()
            .filter(|entry| entry.current.phase.is_active())
            .count()
    }
}
