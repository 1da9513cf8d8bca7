//! Job lifecycle types.
//!
//! A [`Job`] is one optimization attempt for a [`JobKey`]. Its [`JobPhase`]
//! moves strictly forward: `Idle -> Queued -> Running -> Succeeded | Failed`.
//! Phase changes go through [`Job::apply_transition`], which enforces the
//! order and stamps `finished_at` exactly once on entering a terminal phase.

use serde::Serialize;
use uuid::Uuid;

use crate::error::CoreError;
use crate::types::{JobKey, Timestamp};

/// Position of a job in its lifecycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JobPhase {
    /// No attempt has been created yet for the key.
    Idle,
    /// Attempt created, runner not yet started.
    Queued,
    /// The solver is executing.
    Running,
    Succeeded,
    Failed,
}

impl JobPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            JobPhase::Idle => "Idle",
            JobPhase::Queued => "Queued",
            JobPhase::Running => "Running",
            JobPhase::Succeeded => "Succeeded",
            JobPhase::Failed => "Failed",
        }
    }

    /// Whether the phase holds run exclusivity for its key.
    pub fn is_active(self) -> bool {
        matches!(self, JobPhase::Queued | JobPhase::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, JobPhase::Succeeded | JobPhase::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    ///
    /// No skips, no re-entry: terminal phases have no successors.
    pub fn can_transition(self, next: JobPhase) -> bool {
        matches!(
            (self, next),
            (JobPhase::Idle, JobPhase::Queued)
                | (JobPhase::Queued, JobPhase::Running)
                | (JobPhase::Running, JobPhase::Succeeded)
                | (JobPhase::Running, JobPhase::Failed)
        )
    }
}

impl std::fmt::Display for JobPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One optimization attempt for a (base, seat) key.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    /// Attempt id. Transitions and log appends carry this id so a writer
    /// holding a stale handle can never touch a newer attempt.
    pub id: Uuid,
    pub key: JobKey,
    pub phase: JobPhase,
    /// When the attempt was created (entered Queued).
    pub started_at: Timestamp,
    /// Set exactly once, on the transition into a terminal phase.
    pub finished_at: Option<Timestamp>,
    /// Solver output captured so far. Append-only while Running.
    pub log_lines: Vec<String>,
    pub error: Option<String>,
    /// Bumped on every phase or log change.
    pub last_updated: Timestamp,
}

impl Job {
    /// Create a fresh attempt in phase Queued.
    pub fn new(key: JobKey) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            key,
            phase: JobPhase::Queued,
            started_at: now,
            finished_at: None,
            log_lines: Vec::new(),
            error: None,
            last_updated: now,
        }
    }

    /// Move the job to `next`, enforcing the lifecycle order.
    ///
    /// Terminal transitions stamp `finished_at` and record `error` (if any)
    /// in the same step, so a concurrent reader never sees a terminal phase
    /// without its timestamp.
    pub fn apply_transition(
        &mut self,
        next: JobPhase,
        error: Option<String>,
    ) -> Result<(), CoreError> {
        if !self.phase.can_transition(next) {
            return Err(CoreError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }
        let now = chrono::Utc::now();
        self.phase = next;
        if next.is_terminal() {
            self.finished_at = Some(now);
            self.error = error;
        }
        self.last_updated = now;
        Ok(())
    }

    /// Append a solver log line and bump `last_updated`.
    pub fn append_log(&mut self, line: String) {
        self.log_lines.push(line);
        self.last_updated = chrono::Utc::now();
    }
}
