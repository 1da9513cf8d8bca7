//! Reply types for the `/command` endpoint.
//!
//! The chat client branches on which top-level field is present
//! (`instructions` / `logs` / `message` / `all_statuses`, or the bare
//! single-job objects), so every response must carry exactly one shape.
//! [`Reply`] is a variant type serialized untagged: the mutual exclusivity
//! is enforced by construction instead of by convention.

use serde::Serialize;

use crewopt_core::command::INSTRUCTIONS;
use crewopt_core::job::JobPhase;
use crewopt_core::types::{JobKey, Timestamp};

use crate::engine::registry::JobSnapshot;

/// One reply to one command. Exactly one JSON shape per variant.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Instructions { instructions: &'static str },
    Logs { logs: Vec<String> },
    Message { message: String },
    AllStatuses { all_statuses: Vec<StatusView> },
    /// Immediate acknowledgement of a `run` command.
    Started(StartedView),
    /// Single-job status query result.
    Status(StatusView),
}

impl Reply {
    pub fn instructions() -> Self {
        Reply::Instructions {
            instructions: INSTRUCTIONS,
        }
    }

    pub fn logs(logs: Vec<String>) -> Self {
        Reply::Logs { logs }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Reply::Message {
            message: message.into(),
        }
    }

    pub fn all_statuses(all_statuses: Vec<StatusView>) -> Self {
        Reply::AllStatuses { all_statuses }
    }
}

/// Acknowledgement shape for `run`: the just-created (or conflicting)
/// job's phase, with `error` populated only for the already-running case.
#[derive(Debug, Serialize)]
pub struct StartedView {
    pub base: String,
    pub seat: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StartedView {
    pub fn accepted(key: &JobKey, phase: JobPhase) -> Self {
        Self {
            base: key.base().to_string(),
            seat: key.seat().to_string(),
            status: phase.to_string(),
            error: None,
        }
    }

    pub fn already_running(key: &JobKey, phase: JobPhase) -> Self {
        Self {
            base: key.base().to_string(),
            seat: key.seat().to_string(),
            status: phase.to_string(),
            error: Some(format!(
                "Optimization already running for base={}, seat={}",
                key.base(),
                key.seat()
            )),
        }
    }
}

/// Status projection of one job, used both as a single reply and as an
/// `all_statuses` entry. Absent fields are omitted from the JSON.
#[derive(Debug, Serialize)]
pub struct StatusView {
    pub base: String,
    pub seat: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusView {
    /// Project a registry snapshot into the wire shape.
    pub fn from_snapshot(snapshot: &JobSnapshot) -> Self {
        let job = &snapshot.job;

        let mut status_info = match job.phase {
            JobPhase::Idle => "no attempt recorded".to_string(),
            JobPhase::Queued => "queued, waiting to start".to_string(),
            JobPhase::Running => {
                format!("running, {} log lines captured", job.log_lines.len())
            }
            JobPhase::Succeeded => match job.log_lines.last() {
                Some(last) => format!("succeeded: {last}"),
                None => "succeeded".to_string(),
            },
            JobPhase::Failed => match &job.error {
                Some(err) => format!("failed: {err}"),
                None => "failed".to_string(),
            },
        };
        if snapshot.attempt > 1 {
            status_info.push_str(&format!(" (attempt {})", snapshot.attempt));
        }

        Self {
            base: job.key.base().to_string(),
            seat: job.key.seat().to_string(),
            status: Some(job.phase.to_string()),
            running: Some(job.phase == JobPhase::Running),
            status_info: Some(status_info),
            last_updated: Some(job.last_updated),
            error: job.error.clone(),
        }
    }

    /// Shape for a key that was never referenced by a `run` command.
    pub fn not_found(key: &JobKey) -> Self {
        Self {
            base: key.base().to_string(),
            seat: key.seat().to_string(),
            status: None,
            running: None,
            status_info: None,
            last_updated: None,
            error: Some("not found".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_keys(reply: &Reply) -> Vec<String> {
        let value = serde_json::to_value(reply).unwrap();
        let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    #[test]
    fn instructions_reply_has_a_single_field() {
        assert_eq!(object_keys(&Reply::instructions()), vec!["instructions"]);
    }

    #[test]
    fn message_reply_has_a_single_field() {
        assert_eq!(object_keys(&Reply::message("nope")), vec!["message"]);
    }

    #[test]
    fn logs_reply_has_a_single_field() {
        assert_eq!(object_keys(&Reply::logs(vec!["a".into()])), vec!["logs"]);
    }

    #[test]
    fn all_statuses_reply_has_a_single_field() {
        assert_eq!(
            object_keys(&Reply::all_statuses(Vec::new())),
            vec!["all_statuses"]
        );
    }

    #[test]
    fn accepted_run_ack_omits_error() {
        let key = JobKey::new("bur", "fa").unwrap();
        let reply = Reply::Started(StartedView::accepted(&key, JobPhase::Queued));
        let value = serde_json::to_value(&reply).unwrap();

        assert_eq!(value["base"], "BUR");
        assert_eq!(value["seat"], "FA");
        assert_eq!(value["status"], "Queued");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn not_found_status_carries_only_key_and_error() {
        let key = JobKey::new("xyz", "zz").unwrap();
        let reply = Reply::Status(StatusView::not_found(&key));
        assert_eq!(object_keys(&reply), vec!["base", "error", "seat"]);

        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(value["error"], "not found");
    }
}
