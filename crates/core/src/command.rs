//! Free-text command grammar and parser.
//!
//! The grammar is intentionally small and keyword-anchored rather than a
//! general language parser: the verb is matched by token, and the `base` /
//! `seat` values are the tokens immediately following those keywords.
//! Matching is case-insensitive, whitespace-tolerant, and ignores extra
//! surrounding words ("please run optimization with base bur seat fa"
//! parses the same as the canonical form).
//!
//! [`parse`] is a pure function of the input string.

use crate::error::CoreError;
use crate::types::{normalize_token, JobKey};

/// Help text returned for the `commands` command.
pub const INSTRUCTIONS: &str = "\
Welcome to the Crew Pairing Optimization Tool!

You can interact with this tool by sending commands with the following formats:

1. Run Optimization:
   - Command: \"run optimization with base <base> seat <seat>\"
   - Example: \"run optimization with base bur seat fa\"
   - Use \"run all seat <seat>\" to start one run per configured base.

2. Check Status:
   - Command: \"status base <base> seat <seat>\"
   - Example: \"status base bur seat fa\"
   - Use \"status\" (or \"all status\") to list every known job.

3. View Logs:
   - Command: \"logs base <base> seat <seat>\"
   - Example: \"logs base bur seat fa\"

Type \"commands\" (or \"help\") to see these instructions again.";

/// Parsed, typed meaning of a raw command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Start an optimization for one key.
    Run { key: JobKey },
    /// Start an optimization for every configured base with this seat.
    RunAll { seat: String },
    /// Return the help text.
    ListCommands,
    /// Query one job.
    Status { key: JobKey },
    /// Query the latest job of every known key.
    AllStatus,
    /// Return the captured log lines of one job.
    Logs { key: JobKey },
    /// Input matched no recognized form.
    Unrecognized { raw: String },
}

/// Parse a raw command line into an [`Intent`].
///
/// Recoverable problems (a recognized verb with a missing or malformed
/// argument) are returned as [`CoreError::Parse`] / [`CoreError::Validation`];
/// input matching no verb at all is `Intent::Unrecognized`, not an error.
pub fn parse(raw: &str) -> Result<Intent, CoreError> {
    let trimmed = raw.trim();
    let lower = trimmed.to_ascii_lowercase();
    let tokens: Vec<&str> = lower.split_whitespace().collect();

    if tokens.is_empty() {
        return Ok(Intent::Unrecognized {
            raw: trimmed.to_string(),
        });
    }

    // `commands` / `help`: exact, modulo case and surrounding whitespace.
    if tokens.len() == 1 && (tokens[0] == "commands" || tokens[0] == "help") {
        return Ok(Intent::ListCommands);
    }

    if tokens.contains(&"run") {
        if tokens.contains(&"all") {
            let seat = keyword_value(&tokens, "seat").ok_or_else(missing_seat)?;
            return Ok(Intent::RunAll {
                seat: normalize_token(seat, "seat")?,
            });
        }
        return Ok(Intent::Run {
            key: extract_key(&tokens)?,
        });
    }

    if tokens.contains(&"logs") || tokens.contains(&"log") {
        return Ok(Intent::Logs {
            key: extract_key(&tokens)?,
        });
    }

    if tokens.contains(&"status") || tokens.contains(&"statuses") {
        // Naming the `base`/`seat` keywords makes it a single-job query;
        // only the bare forms list everything.
        if tokens.contains(&"base") || tokens.contains(&"seat") {
            return Ok(Intent::Status {
                key: extract_key(&tokens)?,
            });
        }
        if matches!(
            tokens.as_slice(),
            ["status"] | ["statuses"] | ["all", "status"] | ["all", "statuses"]
        ) {
            return Ok(Intent::AllStatus);
        }
        return Ok(Intent::Unrecognized {
            raw: trimmed.to_string(),
        });
    }

    Ok(Intent::Unrecognized {
        raw: trimmed.to_string(),
    })
}

/// The token immediately following `keyword`, if any.
fn keyword_value<'a>(tokens: &[&'a str], keyword: &str) -> Option<&'a str> {
    tokens
        .iter()
        .position(|t| *t == keyword)
        .and_then(|i| tokens.get(i + 1).copied())
}

fn extract_key(tokens: &[&str]) -> Result<JobKey, CoreError> {
    let base = keyword_value(tokens, "base").ok_or_else(missing_base)?;
    let seat = keyword_value(tokens, "seat").ok_or_else(missing_seat)?;
    JobKey::new(base, seat)
}

fn missing_base() -> CoreError {
    CoreError::Parse("Base argument is missing in your command.".into())
}

fn missing_seat() -> CoreError {
    CoreError::Parse("Seat argument is missing in your command.".into())
}
