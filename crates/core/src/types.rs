use serde::Serialize;

use crate::error::CoreError;

/// UTC timestamp used across the crate.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Maximum length of a base or seat token.
const MAX_TOKEN_LEN: usize = 8;

/// Identity key of an optimization job: a (base, seat) pair.
///
/// Both tokens are stored normalized (ASCII uppercase). Construction goes
/// through [`JobKey::new`], so two keys compare equal iff they refer to the
/// same normalized pair. The key space is open: keys exist from the moment
/// they are first referenced by a `run` command.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JobKey {
    base: String,
    seat: String,
}

impl JobKey {
    /// Build a key from raw tokens, normalizing and validating both.
    pub fn new(base: &str, seat: &str) -> Result<Self, CoreError> {
        Ok(Self {
            base: normalize_token(base, "base")?,
            seat: normalize_token(seat, "seat")?,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn seat(&self) -> &str {
        &self.seat
    }
}

impl std::fmt::Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.base, self.seat)
    }
}

/// Normalize a base/seat token to uppercase and validate its shape.
///
/// Rules:
/// - Must not be empty.
/// - Must not exceed `MAX_TOKEN_LEN` characters.
/// - Must contain only ASCII alphanumeric characters.
pub fn normalize_token(raw: &str, what: &str) -> Result<String, CoreError> {
    let token = raw.trim();
    if token.is_empty() {
        return Err(CoreError::Validation(format!(
            "The {what} value must not be empty"
        )));
    }
    if token.len() > MAX_TOKEN_LEN {
        return Err(CoreError::Validation(format!(
            "The {what} value must not exceed {MAX_TOKEN_LEN} characters"
        )));
    }
    if !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(CoreError::Validation(format!(
            "The {what} value may only contain alphanumeric characters"
        )));
    }
    Ok(token.to_ascii_uppercase())
}
