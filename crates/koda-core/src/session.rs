//! Session records — the append-only log of completed intervals.
//!
//! A session is recorded once, when the interval finishes, and never
//! mutated afterwards. Only `focus` sessions feed the streak, level, and
//! badge accounting; `break` sessions are logged and otherwise ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lower bound on an accepted session duration, in minutes.
pub const MIN_SESSION_MINUTES: u32 = 1;
/// Upper bound on an accepted session duration, in minutes.
pub const MAX_SESSION_MINUTES: u32 = 3600;

/// Whether a completed interval was work or rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionType {
  Focus,
  Break,
}

impl SessionType {
  pub fn is_focus(self) -> bool { matches!(self, Self::Focus) }
}

/// A completed interval, as persisted. Append-only; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
  pub session_id:       Uuid,
  pub user_id:          Uuid,
  pub duration_minutes: u32,
  pub session_type:     SessionType,
  pub completed_at:     DateTime<Utc>,
}

/// Input for appending a session; the store assigns the `session_id`.
#[derive(Debug, Clone)]
pub struct NewSession {
  pub user_id:          Uuid,
  pub duration_minutes: u32,
  pub session_type:     SessionType,
  pub completed_at:     DateTime<Utc>,
}

/// One page of session history, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPage {
  pub items: Vec<SessionRecord>,
  /// Total number of sessions for the user, across all pages.
  pub total: u64,
}
