//! Per-user aggregate statistics and the streak update rule.
//!
//! `UserStats` is the only mutable record the engine owns: one row per
//! user, read-modify-written on every completed focus session. The update
//! itself is a pure function over calendar dates so it can be tested
//! without a store or a real clock.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Happiness gained per completed focus session.
const HAPPINESS_PER_SESSION: u8 = 5;
/// Happiness ceiling; there is no decay rule, so this is a hard cap.
const HAPPINESS_MAX: u8 = 100;
/// Focus sessions per buddy level.
const SESSIONS_PER_LEVEL: u64 = 10;

/// Aggregate statistics for one user.
///
/// Invariants, re-established by [`UserStats::after_focus_session`]:
/// `longest_streak >= current_streak`,
/// `buddy_level == total_sessions / 10 + 1`, and
/// `buddy_happiness <= 100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
  pub total_focus_minutes: u64,
  pub total_sessions:      u64,
  pub current_streak:      u32,
  pub longest_streak:      u32,
  /// Calendar date (in the engine's reference timezone, UTC) of the most
  /// recent focus session. `None` until the first one.
  pub last_session_date:   Option<NaiveDate>,
  pub buddy_level:         u32,
  pub buddy_happiness:     u8,
}

impl Default for UserStats {
  /// The state assigned at account creation: all-zero counters, a level-1
  /// buddy at neutral happiness.
  fn default() -> Self {
    Self {
      total_focus_minutes: 0,
      total_sessions:      0,
      current_streak:      0,
      longest_streak:      0,
      last_session_date:   None,
      buddy_level:         1,
      buddy_happiness:     50,
    }
  }
}

impl UserStats {
  /// Fold one completed focus session into the stats.
  ///
  /// `today` is the calendar date derived from the engine clock, not
  /// client-local time. Streak transitions work on whole calendar days:
  /// a repeat session on the same day leaves the streak alone, the next
  /// day extends it, and any other gap (including a `last_session_date`
  /// in the future, from clock skew) resets it to 1.
  pub fn after_focus_session(&self, duration_minutes: u32, today: NaiveDate) -> UserStats {
    let current_streak = match self.last_session_date {
      None => 1,
      Some(last) => match (today - last).num_days() {
        0 => self.current_streak,
        1 => self.current_streak + 1,
        _ => 1,
      },
    };

    let total_sessions = self.total_sessions + 1;

    UserStats {
      total_focus_minutes: self.total_focus_minutes + u64::from(duration_minutes),
      total_sessions,
      current_streak,
      longest_streak: current_streak.max(self.longest_streak),
      last_session_date: Some(today),
      // Level is a pure function of lifetime session count, recomputed
      // rather than incremented, so it is recoverable from the count alone.
      buddy_level: (total_sessions / SESSIONS_PER_LEVEL) as u32 + 1,
      buddy_happiness: self
        .buddy_happiness
        .saturating_add(HAPPINESS_PER_SESSION)
        .min(HAPPINESS_MAX),
    }
  }
}

/// Focus-session count and summed duration over a time window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowStats {
  pub sessions:         u64,
  pub duration_minutes: u64,
}
