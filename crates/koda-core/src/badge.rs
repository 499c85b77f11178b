//! Badge catalog types and the award predicate.
//!
//! The catalog is static at runtime — read-only rows seeded by the store.
//! An earned badge is permanent: rows are created once and never deleted,
//! and the streak predicate also accepts the historical best streak so a
//! "reach streak N" badge stays earnable after the current streak resets.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::stats::UserStats;

/// Which statistic a badge threshold applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
  Sessions,
  Streak,
  FocusTime,
}

/// One catalog entry. `requirement_value` is always positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
  pub badge_id:          i64,
  pub name:              String,
  pub description:       String,
  pub icon:              String,
  pub requirement_kind:  RequirementKind,
  pub requirement_value: u64,
}

impl Badge {
  /// Whether `stats` satisfies this badge's threshold.
  pub fn is_met(&self, stats: &UserStats) -> bool {
    match self.requirement_kind {
      RequirementKind::Sessions => stats.total_sessions >= self.requirement_value,
      RequirementKind::Streak => {
        u64::from(stats.current_streak) >= self.requirement_value
          || u64::from(stats.longest_streak) >= self.requirement_value
      }
      RequirementKind::FocusTime => {
        stats.total_focus_minutes >= self.requirement_value
      }
    }
  }
}

/// An awarded badge: unique per `(user_id, badge_id)`, never removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarnedBadge {
  pub user_id:   Uuid,
  pub badge_id:  i64,
  pub earned_at: DateTime<Utc>,
}

/// Badges from `catalog` that `stats` now satisfies and that are not in
/// `earned`. Returned in catalog order.
pub fn newly_earned<'a>(
  catalog: &'a [Badge],
  earned: &HashSet<i64>,
  stats: &UserStats,
) -> Vec<&'a Badge> {
  catalog
    .iter()
    .filter(|badge| !earned.contains(&badge.badge_id) && badge.is_met(stats))
    .collect()
}
