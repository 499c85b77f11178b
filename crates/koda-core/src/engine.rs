//! The session accounting engine.
//!
//! Consumes completed-interval events and folds them into the user's
//! stats, level, happiness, and badges. All storage access goes through
//! the injected [`FocusStore`]; the current instant comes from the
//! injected [`Clock`].

use std::{
  collections::HashMap,
  sync::{Arc, Mutex as StdMutex},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use uuid::Uuid;

use crate::{
  Error, Result,
  badge::{self, Badge},
  clock::{Clock, SystemClock},
  session::{
    MAX_SESSION_MINUTES, MIN_SESSION_MINUTES, NewSession, SessionPage,
    SessionRecord, SessionType,
  },
  stats::{UserStats, WindowStats},
  store::FocusStore,
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What one `record_session` call produced.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
  pub session:    SessionRecord,
  /// The stats after this session was applied.
  pub stats:      UserStats,
  /// Badges earned by this call, in catalog order. Empty for breaks.
  pub new_badges: Vec<Badge>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The accounting engine over a storage backend `S` and clock `C`.
///
/// Cloning is cheap; clones share the store and the per-user lock table.
pub struct SessionEngine<S, C = SystemClock> {
  store:      Arc<S>,
  clock:      C,
  /// One async mutex per user, created on first use. Serialises the
  /// read-modify-write of that user's stats row; different users never
  /// contend.
  user_locks: Arc<StdMutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>>,
}

impl<S, C: Clone> Clone for SessionEngine<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      clock:      self.clock.clone(),
      user_locks: Arc::clone(&self.user_locks),
    }
  }
}

impl<S: FocusStore> SessionEngine<S, SystemClock> {
  pub fn new(store: Arc<S>) -> Self {
    Self::with_clock(store, SystemClock)
  }
}

impl<S: FocusStore, C: Clock> SessionEngine<S, C> {
  pub fn with_clock(store: Arc<S>, clock: C) -> Self {
    Self {
      store,
      clock,
      user_locks: Arc::new(StdMutex::new(HashMap::new())),
    }
  }

  fn user_lock(&self, user_id: Uuid) -> Arc<AsyncMutex<()>> {
    let mut locks = self.user_locks.lock().expect("user lock table poisoned");
    Arc::clone(locks.entry(user_id).or_default())
  }

  // ── Session completion ────────────────────────────────────────────────────

  /// Record one completed interval for `user_id`.
  ///
  /// Breaks are appended to the session log and change nothing else.
  /// Focus sessions run the streak update and badge evaluation, and the
  /// store commits session + stats + awards as one transaction — a badge
  /// failure rolls the stats change back rather than being swallowed.
  pub async fn record_session(
    &self,
    user_id: Uuid,
    duration_minutes: u32,
    session_type: SessionType,
  ) -> Result<SessionOutcome> {
    if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&duration_minutes) {
      return Err(Error::DurationOutOfRange(duration_minutes));
    }

    // Held across the whole read-modify-write: two concurrent completions
    // for the same user must not interleave (lost-update hazard).
    let lock = self.user_lock(user_id);
    let _guard = lock.lock().await;

    let stats = self
      .store
      .load_stats(user_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::UserNotFound(user_id))?;

    let now = self.clock.now();
    let input = NewSession {
      user_id,
      duration_minutes,
      session_type,
      completed_at: now,
    };

    if !session_type.is_focus() {
      let session =
        self.store.append_session(input).await.map_err(Error::store)?;
      return Ok(SessionOutcome { session, stats, new_badges: Vec::new() });
    }

    let updated = stats.after_focus_session(duration_minutes, now.date_naive());

    let catalog = self.store.badge_catalog().await.map_err(Error::store)?;
    let earned = self
      .store
      .earned_badge_ids(user_id)
      .await
      .map_err(Error::store)?
      .into_iter()
      .collect();

    let new_badges: Vec<Badge> = badge::newly_earned(&catalog, &earned, &updated)
      .into_iter()
      .cloned()
      .collect();
    let badge_ids: Vec<i64> = new_badges.iter().map(|b| b.badge_id).collect();

    let session = self
      .store
      .commit_focus_session(input, &updated, &badge_ids)
      .await
      .map_err(Error::store)?;

    for badge in &new_badges {
      tracing::info!(%user_id, badge = %badge.name, "badge earned");
    }

    Ok(SessionOutcome { session, stats: updated, new_badges })
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Current stats, or the account-creation defaults if no row exists.
  /// Never fails with "not found" — reads are total.
  pub async fn overall_stats(&self, user_id: Uuid) -> Result<UserStats> {
    Ok(
      self
        .store
        .load_stats(user_id)
        .await
        .map_err(Error::store)?
        .unwrap_or_default(),
    )
  }

  /// Focus-session count and minutes with `completed_at` in `[start, end)`.
  /// The window bounds themselves (today, this week, ...) are the caller's
  /// concern.
  pub async fn window_stats(
    &self,
    user_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> Result<WindowStats> {
    self
      .store
      .window_stats(user_id, start, end)
      .await
      .map_err(Error::store)
  }

  /// Session history, newest first, paginated.
  pub async fn history(
    &self,
    user_id: Uuid,
    limit: u32,
    offset: u32,
  ) -> Result<SessionPage> {
    self
      .store
      .session_history(user_id, limit, offset)
      .await
      .map_err(Error::store)
  }
}
