//! The `FocusStore` trait — the storage capability injected into the engine.
//!
//! The trait is implemented by storage backends (e.g. `koda-store-sqlite`).
//! The engine and the API layer depend on this abstraction, not on any
//! concrete backend or shared connection singleton.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  badge::{Badge, EarnedBadge},
  session::{NewSession, SessionPage, SessionRecord},
  stats::{UserStats, WindowStats},
  user::{NewUser, User},
};

/// Abstraction over a Koda storage backend.
///
/// Sessions and earned badges are append-only; the per-user stats row is
/// the only record that is updated in place, and only through
/// [`commit_focus_session`](FocusStore::commit_focus_session).
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait FocusStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Create an account together with its default stats row, atomically.
  ///
  /// Returns `None` if the username or email is already taken.
  fn add_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look an account up by username. Returns `None` if not found.
  fn find_user<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Stats ─────────────────────────────────────────────────────────────

  /// Read the stats row for a user. `None` means the user has no account.
  fn load_stats(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<UserStats>, Self::Error>> + Send + '_;

  // ── Session writes ────────────────────────────────────────────────────

  /// Append a session record without touching stats (the break path).
  fn append_session(
    &self,
    input: NewSession,
  ) -> impl Future<Output = Result<SessionRecord, Self::Error>> + Send + '_;

  /// Commit one completed focus session in a single transaction:
  /// append the session record, overwrite the user's stats row, and
  /// insert the listed badge awards. Badge inserts are idempotent
  /// (unique `(user_id, badge_id)`, insert-ignore on conflict), so a
  /// retried commit cannot double-award.
  ///
  /// Any failure rolls the whole commit back — stats are never persisted
  /// without the session and awards that justify them.
  fn commit_focus_session<'a>(
    &'a self,
    input: NewSession,
    stats: &'a UserStats,
    badge_ids: &'a [i64],
  ) -> impl Future<Output = Result<SessionRecord, Self::Error>> + Send + 'a;

  // ── Badges ────────────────────────────────────────────────────────────

  /// The full static badge catalog, in catalog (seed) order.
  fn badge_catalog(
    &self,
  ) -> impl Future<Output = Result<Vec<Badge>, Self::Error>> + Send + '_;

  /// Ids of the badges the user has already earned.
  fn earned_badge_ids(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + '_;

  /// The user's earned-badge records, oldest first.
  fn earned_badges(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<EarnedBadge>, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Count and summed duration of focus sessions with
  /// `completed_at` in `[start, end)`.
  fn window_stats(
    &self,
    user_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> impl Future<Output = Result<WindowStats, Self::Error>> + Send + '_;

  /// One page of the user's sessions, newest first, plus the total count.
  fn session_history(
    &self,
    user_id: Uuid,
    limit: u32,
    offset: u32,
  ) -> impl Future<Output = Result<SessionPage, Self::Error>> + Send + '_;
}
