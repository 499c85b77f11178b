//! Integration tests for `SqliteStore` and the accounting engine against an
//! in-memory database.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use koda_core::{
  clock::Clock,
  engine::SessionEngine,
  session::{NewSession, SessionType},
  store::FocusStore,
  user::{NewUser, User},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(username: &str) -> NewUser {
  NewUser {
    username:      username.into(),
    email:         format!("{username}@example.com"),
    password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
  }
}

async fn user(s: &SqliteStore, username: &str) -> User {
  s.add_user(new_user(username)).await.unwrap().expect("fresh username")
}

/// A settable clock so calendar days advance under test control.
#[derive(Clone)]
struct TestClock(Arc<Mutex<DateTime<Utc>>>);

impl TestClock {
  fn at(dt: DateTime<Utc>) -> Self { Self(Arc::new(Mutex::new(dt))) }

  fn set(&self, dt: DateTime<Utc>) { *self.0.lock().unwrap() = dt; }

  fn advance_days(&self, days: i64) {
    let mut now = self.0.lock().unwrap();
    *now += Duration::days(days);
  }
}

impl Clock for TestClock {
  fn now(&self) -> DateTime<Utc> { *self.0.lock().unwrap() }
}

fn day_one() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()
}

fn engine(s: &SqliteStore, clock: &TestClock) -> SessionEngine<SqliteStore, TestClock> {
  SessionEngine::with_clock(Arc::new(s.clone()), clock.clone())
}

// ─── Accounts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_user_creates_default_stats_row() {
  let s = store().await;
  let u = user(&s, "alice").await;

  let stats = s.load_stats(u.user_id).await.unwrap().unwrap();
  assert_eq!(stats.total_sessions, 0);
  assert_eq!(stats.current_streak, 0);
  assert_eq!(stats.buddy_level, 1);
  assert_eq!(stats.buddy_happiness, 50);
  assert!(stats.last_session_date.is_none());
}

#[tokio::test]
async fn add_user_duplicate_username_is_rejected() {
  let s = store().await;
  user(&s, "alice").await;

  assert!(s.add_user(new_user("alice")).await.unwrap().is_none());
}

#[tokio::test]
async fn find_user_by_username() {
  let s = store().await;
  let u = user(&s, "alice").await;

  let found = s.find_user("alice").await.unwrap().unwrap();
  assert_eq!(found.user_id, u.user_id);
  assert_eq!(found.email, "alice@example.com");

  assert!(s.find_user("nobody").await.unwrap().is_none());
}

#[tokio::test]
async fn load_stats_unknown_user_is_none() {
  let s = store().await;
  assert!(s.load_stats(Uuid::new_v4()).await.unwrap().is_none());
}

// ─── Session completion — engine ─────────────────────────────────────────────

#[tokio::test]
async fn first_focus_session_awards_first_focus_badge() {
  // Scenario: fresh user, one 25-minute focus session on day one.
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  let outcome = engine
    .record_session(u.user_id, 25, SessionType::Focus)
    .await
    .unwrap();

  assert_eq!(outcome.stats.total_sessions, 1);
  assert_eq!(outcome.stats.total_focus_minutes, 25);
  assert_eq!(outcome.stats.current_streak, 1);
  assert_eq!(outcome.stats.longest_streak, 1);
  assert_eq!(outcome.stats.buddy_level, 1);
  assert_eq!(outcome.stats.buddy_happiness, 55);

  let names: Vec<&str> =
    outcome.new_badges.iter().map(|b| b.name.as_str()).collect();
  assert_eq!(names, vec!["First Focus"]);

  // Persisted state matches the returned state.
  let stored = s.load_stats(u.user_id).await.unwrap().unwrap();
  assert_eq!(stored, outcome.stats);
  assert_eq!(s.earned_badge_ids(u.user_id).await.unwrap(), vec![1]);
}

#[tokio::test]
async fn consecutive_days_extend_streak() {
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  for _ in 0..3 {
    engine
      .record_session(u.user_id, 25, SessionType::Focus)
      .await
      .unwrap();
    clock.advance_days(1);
  }

  let stats = engine.overall_stats(u.user_id).await.unwrap();
  assert_eq!(stats.current_streak, 3);
  assert_eq!(stats.longest_streak, 3);
}

#[tokio::test]
async fn gap_resets_streak_but_longest_survives() {
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  // Build a 5-day streak.
  for _ in 0..5 {
    engine
      .record_session(u.user_id, 25, SessionType::Focus)
      .await
      .unwrap();
    clock.advance_days(1);
  }

  // Ten days of silence, then one more session.
  clock.advance_days(10);
  let outcome = engine
    .record_session(u.user_id, 25, SessionType::Focus)
    .await
    .unwrap();

  assert_eq!(outcome.stats.current_streak, 1);
  assert_eq!(outcome.stats.longest_streak, 5);
}

#[tokio::test]
async fn same_day_sessions_do_not_extend_streak() {
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  engine
    .record_session(u.user_id, 25, SessionType::Focus)
    .await
    .unwrap();
  // Later the same calendar day.
  clock.set(day_one() + Duration::hours(8));
  let outcome = engine
    .record_session(u.user_id, 25, SessionType::Focus)
    .await
    .unwrap();

  assert_eq!(outcome.stats.current_streak, 1);
  assert_eq!(outcome.stats.total_sessions, 2);
}

#[tokio::test]
async fn tenth_session_levels_the_buddy_up() {
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  for i in 0..10 {
    let outcome = engine
      .record_session(u.user_id, 25, SessionType::Focus)
      .await
      .unwrap();
    let expected_level = if i < 9 { 1 } else { 2 };
    assert_eq!(outcome.stats.buddy_level, expected_level);
  }

  // "Focus Master" (10 sessions) came with the level-up call.
  let earned = s.earned_badge_ids(u.user_id).await.unwrap();
  assert!(earned.contains(&3));
}

#[tokio::test]
async fn break_session_is_logged_and_changes_nothing_else() {
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  let before = engine.overall_stats(u.user_id).await.unwrap();
  let outcome = engine
    .record_session(u.user_id, 5, SessionType::Break)
    .await
    .unwrap();

  assert_eq!(outcome.stats, before);
  assert!(outcome.new_badges.is_empty());
  assert_eq!(s.load_stats(u.user_id).await.unwrap().unwrap(), before);

  let page = engine.history(u.user_id, 10, 0).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.items[0].session_type, SessionType::Break);
}

#[tokio::test]
async fn duration_out_of_range_is_rejected_without_mutation() {
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  for bad in [0, 3601] {
    let err = engine
      .record_session(u.user_id, bad, SessionType::Focus)
      .await
      .unwrap_err();
    assert!(matches!(err, koda_core::Error::DurationOutOfRange(_)));
  }

  let page = engine.history(u.user_id, 10, 0).await.unwrap();
  assert_eq!(page.total, 0);
  let stats = engine.overall_stats(u.user_id).await.unwrap();
  assert_eq!(stats.total_sessions, 0);
}

#[tokio::test]
async fn unknown_user_is_rejected() {
  let s = store().await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  let err = engine
    .record_session(Uuid::new_v4(), 25, SessionType::Focus)
    .await
    .unwrap_err();
  assert!(matches!(err, koda_core::Error::UserNotFound(_)));
}

#[tokio::test]
async fn concurrent_completions_for_one_user_are_serialized() {
  // Both calls start from total_sessions = 4; a lost update would leave 5.
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  for _ in 0..4 {
    engine
      .record_session(u.user_id, 25, SessionType::Focus)
      .await
      .unwrap();
  }

  let (a, b) = tokio::join!(
    engine.record_session(u.user_id, 25, SessionType::Focus),
    engine.record_session(u.user_id, 25, SessionType::Focus),
  );
  a.unwrap();
  b.unwrap();

  let stats = engine.overall_stats(u.user_id).await.unwrap();
  assert_eq!(stats.total_sessions, 6);
  assert_eq!(stats.total_focus_minutes, 6 * 25);
}

#[tokio::test]
async fn overall_stats_for_unknown_user_is_the_default_record() {
  let s = store().await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  let stats = engine.overall_stats(Uuid::new_v4()).await.unwrap();
  assert_eq!(stats.total_sessions, 0);
  assert_eq!(stats.buddy_level, 1);
  assert_eq!(stats.buddy_happiness, 50);
}

// ─── Badges — store semantics ────────────────────────────────────────────────

#[tokio::test]
async fn badge_catalog_is_seeded_in_order() {
  let s = store().await;
  let catalog = s.badge_catalog().await.unwrap();

  assert_eq!(catalog.len(), 10);
  assert_eq!(catalog[0].name, "First Focus");
  assert_eq!(catalog[9].name, "Legend");
  assert!(catalog.windows(2).all(|w| w[0].badge_id < w[1].badge_id));
  assert!(catalog.iter().all(|b| b.requirement_value > 0));
}

#[tokio::test]
async fn duplicate_badge_award_is_a_no_op() {
  let s = store().await;
  let u = user(&s, "alice").await;

  let stats = koda_core::stats::UserStats::default()
    .after_focus_session(25, day_one().date_naive());
  let session = || NewSession {
    user_id:          u.user_id,
    duration_minutes: 25,
    session_type:     SessionType::Focus,
    completed_at:     day_one(),
  };

  // Same award id committed twice; the second insert must be ignored.
  s.commit_focus_session(session(), &stats, &[1]).await.unwrap();
  s.commit_focus_session(session(), &stats, &[1]).await.unwrap();

  assert_eq!(s.earned_badge_ids(u.user_id).await.unwrap(), vec![1]);
  assert_eq!(s.earned_badges(u.user_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn streak_badge_is_earned_through_historical_best() {
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  // Three consecutive days earn "Consistent Cub" (streak 3).
  for _ in 0..3 {
    engine
      .record_session(u.user_id, 25, SessionType::Focus)
      .await
      .unwrap();
    clock.advance_days(1);
  }
  let earned = s.earned_badge_ids(u.user_id).await.unwrap();
  assert!(earned.contains(&2));

  // After a long gap the streak resets, but the badge stays earned and
  // is not re-awarded.
  clock.advance_days(30);
  let outcome = engine
    .record_session(u.user_id, 25, SessionType::Focus)
    .await
    .unwrap();
  assert_eq!(outcome.stats.current_streak, 1);
  assert!(outcome.new_badges.iter().all(|b| b.badge_id != 2));
  let earned_after = s.earned_badge_ids(u.user_id).await.unwrap();
  assert_eq!(
    earned_after.iter().filter(|id| **id == 2).count(),
    1
  );
}

#[tokio::test]
async fn focus_time_badge_crosses_threshold() {
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  // 5 x 60 minutes = 300 → "Time Warrior".
  let mut last = None;
  for _ in 0..5 {
    last = Some(
      engine
        .record_session(u.user_id, 60, SessionType::Focus)
        .await
        .unwrap(),
    );
  }

  let outcome = last.unwrap();
  assert!(outcome.new_badges.iter().any(|b| b.badge_id == 4));
}

// ─── Reads ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn window_stats_counts_focus_sessions_in_half_open_range() {
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  engine
    .record_session(u.user_id, 25, SessionType::Focus)
    .await
    .unwrap();
  engine
    .record_session(u.user_id, 5, SessionType::Break)
    .await
    .unwrap();
  clock.advance_days(1);
  engine
    .record_session(u.user_id, 30, SessionType::Focus)
    .await
    .unwrap();

  // Day one only: the break is excluded, day two is outside the window.
  let start = day_one() - Duration::hours(1);
  let end = day_one() + Duration::hours(1);
  let window = engine.window_stats(u.user_id, start, end).await.unwrap();
  assert_eq!(window.sessions, 1);
  assert_eq!(window.duration_minutes, 25);

  // The end bound is exclusive.
  let empty = engine
    .window_stats(u.user_id, start, day_one())
    .await
    .unwrap();
  assert_eq!(empty.sessions, 0);
  assert_eq!(empty.duration_minutes, 0);

  // Both days.
  let both = engine
    .window_stats(u.user_id, start, day_one() + Duration::days(2))
    .await
    .unwrap();
  assert_eq!(both.sessions, 2);
  assert_eq!(both.duration_minutes, 55);
}

#[tokio::test]
async fn history_is_newest_first_and_paginated() {
  let s = store().await;
  let u = user(&s, "alice").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  for minutes in [10, 20, 30] {
    engine
      .record_session(u.user_id, minutes, SessionType::Focus)
      .await
      .unwrap();
    clock.advance_days(1);
  }

  let first_page = engine.history(u.user_id, 2, 0).await.unwrap();
  assert_eq!(first_page.total, 3);
  assert_eq!(first_page.items.len(), 2);
  assert_eq!(first_page.items[0].duration_minutes, 30);
  assert_eq!(first_page.items[1].duration_minutes, 20);

  let second_page = engine.history(u.user_id, 2, 2).await.unwrap();
  assert_eq!(second_page.total, 3);
  assert_eq!(second_page.items.len(), 1);
  assert_eq!(second_page.items[0].duration_minutes, 10);
}

#[tokio::test]
async fn history_only_returns_the_requested_user() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let clock = TestClock::at(day_one());
  let engine = engine(&s, &clock);

  engine
    .record_session(alice.user_id, 25, SessionType::Focus)
    .await
    .unwrap();
  engine
    .record_session(bob.user_id, 50, SessionType::Focus)
    .await
    .unwrap();

  let page = engine.history(alice.user_id, 10, 0).await.unwrap();
  assert_eq!(page.total, 1);
  assert_eq!(page.items[0].user_id, alice.user_id);
}
