//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings and calendar dates as ISO
//! 8601 (`YYYY-MM-DD`). UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use koda_core::{
  badge::{Badge, EarnedBadge, RequirementKind},
  session::{SessionRecord, SessionType},
  stats::UserStats,
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> / NaiveDate ───────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── SessionType ─────────────────────────────────────────────────────────────

pub fn encode_session_type(t: SessionType) -> &'static str {
  match t {
    SessionType::Focus => "focus",
    SessionType::Break => "break",
  }
}

pub fn decode_session_type(s: &str) -> Result<SessionType> {
  match s {
    "focus" => Ok(SessionType::Focus),
    "break" => Ok(SessionType::Break),
    other => Err(Error::ValueOutOfRange(format!("unknown session type: {other:?}"))),
  }
}

// ─── RequirementKind ─────────────────────────────────────────────────────────

pub fn decode_requirement_kind(s: &str) -> Result<RequirementKind> {
  match s {
    "sessions" => Ok(RequirementKind::Sessions),
    "streak" => Ok(RequirementKind::Streak),
    "focus_time" => Ok(RequirementKind::FocusTime),
    other => {
      Err(Error::ValueOutOfRange(format!("unknown requirement kind: {other:?}")))
    }
  }
}

// ─── Integer narrowing ───────────────────────────────────────────────────────

pub fn decode_u32(v: i64, column: &str) -> Result<u32> {
  u32::try_from(v)
    .map_err(|_| Error::ValueOutOfRange(format!("{column} = {v}")))
}

pub fn decode_u64(v: i64, column: &str) -> Result<u64> {
  u64::try_from(v)
    .map_err(|_| Error::ValueOutOfRange(format!("{column} = {v}")))
}

pub fn decode_u8(v: i64, column: &str) -> Result<u8> {
  u8::try_from(v)
    .map_err(|_| Error::ValueOutOfRange(format!("{column} = {v}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub username:      String,
  pub email:         String,
  pub password_hash: String,
  pub created_at:    String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      username:      self.username,
      email:         self.email,
      password_hash: self.password_hash,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values read directly from a `user_stats` row.
pub struct RawStats {
  pub total_focus_minutes: i64,
  pub total_sessions:      i64,
  pub current_streak:      i64,
  pub longest_streak:      i64,
  pub last_session_date:   Option<String>,
  pub buddy_level:         i64,
  pub buddy_happiness:     i64,
}

impl RawStats {
  pub fn into_stats(self) -> Result<UserStats> {
    Ok(UserStats {
      total_focus_minutes: decode_u64(self.total_focus_minutes, "total_focus_minutes")?,
      total_sessions:      decode_u64(self.total_sessions, "total_sessions")?,
      current_streak:      decode_u32(self.current_streak, "current_streak")?,
      longest_streak:      decode_u32(self.longest_streak, "longest_streak")?,
      last_session_date:   self
        .last_session_date
        .as_deref()
        .map(decode_date)
        .transpose()?,
      buddy_level:         decode_u32(self.buddy_level, "buddy_level")?,
      buddy_happiness:     decode_u8(self.buddy_happiness, "buddy_happiness")?,
    })
  }
}

/// Raw values read directly from a `sessions` row.
pub struct RawSession {
  pub session_id:       String,
  pub user_id:          String,
  pub duration_minutes: i64,
  pub session_type:     String,
  pub completed_at:     String,
}

impl RawSession {
  pub fn into_session(self) -> Result<SessionRecord> {
    Ok(SessionRecord {
      session_id:       decode_uuid(&self.session_id)?,
      user_id:          decode_uuid(&self.user_id)?,
      duration_minutes: decode_u32(self.duration_minutes, "duration_minutes")?,
      session_type:     decode_session_type(&self.session_type)?,
      completed_at:     decode_dt(&self.completed_at)?,
    })
  }
}

/// Raw values read directly from a `badges` row.
pub struct RawBadge {
  pub badge_id:          i64,
  pub name:              String,
  pub description:       String,
  pub icon:              String,
  pub requirement_kind:  String,
  pub requirement_value: i64,
}

impl RawBadge {
  pub fn into_badge(self) -> Result<Badge> {
    Ok(Badge {
      badge_id:          self.badge_id,
      name:              self.name,
      description:       self.description,
      icon:              self.icon,
      requirement_kind:  decode_requirement_kind(&self.requirement_kind)?,
      requirement_value: decode_u64(self.requirement_value, "requirement_value")?,
    })
  }
}

/// Raw values read directly from a `user_badges` row.
pub struct RawEarnedBadge {
  pub user_id:   String,
  pub badge_id:  i64,
  pub earned_at: String,
}

impl RawEarnedBadge {
  pub fn into_earned(self) -> Result<EarnedBadge> {
    Ok(EarnedBadge {
      user_id:   decode_uuid(&self.user_id)?,
      badge_id:  self.badge_id,
      earned_at: decode_dt(&self.earned_at)?,
    })
  }
}
