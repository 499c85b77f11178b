//! SQL schema for the Koda SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS` and
/// `INSERT OR IGNORE` for the badge-catalog seed.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string
    created_at    TEXT NOT NULL
);

-- One row per user, created together with the account.
-- The only table the engine updates in place.
CREATE TABLE IF NOT EXISTS user_stats (
    user_id             TEXT PRIMARY KEY REFERENCES users(user_id),
    total_focus_minutes INTEGER NOT NULL DEFAULT 0,
    total_sessions      INTEGER NOT NULL DEFAULT 0,
    current_streak      INTEGER NOT NULL DEFAULT 0,
    longest_streak      INTEGER NOT NULL DEFAULT 0,
    last_session_date   TEXT,             -- ISO 8601 calendar date or NULL
    buddy_level         INTEGER NOT NULL DEFAULT 1,
    buddy_happiness     INTEGER NOT NULL DEFAULT 50
);

-- Sessions are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS sessions (
    session_id       TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL REFERENCES users(user_id),
    duration_minutes INTEGER NOT NULL,
    session_type     TEXT NOT NULL,   -- 'focus' | 'break'
    completed_at     TEXT NOT NULL    -- ISO 8601 UTC; server-assigned
);

-- Static catalog; read-only at runtime.
CREATE TABLE IF NOT EXISTS badges (
    badge_id          INTEGER PRIMARY KEY,
    name              TEXT NOT NULL,
    description       TEXT NOT NULL,
    icon              TEXT NOT NULL,
    requirement_kind  TEXT NOT NULL,   -- 'sessions' | 'streak' | 'focus_time'
    requirement_value INTEGER NOT NULL CHECK (requirement_value > 0)
);

-- Awards are append-only and unique per (user, badge).
CREATE TABLE IF NOT EXISTS user_badges (
    user_id   TEXT NOT NULL REFERENCES users(user_id),
    badge_id  INTEGER NOT NULL REFERENCES badges(badge_id),
    earned_at TEXT NOT NULL,
    UNIQUE (user_id, badge_id)
);

CREATE INDEX IF NOT EXISTS sessions_user_idx
  ON sessions(user_id, completed_at);
CREATE INDEX IF NOT EXISTS user_badges_user_idx
  ON user_badges(user_id);

INSERT OR IGNORE INTO badges
  (badge_id, name, description, icon, requirement_kind, requirement_value)
VALUES
  (1,  'First Focus',     'Complete your first focus session', '🎯', 'sessions',   1),
  (2,  'Consistent Cub',  'Maintain a 3-day streak',           '🐻', 'streak',     3),
  (3,  'Focus Master',    'Complete 10 focus sessions',        '🏆', 'sessions',   10),
  (4,  'Time Warrior',    'Focus for 5 hours total',           '⏰', 'focus_time', 300),
  (5,  'Streak Champion', 'Maintain a 7-day streak',           '🔥', 'streak',     7),
  (6,  'Dedicated Bear',  'Complete 50 focus sessions',        '🐻‍❄️', 'sessions',   50),
  (7,  'Marathon Runner', 'Focus for 20 hours total',          '🏃', 'focus_time', 1200),
  (8,  'Unstoppable',     'Maintain a 30-day streak',          '💪', 'streak',     30),
  (9,  'Zen Master',      'Focus for 50 hours total',          '🧘', 'focus_time', 3000),
  (10, 'Legend',          'Complete 100 focus sessions',       '⭐', 'sessions',   100);

PRAGMA user_version = 1;
";
