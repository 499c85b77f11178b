//! [`SqliteStore`] — the SQLite implementation of [`FocusStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use koda_core::{
  badge::{Badge, EarnedBadge},
  session::{NewSession, SessionPage, SessionRecord},
  stats::{UserStats, WindowStats},
  store::FocusStore,
  user::{NewUser, User},
};

use crate::{
  Error, Result,
  encode::{
    RawBadge, RawEarnedBadge, RawSession, RawStats, RawUser, decode_u64,
    encode_date, encode_dt, encode_session_type, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Koda focus store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Build and insert a session row; `completed_at` is caller-assigned
  /// (it comes from the engine clock).
  fn session_row(input: &NewSession) -> SessionRecord {
    SessionRecord {
      session_id:       Uuid::new_v4(),
      user_id:          input.user_id,
      duration_minutes: input.duration_minutes,
      session_type:     input.session_type,
      completed_at:     input.completed_at,
    }
  }
}

fn insert_session(conn: &rusqlite::Connection, session: &SessionRecord) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO sessions
       (session_id, user_id, duration_minutes, session_type, completed_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      encode_uuid(session.session_id),
      encode_uuid(session.user_id),
      i64::from(session.duration_minutes),
      encode_session_type(session.session_type),
      encode_dt(session.completed_at),
    ],
  )?;
  Ok(())
}

// ─── FocusStore impl ─────────────────────────────────────────────────────────

impl FocusStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn add_user(&self, input: NewUser) -> Result<Option<User>> {
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      input.username,
      email:         input.email,
      password_hash: input.password_hash,
      created_at:    Utc::now(),
    };

    let id_str   = encode_uuid(user.user_id);
    let username = user.username.clone();
    let email    = user.email.clone();
    let hash     = user.password_hash.clone();
    let at_str   = encode_dt(user.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let taken: bool = tx
          .query_row(
            "SELECT 1 FROM users WHERE username = ?1 OR email = ?2",
            rusqlite::params![username, email],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(false);
        }

        tx.execute(
          "INSERT INTO users (user_id, username, email, password_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, username, email, hash, at_str],
        )?;
        tx.execute(
          "INSERT INTO user_stats (user_id) VALUES (?1)",
          rusqlite::params![id_str],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Ok(None);
    }
    Ok(Some(user))
  }

  async fn find_user(&self, username: &str) -> Result<Option<User>> {
    let name = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, username, email, password_hash, created_at
             FROM users WHERE username = ?1",
            rusqlite::params![name],
            |row| {
              Ok(RawUser {
                user_id:       row.get(0)?,
                username:      row.get(1)?,
                email:         row.get(2)?,
                password_hash: row.get(3)?,
                created_at:    row.get(4)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Stats ─────────────────────────────────────────────────────────────────

  async fn load_stats(&self, user_id: Uuid) -> Result<Option<UserStats>> {
    let id_str = encode_uuid(user_id);

    let raw: Option<RawStats> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT total_focus_minutes, total_sessions, current_streak,
                    longest_streak, last_session_date, buddy_level,
                    buddy_happiness
             FROM user_stats WHERE user_id = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawStats {
                total_focus_minutes: row.get(0)?,
                total_sessions:      row.get(1)?,
                current_streak:      row.get(2)?,
                longest_streak:      row.get(3)?,
                last_session_date:   row.get(4)?,
                buddy_level:         row.get(5)?,
                buddy_happiness:     row.get(6)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStats::into_stats).transpose()
  }

  // ── Session writes ────────────────────────────────────────────────────────

  async fn append_session(&self, input: NewSession) -> Result<SessionRecord> {
    let session = Self::session_row(&input);
    let row = session.clone();

    self
      .conn
      .call(move |conn| {
        insert_session(conn, &row)?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  async fn commit_focus_session(
    &self,
    input: NewSession,
    stats: &UserStats,
    badge_ids: &[i64],
  ) -> Result<SessionRecord> {
    let session = Self::session_row(&input);
    let row     = session.clone();

    let user_id_str   = encode_uuid(input.user_id);
    let last_date_str = stats.last_session_date.map(encode_date);
    let stats_row = (
      stats.total_focus_minutes as i64,
      stats.total_sessions as i64,
      i64::from(stats.current_streak),
      i64::from(stats.longest_streak),
      i64::from(stats.buddy_level),
      i64::from(stats.buddy_happiness),
    );
    let awards: Vec<i64> = badge_ids.to_vec();
    let earned_at_str   = encode_dt(input.completed_at);

    // Session append, stats overwrite, and badge awards are one
    // transaction: a failure in any of them rolls back all of them.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        insert_session(&tx, &row)?;

        tx.execute(
          "UPDATE user_stats
           SET total_focus_minutes = ?2,
               total_sessions      = ?3,
               current_streak      = ?4,
               longest_streak      = ?5,
               last_session_date   = ?6,
               buddy_level         = ?7,
               buddy_happiness     = ?8
           WHERE user_id = ?1",
          rusqlite::params![
            user_id_str,
            stats_row.0,
            stats_row.1,
            stats_row.2,
            stats_row.3,
            last_date_str,
            stats_row.4,
            stats_row.5,
          ],
        )?;

        for badge_id in &awards {
          tx.execute(
            "INSERT INTO user_badges (user_id, badge_id, earned_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (user_id, badge_id) DO NOTHING",
            rusqlite::params![user_id_str, badge_id, earned_at_str],
          )?;
        }

        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(session)
  }

  // ── Badges ────────────────────────────────────────────────────────────────

  async fn badge_catalog(&self) -> Result<Vec<Badge>> {
    let raws: Vec<RawBadge> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT badge_id, name, description, icon, requirement_kind,
                  requirement_value
           FROM badges ORDER BY badge_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawBadge {
              badge_id:          row.get(0)?,
              name:              row.get(1)?,
              description:       row.get(2)?,
              icon:              row.get(3)?,
              requirement_kind:  row.get(4)?,
              requirement_value: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBadge::into_badge).collect()
  }

  async fn earned_badge_ids(&self, user_id: Uuid) -> Result<Vec<i64>> {
    let id_str = encode_uuid(user_id);

    let ids: Vec<i64> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT badge_id FROM user_badges WHERE user_id = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids)
  }

  async fn earned_badges(&self, user_id: Uuid) -> Result<Vec<EarnedBadge>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<RawEarnedBadge> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT user_id, badge_id, earned_at
           FROM user_badges WHERE user_id = ?1
           ORDER BY earned_at, badge_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawEarnedBadge {
              user_id:   row.get(0)?,
              badge_id:  row.get(1)?,
              earned_at: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEarnedBadge::into_earned).collect()
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn window_stats(
    &self,
    user_id: Uuid,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
  ) -> Result<WindowStats> {
    let id_str    = encode_uuid(user_id);
    let start_str = encode_dt(start);
    let end_str   = encode_dt(end);

    let (count, minutes): (i64, i64) = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*), COALESCE(SUM(duration_minutes), 0)
           FROM sessions
           WHERE user_id = ?1
             AND session_type = 'focus'
             AND completed_at >= ?2
             AND completed_at < ?3",
          rusqlite::params![id_str, start_str, end_str],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?)
      })
      .await?;

    Ok(WindowStats {
      sessions:         decode_u64(count, "sessions")?,
      duration_minutes: decode_u64(minutes, "duration_minutes")?,
    })
  }

  async fn session_history(
    &self,
    user_id: Uuid,
    limit: u32,
    offset: u32,
  ) -> Result<SessionPage> {
    let id_str     = encode_uuid(user_id);
    let limit_val  = i64::from(limit);
    let offset_val = i64::from(offset);

    let (raws, total): (Vec<RawSession>, i64) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT session_id, user_id, duration_minutes, session_type,
                  completed_at
           FROM sessions WHERE user_id = ?1
           ORDER BY completed_at DESC
           LIMIT ?2 OFFSET ?3",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, limit_val, offset_val], |row| {
            Ok(RawSession {
              session_id:       row.get(0)?,
              user_id:          row.get(1)?,
              duration_minutes: row.get(2)?,
              session_type:     row.get(3)?,
              completed_at:     row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let total: i64 = conn.query_row(
          "SELECT COUNT(*) FROM sessions WHERE user_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;

        Ok((rows, total))
      })
      .await?;

    Ok(SessionPage {
      items: raws
        .into_iter()
        .map(RawSession::into_session)
        .collect::<Result<_>>()?,
      total: decode_u64(total, "total")?,
    })
  }
}
