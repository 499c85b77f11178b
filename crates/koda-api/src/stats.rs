//! Handler for `GET /stats` — the dashboard read model.
//!
//! The engine only answers window queries over `[start, end)`; which
//! windows make a dashboard ("today", "this week") is decided here.

use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use koda_core::{
  stats::{UserStats, WindowStats},
  store::FocusStore,
};
use serde::Serialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Serialize)]
pub struct StatsResponse {
  pub overall: UserStats,
  pub today:   WindowStats,
  pub week:    WindowStats,
}

/// `GET /stats` — lifetime stats plus the today / trailing-7-day windows.
pub async fn overview<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<StatsResponse>, ApiError>
where
  S: FocusStore,
{
  let now = Utc::now();
  // Calendar "today" in the engine's reference timezone (UTC), matching
  // the date the streak algorithm works on.
  let midnight = now
    .date_naive()
    .and_hms_opt(0, 0, 0)
    .expect("midnight is a valid time")
    .and_utc();

  let overall = state.engine.overall_stats(user.user_id).await?;
  let today = state
    .engine
    .window_stats(user.user_id, midnight, now)
    .await?;
  let week = state
    .engine
    .window_stats(user.user_id, now - Duration::days(7), now)
    .await?;

  Ok(Json(StatsResponse { overall, today, week }))
}
