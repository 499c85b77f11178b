//! Handlers for `/sessions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/sessions` | Body: [`NewSessionBody`]; returns 201 + outcome |
//! | `GET`  | `/sessions` | Optional `limit` (default 20) and `offset` |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use koda_core::{
  engine::SessionOutcome,
  session::{SessionRecord, SessionType},
  store::FocusStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::CurrentUser, error::ApiError};

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /sessions`.
#[derive(Debug, Deserialize)]
pub struct NewSessionBody {
  pub duration_minutes: u32,
  pub session_type:     SessionType,
}

/// `POST /sessions` — returns 201 + the [`SessionOutcome`]: the appended
/// record, the updated stats, and any badges earned by this session.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<NewSessionBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FocusStore,
{
  let outcome: SessionOutcome = state
    .engine
    .record_session(user.user_id, body.duration_minutes, body.session_type)
    .await?;
  Ok((StatusCode::CREATED, Json(outcome)))
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default = "default_limit")]
  pub limit:  u32,
  #[serde(default)]
  pub offset: u32,
}

fn default_limit() -> u32 { 20 }

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
  pub items:  Vec<SessionRecord>,
  pub total:  u64,
  pub limit:  u32,
  pub offset: u32,
}

/// `GET /sessions?limit=20&offset=0` — the caller's history, newest first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<ListParams>,
) -> Result<Json<HistoryResponse>, ApiError>
where
  S: FocusStore,
{
  let page = state
    .engine
    .history(user.user_id, params.limit, params.offset)
    .await?;
  Ok(Json(HistoryResponse {
    items:  page.items,
    total:  page.total,
    limit:  params.limit,
    offset: params.offset,
  }))
}
