//! Handler for `GET /badges` — the catalog annotated with earn dates.

use std::collections::HashMap;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use koda_core::{badge::Badge, store::FocusStore};
use serde::Serialize;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// One catalog entry plus the caller's earn date, if any.
#[derive(Debug, Serialize)]
pub struct BadgeStatus {
  #[serde(flatten)]
  pub badge:     Badge,
  pub earned_at: Option<DateTime<Utc>>,
}

/// `GET /badges` — every badge in catalog order; `earned_at` is null for
/// badges the caller has not earned yet.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<BadgeStatus>>, ApiError>
where
  S: FocusStore,
{
  let catalog = state
    .store
    .badge_catalog()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let earned: HashMap<i64, DateTime<Utc>> = state
    .store
    .earned_badges(user.user_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .into_iter()
    .map(|eb| (eb.badge_id, eb.earned_at))
    .collect();

  let statuses = catalog
    .into_iter()
    .map(|badge| BadgeStatus {
      earned_at: earned.get(&badge.badge_id).copied(),
      badge,
    })
    .collect();

  Ok(Json(statuses))
}
