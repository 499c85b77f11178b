//! JSON REST API for Koda.
//!
//! Exposes an axum [`Router`] backed by any [`koda_core::store::FocusStore`].
//! TLS and transport concerns are the caller's responsibility; requests to
//! everything except `/auth/signup` carry HTTP Basic credentials checked
//! against the users table.

pub mod auth;
pub mod badges;
pub mod error;
pub mod sessions;
pub mod stats;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use koda_core::{engine::SessionEngine, store::FocusStore};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S: FocusStore> {
  pub store:  Arc<S>,
  pub engine: SessionEngine<S>,
}

impl<S: FocusStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      engine: self.engine.clone(),
    }
  }
}

impl<S: FocusStore> AppState<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self {
      engine: SessionEngine::new(Arc::clone(&store)),
      store,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: FocusStore + 'static,
{
  Router::new()
    // Accounts
    .route("/auth/signup", post(auth::signup::<S>))
    // Sessions
    .route("/sessions", get(sessions::list::<S>).post(sessions::create::<S>))
    // Stats
    .route("/stats", get(stats::overview::<S>))
    // Badges
    .route("/badges", get(badges::list::<S>))
    .with_state(state)
}
