//! Account signup and the HTTP Basic-auth extractor.
//!
//! Credentials are checked per request against the users table; there is no
//! session or token state to invalidate.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{HeaderMap, StatusCode, request::Parts},
  response::IntoResponse,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use koda_core::{
  store::FocusStore,
  user::{NewUser, User},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

// ─── Extractor ────────────────────────────────────────────────────────────────

/// The authenticated account; present in a handler signature means the
/// request carried valid Basic credentials.
pub struct CurrentUser(pub User);

async fn verify_basic<S>(
  headers: &HeaderMap,
  state: &AppState<S>,
) -> Result<User, ApiError>
where
  S: FocusStore,
{
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let user = state
    .store
    .find_user(username)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::Unauthorized)?;

  let parsed_hash =
    PasswordHash::new(&user.password_hash).map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(user)
}

impl<S> FromRequestParts<AppState<S>> for CurrentUser
where
  S: FocusStore + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let user = verify_basic(&parts.headers, state).await?;
    Ok(CurrentUser(user))
  }
}

// ─── Signup ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /auth/signup`.
#[derive(Debug, Deserialize)]
pub struct SignupBody {
  pub username: String,
  pub email:    String,
  pub password: String,
}

fn validate_signup(body: &SignupBody) -> Result<(), ApiError> {
  if !(3..=50).contains(&body.username.chars().count()) {
    return Err(ApiError::BadRequest(
      "username must be 3-50 characters".into(),
    ));
  }
  // Enough structure to reject obvious typos; real verification would be
  // a confirmation mail anyway.
  let (local, domain) = body
    .email
    .split_once('@')
    .ok_or_else(|| ApiError::BadRequest("invalid email address".into()))?;
  if local.is_empty() || !domain.contains('.') {
    return Err(ApiError::BadRequest("invalid email address".into()));
  }
  if body.password.chars().count() < 6 {
    return Err(ApiError::BadRequest(
      "password must be at least 6 characters".into(),
    ));
  }
  Ok(())
}

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut rand_core::OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))?
      .to_string(),
  )
}

/// `POST /auth/signup` — returns 201 + the created user (hash omitted).
pub async fn signup<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SignupBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FocusStore,
{
  validate_signup(&body)?;

  let input = NewUser {
    username:      body.username,
    email:         body.email,
    password_hash: hash_password(&body.password)?,
  };

  let user = state
    .store
    .add_user(input)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::Conflict("username or email already taken".into())
    })?;

  tracing::info!(username = %user.username, "account created");
  Ok((StatusCode::CREATED, Json(user)))
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use axum::http::{Request, header};
  use chrono::Utc;
  use koda_core::{
    badge::{Badge, EarnedBadge},
    session::{NewSession, SessionPage, SessionRecord},
    stats::{UserStats, WindowStats},
    user::NewUser,
  };
  use uuid::Uuid;

  // A store that knows exactly one user; everything else is unreachable
  // from the auth path.
  #[derive(Clone)]
  struct OneUserStore(User);

  impl FocusStore for OneUserStore {
    type Error = std::convert::Infallible;

    async fn add_user(&self, _: NewUser) -> Result<Option<User>, Self::Error> {
      unimplemented!()
    }
    async fn find_user(&self, username: &str) -> Result<Option<User>, Self::Error> {
      Ok((username == self.0.username).then(|| self.0.clone()))
    }
    async fn load_stats(&self, _: Uuid) -> Result<Option<UserStats>, Self::Error> {
      unimplemented!()
    }
    async fn append_session(&self, _: NewSession) -> Result<SessionRecord, Self::Error> {
      unimplemented!()
    }
    async fn commit_focus_session(
      &self,
      _: NewSession,
      _: &UserStats,
      _: &[i64],
    ) -> Result<SessionRecord, Self::Error> {
      unimplemented!()
    }
    async fn badge_catalog(&self) -> Result<Vec<Badge>, Self::Error> {
      unimplemented!()
    }
    async fn earned_badge_ids(&self, _: Uuid) -> Result<Vec<i64>, Self::Error> {
      unimplemented!()
    }
    async fn earned_badges(&self, _: Uuid) -> Result<Vec<EarnedBadge>, Self::Error> {
      unimplemented!()
    }
    async fn window_stats(
      &self,
      _: Uuid,
      _: chrono::DateTime<Utc>,
      _: chrono::DateTime<Utc>,
    ) -> Result<WindowStats, Self::Error> {
      unimplemented!()
    }
    async fn session_history(
      &self,
      _: Uuid,
      _: u32,
      _: u32,
    ) -> Result<SessionPage, Self::Error> {
      unimplemented!()
    }
  }

  fn make_state(password: &str) -> AppState<OneUserStore> {
    let user = User {
      user_id:       Uuid::new_v4(),
      username:      "bear".to_string(),
      email:         "bear@example.com".to_string(),
      password_hash: hash_password(password).unwrap(),
      created_at:    Utc::now(),
    };
    AppState::new(Arc::new(OneUserStore(user)))
  }

  async fn extract(
    req: Request<axum::body::Body>,
    state: &AppState<OneUserStore>,
  ) -> Result<CurrentUser, ApiError> {
    let (mut parts, _) = req.into_parts();
    CurrentUser::from_request_parts(&mut parts, state).await
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[tokio::test]
  async fn correct_credentials() {
    let state = make_state("secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("bear", "secret"))
      .body(axum::body::Body::empty())
      .unwrap();
    let current = extract(req, &state).await.unwrap();
    assert_eq!(current.0.username, "bear");
  }

  #[tokio::test]
  async fn wrong_password() {
    let state = make_state("secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("bear", "wrong"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn unknown_username() {
    let state = make_state("secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("wolf", "secret"))
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn missing_header() {
    let state = make_state("secret");
    let req = Request::builder().body(axum::body::Body::empty()).unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[tokio::test]
  async fn invalid_base64() {
    let state = make_state("secret");
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Basic !!!not-base64!!!")
      .body(axum::body::Body::empty())
      .unwrap();
    assert!(matches!(
      extract(req, &state).await,
      Err(ApiError::Unauthorized)
    ));
  }

  #[test]
  fn signup_validation() {
    let ok = SignupBody {
      username: "bear".into(),
      email:    "bear@example.com".into(),
      password: "secret".into(),
    };
    assert!(validate_signup(&ok).is_ok());

    let short_name = SignupBody { username: "ab".into(), ..clone_body(&ok) };
    assert!(validate_signup(&short_name).is_err());

    let bad_email = SignupBody { email: "not-an-email".into(), ..clone_body(&ok) };
    assert!(validate_signup(&bad_email).is_err());

    let short_pass = SignupBody { password: "12345".into(), ..clone_body(&ok) };
    assert!(validate_signup(&short_pass).is_err());
  }

  fn clone_body(b: &SignupBody) -> SignupBody {
    SignupBody {
      username: b.username.clone(),
      email:    b.email.clone(),
      password: b.password.clone(),
    }
  }
}
