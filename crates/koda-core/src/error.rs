//! Error types for `koda-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::session::{MAX_SESSION_MINUTES, MIN_SESSION_MINUTES};

#[derive(Debug, Error)]
pub enum Error {
  /// Rejected before any mutation; safe to retry with a corrected duration.
  #[error(
    "session duration out of range: {0} minutes (allowed \
     {MIN_SESSION_MINUTES}..={MAX_SESSION_MINUTES})"
  )]
  DurationOutOfRange(u32),

  #[error("user not found: {0}")]
  UserNotFound(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a storage backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
