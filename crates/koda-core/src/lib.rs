//! Core types and the session accounting engine for Koda.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod badge;
pub mod clock;
pub mod engine;
pub mod error;
pub mod session;
pub mod stats;
pub mod store;
pub mod user;

pub use error::{Error, Result};
