//! URL shortener service implementation.
//!
//! This crate provides [`ShortenerService`], which turns URLs into stored
//! links and resolves codes back while counting visits. Core types are
//! re-exported from `burrow_core`.

pub mod service;

pub use burrow_core::{Link, ShortCode, Shortener, ShortenerError};
pub use service::{ShortenerService, ShortenerSettings, DEFAULT_MAX_ATTEMPTS};
