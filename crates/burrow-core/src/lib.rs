//! Core types and traits for the Burrow URL shortener.
//!
//! This crate provides the link record, the short code type and its base62
//! encoding, and the repository and shortener traits shared by the storage
//! backends, the service and the HTTP gateway.

pub mod base62;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use error::{CoreError, DecodeError, ShortenerError, StorageError};
pub use repository::{Link, LinkRepository};
pub use shortcode::ShortCode;
pub use shortener::Shortener;
