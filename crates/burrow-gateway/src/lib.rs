//! HTTP front end for the Burrow shortener.
//!
//! `POST /api/v1/shorten` creates a short link and `GET /{code}` redirects to
//! the original URL. The router is built by [`App::router`] around any
//! [`Shortener`](burrow_core::Shortener) implementation.

pub mod app;
pub mod error;
pub mod handlers;
pub mod model;
pub mod state;

pub use app::App;
pub use error::AppError;
pub use state::AppState;
