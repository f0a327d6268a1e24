//! Storage backends for Burrow links.
//!
//! [`InMemoryRepository`] keeps links in process memory and counts visits on
//! a background task; [`SqliteRepository`] persists links in SQLite and
//! updates counters in place.

pub mod memory;
pub mod sqlite;

pub use burrow_core::error::Result;
pub use burrow_core::{Link, LinkRepository, StorageError};
pub use memory::InMemoryRepository;
pub use sqlite::{SqliteRepository, SqliteSettings};
