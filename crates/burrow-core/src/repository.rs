use crate::error::Result;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A shortened link as stored by a repository.
///
/// `id` and `shortened` always carry the same code: the code is both the
/// primary key and the public identifier. Only `visits` changes after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: ShortCode,
    pub original_url: String,
    pub shortened: ShortCode,
    pub created_at: Timestamp,
    pub visits: u64,
}

impl Link {
    /// Creates a fresh link with no visits, stamped with the current time.
    pub fn new(code: ShortCode, original_url: impl Into<String>) -> Self {
        Self {
            id: code.clone(),
            original_url: original_url.into(),
            shortened: code,
            created_at: Timestamp::now(),
            visits: 0,
        }
    }

    /// The short code identifying this link.
    pub fn code(&self) -> &ShortCode {
        &self.id
    }
}

/// Storage contract for links.
///
/// Implementations must be safe to share between request tasks. Records
/// are never updated or deleted except for the visit counter.
#[async_trait]
pub trait LinkRepository: Send + Sync + 'static {
    /// Inserts a new link. Returns `Err(Conflict)` if the code already exists.
    async fn save(&self, link: Link) -> Result<()>;

    /// Retrieves the link for a given short code.
    /// Returns `Err(NotFound)` if the code does not exist.
    async fn get_by_code(&self, code: &ShortCode) -> Result<Link>;

    /// Counts one visit for the given short code.
    ///
    /// Unknown codes are ignored. Implementations that count asynchronously
    /// report success once the visit is accepted, not once it is applied.
    async fn increment_visits(&self, code: &ShortCode) -> Result<()>;
}

#[async_trait]
impl<T: LinkRepository + ?Sized> LinkRepository for Arc<T> {
    async fn save(&self, link: Link) -> Result<()> {
        (**self).save(link).await
    }

    async fn get_by_code(&self, code: &ShortCode) -> Result<Link> {
        (**self).get_by_code(code).await
    }

    async fn increment_visits(&self, code: &ShortCode) -> Result<()> {
        (**self).increment_visits(code).await
    }
}
