use crate::repository::Link;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Creates a short link for `original_url` and returns the stored record.
    async fn create_short_link(&self, original_url: &str) -> Result<Link>;

    /// Resolves a short code to the URL it points to, counting a visit.
    ///
    /// Visit accounting is best effort and never fails the resolution.
    async fn get_original_url(&self, code: &ShortCode) -> Result<String>;
}
