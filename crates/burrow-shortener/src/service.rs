use async_trait::async_trait;
use burrow_core::{Link, LinkRepository, ShortCode, Shortener, ShortenerError, StorageError};
use burrow_generator::Generator;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// Attempts made to find an unused code before a conflict is reported.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Tuning for [`ShortenerService`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct ShortenerSettings {
    /// Total number of codes tried when the repository reports a conflict.
    ///
    /// `1` surfaces the first collision as an error; `0` is treated as `1`.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

impl Default for ShortenerSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A concrete implementation of the `Shortener` trait.
///
/// This service wraps a `LinkRepository` and a `Generator` to handle:
/// - URL validation
/// - Short code generation, retrying on collisions
/// - Visit accounting on resolution
///
/// Visits are counted on a detached task so that a slow or saturated
/// repository never delays a redirect.
#[derive(Debug)]
pub struct ShortenerService<R, G> {
    repository: Arc<R>,
    generator: Arc<G>,
    settings: ShortenerSettings,
}

impl<R, G> Clone for ShortenerService<R, G> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            generator: Arc::clone(&self.generator),
            settings: self.settings,
        }
    }
}

impl<R: LinkRepository, G: Generator> ShortenerService<R, G> {
    /// Creates a new `ShortenerService` with default settings.
    pub fn new(repository: R, generator: G) -> Self {
        Self::with_settings(repository, generator, ShortenerSettings::default())
    }

    /// Creates a new `ShortenerService` with explicit settings.
    pub fn with_settings(repository: R, generator: G, settings: ShortenerSettings) -> Self {
        Self {
            repository: Arc::new(repository),
            generator: Arc::new(generator),
            settings,
        }
    }

    /// Rejects blank URLs and URLs that cannot be sent back as a redirect
    /// target.
    fn validate_url(url: &str) -> Result<(), ShortenerError> {
        if url.trim().is_empty() {
            return Err(ShortenerError::EmptyUrl);
        }
        if url.chars().any(char::is_control) {
            return Err(ShortenerError::InvalidUrl(url.to_string()));
        }
        Ok(())
    }

    fn generate_code(&self) -> ShortCode {
        self.generator.generate().into()
    }

    /// Counts a visit in the background. The outcome is only logged.
    fn record_visit(&self, code: ShortCode) {
        let repository = Arc::clone(&self.repository);
        tokio::spawn(async move {
            if let Err(e) = repository.increment_visits(&code).await {
                debug!(code = %code, error = %e, "visit not recorded");
            }
        });
    }
}

#[async_trait]
impl<R: LinkRepository, G: Generator> Shortener for ShortenerService<R, G> {
    async fn create_short_link(&self, original_url: &str) -> Result<Link, ShortenerError> {
        Self::validate_url(original_url)?;

        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let link = Link::new(self.generate_code(), original_url);

            match self.repository.save(link.clone()).await {
                Ok(()) => {
                    debug!(code = %link.id, attempt, "short link created");
                    return Ok(link);
                }
                Err(StorageError::Conflict(code)) if attempt < max_attempts => {
                    warn!(code = %code, attempt, "generated code already taken, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(ShortenerError::Persistence(e)),
            }
        }
    }

    async fn get_original_url(&self, code: &ShortCode) -> Result<String, ShortenerError> {
        trace!(code = %code, "resolving short code");

        let link = self.repository.get_by_code(code).await?;
        self.record_visit(code.clone());

        debug!(code = %code, url = %link.original_url, "resolved short code");
        Ok(link.original_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_generator::{RandomGenerator, SeqGenerator};
    use burrow_storage::InMemoryRepository;
    use std::time::Duration;

    type TestService = ShortenerService<Arc<InMemoryRepository>, RandomGenerator>;

    /// Always yields the same identifier.
    struct FixedGenerator(u64);

    impl Generator for FixedGenerator {
        type Output = u64;

        fn generate(&self) -> Self::Output {
            self.0
        }
    }

    fn test_service() -> (TestService, Arc<InMemoryRepository>) {
        let repo = Arc::new(InMemoryRepository::new());
        let service = ShortenerService::new(Arc::clone(&repo), RandomGenerator::new());
        (service, repo)
    }

    async fn visits_of(repo: &InMemoryRepository, code: &ShortCode) -> u64 {
        repo.get_by_code(code).await.unwrap().visits
    }

    #[tokio::test]
    async fn create_then_resolve_returns_original_url() {
        let (service, _repo) = test_service();

        for url in [
            "https://example.com",
            "https://example.com/a/very/long/path?with=query&and=more#fragment",
            "not even a url",
        ] {
            let link = service.create_short_link(url).await.unwrap();
            let resolved = service.get_original_url(&link.id).await.unwrap();
            assert_eq!(resolved, url);
        }
    }

    #[tokio::test]
    async fn created_link_is_fresh() {
        let (service, repo) = test_service();

        let link = service
            .create_short_link("https://example.com")
            .await
            .unwrap();

        assert_eq!(link.visits, 0);
        assert_eq!(link.id, link.shortened);
        assert!(ShortCode::new(link.id.as_str()).is_ok());
        assert_eq!(repo.get_by_code(&link.id).await.unwrap(), link);
    }

    #[tokio::test]
    async fn empty_url_is_rejected_without_saving() {
        let (service, repo) = test_service();

        for url in ["", "   ", "\t\n"] {
            let err = service.create_short_link(url).await.unwrap_err();
            assert!(matches!(err, ShortenerError::EmptyUrl));
        }

        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn url_with_control_characters_is_rejected_without_saving() {
        let (service, repo) = test_service();

        for url in ["https://example.com/a\nb", "https://example.com/\r", "https://x\u{7f}.io"] {
            let err = service.create_short_link(url).await.unwrap_err();
            assert!(matches!(err, ShortenerError::InvalidUrl(ref u) if u == url));
        }

        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn resolve_nonexistent_code() {
        let (service, _repo) = test_service();

        let err = service
            .get_original_url(&ShortCode::new("nope").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ShortenerError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn resolve_counts_a_visit() {
        let (service, repo) = test_service();
        let link = service
            .create_short_link("https://example.com")
            .await
            .unwrap();

        service.get_original_url(&link.id).await.unwrap();
        service.get_original_url(&link.id).await.unwrap();

        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until_async(|| async { visits_of(&repo, &link.id).await == 2 })
            .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_resolutions_are_all_counted() {
        let (service, repo) = test_service();
        let link = service
            .create_short_link("https://example.com")
            .await
            .unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let service = service.clone();
                let code = link.id.clone();
                tokio::spawn(async move { service.get_original_url(&code).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), "https://example.com");
        }

        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until_async(|| async { visits_of(&repo, &link.id).await == 50 })
            .await;
    }

    #[tokio::test]
    async fn saturated_visit_queue_does_not_fail_resolution() {
        let repo = Arc::new(InMemoryRepository::with_queue_capacity(1));
        let service = ShortenerService::new(Arc::clone(&repo), RandomGenerator::new());
        let link = service
            .create_short_link("https://example.com")
            .await
            .unwrap();

        for _ in 0..20 {
            let url = service.get_original_url(&link.id).await.unwrap();
            assert_eq!(url, "https://example.com");
        }

        // The spawned increments only run once this task yields, so they
        // all race for the single queue slot.
        tokio::time::sleep(Duration::from_millis(50)).await;
        repo.shutdown().await;

        let visits = visits_of(&repo, &link.id).await;
        assert!(visits >= 1, "at least one increment is accepted");
        assert!(visits < 20, "a full queue drops increments, got {visits}");
    }

    #[tokio::test]
    async fn collision_fails_when_retries_are_disabled() {
        let repo = Arc::new(InMemoryRepository::new());
        let taken = ShortCode::from(RandomGenerator::seeded(7).generate());
        repo.save(Link::new(taken.clone(), "https://first.example"))
            .await
            .unwrap();

        let settings = ShortenerSettings::builder().max_attempts(1).build();
        let service =
            ShortenerService::with_settings(Arc::clone(&repo), RandomGenerator::seeded(7), settings);

        let err = service
            .create_short_link("https://second.example")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShortenerError::Persistence(StorageError::Conflict(ref code)) if code == taken.as_str()
        ));

        let kept = repo.get_by_code(&taken).await.unwrap();
        assert_eq!(kept.original_url, "https://first.example");
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn collision_is_retried_with_a_new_code() {
        let repo = Arc::new(InMemoryRepository::new());
        let taken = ShortCode::from(RandomGenerator::seeded(7).generate());
        repo.save(Link::new(taken.clone(), "https://first.example"))
            .await
            .unwrap();

        let service = ShortenerService::new(Arc::clone(&repo), RandomGenerator::seeded(7));

        let link = service
            .create_short_link("https://second.example")
            .await
            .unwrap();
        assert_ne!(link.id, taken);
        assert_eq!(repo.len(), 2);
    }

    #[tokio::test]
    async fn collision_is_surfaced_after_all_attempts() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.save(Link::new(ShortCode::from(999), "https://first.example"))
            .await
            .unwrap();

        let service = ShortenerService::new(Arc::clone(&repo), FixedGenerator(999));

        let err = service
            .create_short_link("https://second.example")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ShortenerError::Persistence(StorageError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn sequential_generator_yields_base62_codes() {
        let service = ShortenerService::new(InMemoryRepository::new(), SeqGenerator::with_offset(61));

        let first = service.create_short_link("https://a.example").await.unwrap();
        let second = service.create_short_link("https://b.example").await.unwrap();

        assert_eq!(first.id.as_str(), "z");
        assert_eq!(second.id.as_str(), "10");
    }
}
