use async_trait::async_trait;
use burrow_core::{Link, LinkRepository, ShortCode, StorageError};
use parking_lot::{Mutex, RwLock};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::Result;

/// Pending increments the visit queue holds before new ones are dropped.
pub const DEFAULT_VISIT_QUEUE_CAPACITY: usize = 100;

type Links = Arc<RwLock<HashMap<ShortCode, Link>>>;

/// In-memory implementation of [`LinkRepository`].
///
/// Links live in a `RwLock<HashMap>`: lookups share the lock, inserts take it
/// exclusively. Visit counting is moved off the request path. Each
/// [`increment_visits`](LinkRepository::increment_visits) call only pushes the
/// code onto a bounded queue; a single background task owned by the
/// repository drains the queue in order and applies the increments under the
/// write lock. When the queue is full the increment is dropped and
/// [`StorageError::QueueSaturated`] is returned, so callers never wait on
/// accounting.
///
/// The worker starts in the constructor and stops once the repository is
/// dropped or [`shutdown`](Self::shutdown) is called; either way, increments
/// already queued are applied before it exits.
#[derive(Debug)]
pub struct InMemoryRepository {
    links: Links,
    visits: RwLock<Option<mpsc::Sender<ShortCode>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    queue_capacity: usize,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository with the default visit queue capacity.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime, since the visit worker is
    /// spawned here.
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_VISIT_QUEUE_CAPACITY)
    }

    /// Creates a new in-memory repository whose visit queue holds at most
    /// `capacity` pending increments (at least one).
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn with_queue_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let links = Links::default();
        let (sender, receiver) = mpsc::channel(capacity);
        let worker = tokio::spawn(run_visit_worker(Arc::clone(&links), receiver));

        Self {
            links,
            visits: RwLock::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            queue_capacity: capacity,
        }
    }

    /// Maximum number of pending visit increments.
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Number of stored links.
    pub fn len(&self) -> usize {
        self.links.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.read().is_empty()
    }

    /// Stops accepting visit increments and waits until every increment
    /// already queued has been applied.
    ///
    /// Links stay readable afterwards. Calling this more than once is a no-op.
    pub async fn shutdown(&self) {
        // The repository holds the only sender; once it is gone the worker
        // sees the end of the queue after draining what is left.
        drop(self.visits.write().take());

        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                warn!(error = %e, "visit worker ended abnormally");
            }
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_visit_worker(links: Links, mut queue: mpsc::Receiver<ShortCode>) {
    debug!("visit worker started");

    while let Some(code) = queue.recv().await {
        let mut guard = links.write();
        match guard.get_mut(&code) {
            Some(link) => {
                link.visits = link.visits.saturating_add(1);
                trace!(code = %code, visits = link.visits, "visit counted");
            }
            None => trace!(code = %code, "dropping visit for unknown code"),
        }
    }

    debug!("visit worker stopped");
}

#[async_trait]
impl LinkRepository for InMemoryRepository {
    async fn save(&self, link: Link) -> Result<()> {
        let mut links = self.links.write();
        match links.entry(link.id.clone()) {
            Entry::Occupied(existing) => Err(StorageError::Conflict(existing.key().to_string())),
            Entry::Vacant(slot) => {
                trace!(code = %link.id, "link saved");
                slot.insert(link);
                Ok(())
            }
        }
    }

    async fn get_by_code(&self, code: &ShortCode) -> Result<Link> {
        self.links
            .read()
            .get(code)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(code.to_string()))
    }

    async fn increment_visits(&self, code: &ShortCode) -> Result<()> {
        let visits = self.visits.read();
        let Some(queue) = visits.as_ref() else {
            return Err(StorageError::Unavailable(
                "visit worker has shut down".to_string(),
            ));
        };

        match queue.try_send(code.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(code)) => {
                warn!(code = %code, "visit queue saturated, dropping increment");
                Err(StorageError::QueueSaturated(code.to_string()))
            }
            Err(TrySendError::Closed(_)) => Err(StorageError::Unavailable(
                "visit worker has stopped".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn code(s: &str) -> ShortCode {
        ShortCode::new_unchecked(s)
    }

    fn link(c: &str, url: &str) -> Link {
        Link::new(code(c), url)
    }

    async fn visits(repo: &InMemoryRepository, c: &str) -> u64 {
        repo.get_by_code(&code(c)).await.unwrap().visits
    }

    #[tokio::test]
    async fn save_and_get() {
        let repo = InMemoryRepository::new();

        repo.save(link("abc123", "https://example.com")).await.unwrap();

        let result = repo.get_by_code(&code("abc123")).await.unwrap();
        assert_eq!(result.original_url, "https://example.com");
        assert_eq!(result.shortened.as_str(), "abc123");
        assert_eq!(result.visits, 0);
    }

    #[tokio::test]
    async fn get_nonexistent() {
        let repo = InMemoryRepository::new();

        let err = repo.get_by_code(&code("nope")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(c) if c == "nope"));
    }

    #[tokio::test]
    async fn save_conflict_keeps_first_record() {
        let repo = InMemoryRepository::new();

        repo.save(link("abc123", "https://example.com")).await.unwrap();

        let err = repo
            .save(link("abc123", "https://other.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        let kept = repo.get_by_code(&code("abc123")).await.unwrap();
        assert_eq!(kept.original_url, "https://example.com");
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn queued_visits_are_applied_on_shutdown() {
        let repo = InMemoryRepository::new();
        repo.save(link("abc123", "https://example.com")).await.unwrap();

        for _ in 0..3 {
            repo.increment_visits(&code("abc123")).await.unwrap();
        }
        repo.shutdown().await;

        assert_eq!(visits(&repo, "abc123").await, 3);
    }

    #[tokio::test]
    async fn visit_for_unknown_code_is_ignored() {
        let repo = InMemoryRepository::new();

        repo.increment_visits(&code("ghost")).await.unwrap();
        repo.shutdown().await;

        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn increment_after_shutdown_is_rejected() {
        let repo = InMemoryRepository::new();
        repo.save(link("abc123", "https://example.com")).await.unwrap();

        repo.shutdown().await;
        repo.shutdown().await;

        let err = repo.increment_visits(&code("abc123")).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
        assert_eq!(visits(&repo, "abc123").await, 0);
    }

    #[tokio::test]
    async fn full_queue_drops_increments() {
        // On the current-thread runtime the worker cannot run until this
        // task yields, so the queue fills deterministically.
        let repo = InMemoryRepository::with_queue_capacity(2);
        repo.save(link("abc123", "https://example.com")).await.unwrap();

        repo.increment_visits(&code("abc123")).await.unwrap();
        repo.increment_visits(&code("abc123")).await.unwrap();
        let err = repo.increment_visits(&code("abc123")).await.unwrap_err();
        assert!(matches!(err, StorageError::QueueSaturated(c) if c == "abc123"));

        repo.shutdown().await;
        assert_eq!(visits(&repo, "abc123").await, 2);
    }

    #[tokio::test]
    async fn zero_capacity_is_raised_to_one() {
        let repo = InMemoryRepository::with_queue_capacity(0);
        assert_eq!(repo.queue_capacity(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_visits_are_eventually_counted() {
        let repo = Arc::new(InMemoryRepository::new());
        repo.save(link("hot", "https://example.com")).await.unwrap();

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.increment_visits(&code("hot")).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        awaitility::at_most(Duration::from_secs(5))
            .poll_interval(Duration::from_millis(10))
            .until_async(|| async { visits(&repo, "hot").await == 50 })
            .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overload_never_overcounts() {
        let repo = Arc::new(InMemoryRepository::with_queue_capacity(4));
        repo.save(link("hot", "https://example.com")).await.unwrap();

        let handles: Vec<_> = (0..200)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.increment_visits(&code("hot")).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => accepted += 1,
                Err(e) => assert!(matches!(e, StorageError::QueueSaturated(_))),
            }
        }
        repo.shutdown().await;

        let counted = visits(&repo, "hot").await;
        assert_eq!(counted, accepted);
        assert!(counted <= 200);
    }

    #[tokio::test]
    async fn concurrent_access() {
        let repo = Arc::new(InMemoryRepository::new());
        let mut handles = vec![];

        for i in 0..10u64 {
            let repo = Arc::clone(&repo);
            let handle = tokio::spawn(async move {
                let l = Link::new(ShortCode::from(i), format!("https://example{}.com", i));
                repo.save(l).await.unwrap();
            });
            handles.push(handle);
        }

        for i in 0..10u64 {
            let repo = Arc::clone(&repo);
            let handle = tokio::spawn(async move {
                let _ = repo.get_by_code(&ShortCode::from(i)).await;
            });
            handles.push(handle);
        }

        for handle in handles {
            handle.await.unwrap();
        }

        for i in 0..10u64 {
            let result = repo.get_by_code(&ShortCode::from(i)).await.unwrap();
            assert_eq!(result.original_url, format!("https://example{}.com", i));
        }
    }
}
