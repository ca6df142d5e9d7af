use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

/// Shared bookkeeping of a running crawl. Tasks only ever bump counters here;
/// depth itself travels inside each task.
#[derive(Debug, Default)]
pub struct CrawlerState {
    /// Tasks that went out to the network
    pub pages_fetched: AtomicUsize,
    /// Tasks dropped because they sat below the depth ceiling
    pub depth_cutoffs: AtomicUsize,
    /// Fetches that produced no body
    pub failed_fetches: AtomicUsize,
    /// Child tasks handed to the pool
    pub links_dispatched: AtomicUsize,
    /// Deepest depth at which a page was fetched
    pub deepest_fetch: AtomicUsize,
    /// Present only when cross-page deduplication was asked for
    visited_urls: Option<Mutex<HashSet<String>>>,
}

impl CrawlerState {
    pub fn new(track_visited: bool) -> Self {
        Self {
            visited_urls: track_visited.then(|| Mutex::new(HashSet::new())),
            ..Self::default()
        }
    }

    /// Claims `url` for fetching. Always true unless visited tracking is on
    /// and another task got there first.
    pub async fn claim(&self, url: &str) -> bool {
        match &self.visited_urls {
            Some(visited) => visited.lock().await.insert(url.to_string()),
            None => true,
        }
    }

    pub fn record_fetch(&self, depth: usize, succeeded: bool) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        self.deepest_fetch.fetch_max(depth, Ordering::Relaxed);
        if !succeeded {
            self.failed_fetches.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched.load(Ordering::Relaxed)
    }

    pub fn depth_cutoffs(&self) -> usize {
        self.depth_cutoffs.load(Ordering::Relaxed)
    }

    pub fn failed_fetches(&self) -> usize {
        self.failed_fetches.load(Ordering::Relaxed)
    }

    pub fn links_dispatched(&self) -> usize {
        self.links_dispatched.load(Ordering::Relaxed)
    }

    pub fn deepest_fetch(&self) -> usize {
        self.deepest_fetch.load(Ordering::Relaxed)
    }
}

pub type CrawlerStateRef = Arc<CrawlerState>;
