use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of workers kept alive for the whole crawl
pub const DEFAULT_CORE_WORKERS: usize = 100;
/// Default ceiling on workers spawned under load
pub const DEFAULT_MAX_WORKERS: usize = 200;
/// Seconds an extra worker may sit idle before it is reclaimed
pub const DEFAULT_KEEP_ALIVE_SEC: u64 = 5;
/// Default timeout for a single page request in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SEC: u64 = 30;
/// Sent when a user agent is requested without naming one
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// How server certificates are treated on https connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TlsPolicy {
    /// Every certificate is trusted, self-signed and expired ones included.
    /// This is insecure and exists so the crawler can walk through broken TLS setups.
    #[default]
    InsecureAcceptAll,
    /// Standard certificate validation against the system roots
    Verify,
}

/// Configuration for the crawler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    pub core_workers: usize,
    pub max_workers: usize,
    pub keep_alive_sec: u64,
    /// `None` means a request may hang forever
    pub request_timeout_sec: Option<u64>,
    pub tls_policy: TlsPolicy,
    pub user_agent: Option<String>,
    /// Skip URLs that some other task already fetched
    pub track_visited: bool,
}

impl CrawlerConfig {
    pub fn new() -> Self {
        Self {
            core_workers: DEFAULT_CORE_WORKERS,
            max_workers: DEFAULT_MAX_WORKERS,
            keep_alive_sec: DEFAULT_KEEP_ALIVE_SEC,
            request_timeout_sec: Some(DEFAULT_REQUEST_TIMEOUT_SEC),
            tls_policy: TlsPolicy::default(),
            user_agent: None,
            track_visited: false,
        }
    }

    pub fn with_workers(mut self, core_workers: usize, max_workers: usize) -> Self {
        self.core_workers = core_workers;
        self.max_workers = max_workers;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive_sec: u64) -> Self {
        self.keep_alive_sec = keep_alive_sec;
        self
    }

    pub fn with_request_timeout(mut self, timeout_sec: Option<u64>) -> Self {
        self.request_timeout_sec = timeout_sec;
        self
    }

    pub fn with_tls_policy(mut self, policy: TlsPolicy) -> Self {
        self.tls_policy = policy;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_visited_tracking(mut self, enabled: bool) -> Self {
        self.track_visited = enabled;
        self
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_sec)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_sec.map(Duration::from_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub type CrawlerConfigRef = Arc<CrawlerConfig>;
