use std::sync::Arc;

use log2::{debug, info};
use thiserror::Error;

use super::config::CrawlerConfigRef;
use super::extract::LinkExtractor;
use super::fetch::{FetchError, Fetcher};
use super::output::ReportSink;
use super::pool::{PoolConfig, WorkerPool};
use super::state::{CrawlerState, CrawlerStateRef};
use super::task::{CrawlContext, CrawlTask};

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("The given seed url is malformed: {url}: {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("The given seed url has an unsupported protocol: {url}")]
    UnsupportedScheme { url: String },
    #[error(transparent)]
    Fetcher(#[from] FetchError),
    #[error("invalid crawler configuration: {0}")]
    InvalidConfig(String),
}

/// Entry point of a crawl: builds the pool and seeds it with the root task.
pub struct CrawlController {
    config: CrawlerConfigRef,
    sink: Arc<dyn ReportSink>,
    extractor: LinkExtractor,
}

impl CrawlController {
    pub fn new(config: CrawlerConfigRef, sink: Arc<dyn ReportSink>) -> Self {
        Self { config, sink, extractor: LinkExtractor::default() }
    }

    pub fn with_extractor(mut self, extractor: LinkExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Submits the root task and returns right away. A malformed seed, or one
    /// that is not http(s), is reported to the sink and no task runs.
    ///
    /// Must be called inside a tokio runtime. Dropping the runtime cancels the
    /// crawl, so callers that outlive it use [`CrawlHandle::wait`].
    pub fn start(&self, seed: &str, max_depth: Option<usize>) -> Result<CrawlHandle, CrawlError> {
        if self.config.core_workers == 0 || self.config.max_workers < self.config.core_workers {
            return Err(CrawlError::InvalidConfig(format!(
                "need 1 <= core workers ({}) <= max workers ({})",
                self.config.core_workers, self.config.max_workers
            )));
        }

        let state: CrawlerStateRef = Arc::new(CrawlerState::new(self.config.track_visited));
        let context = Arc::new(CrawlContext {
            fetcher: Fetcher::new(&self.config)?,
            extractor: self.extractor.clone(),
            sink: Arc::clone(&self.sink),
            state: Arc::clone(&state),
        });

        let root = match CrawlTask::root(seed, max_depth, context) {
            Ok(root) if root.is_http() => root,
            Ok(_) => return Err(self.reject(CrawlError::UnsupportedScheme { url: seed.to_string() })),
            Err(source) => return Err(self.reject(CrawlError::MalformedUrl { url: seed.to_string(), source })),
        };

        let pool = WorkerPool::new(PoolConfig {
            core_workers: self.config.core_workers,
            max_workers: self.config.max_workers,
            keep_alive: self.config.keep_alive(),
        });
        info!("Starting crawl at {} with max depth {:?}", seed, max_depth);
        pool.submit(root);

        Ok(CrawlHandle { pool, state })
    }

    fn reject(&self, error: CrawlError) -> CrawlError {
        self.sink.diagnostic(&error.to_string());
        error
    }
}

/// A crawl in flight
pub struct CrawlHandle {
    pool: WorkerPool<CrawlTask>,
    state: CrawlerStateRef,
}

impl CrawlHandle {
    pub fn state(&self) -> &CrawlerStateRef {
        &self.state
    }

    pub fn pool(&self) -> &WorkerPool<CrawlTask> {
        &self.pool
    }

    /// Resolves once no task is queued or running.
    pub async fn wait_idle(&self) {
        self.pool.wait_idle().await;
    }

    /// Drains the crawl, then releases the workers.
    pub async fn wait(self) -> CrawlerStateRef {
        self.pool.wait_idle().await;
        self.pool.shutdown();
        debug!(
            "Crawl drained: {} pages fetched, {} cut off by depth",
            self.state.pages_fetched(),
            self.state.depth_cutoffs()
        );
        self.state
    }
}

/// Runs a whole crawl to completion.
pub async fn crawl(
    config: CrawlerConfigRef,
    sink: Arc<dyn ReportSink>,
    seed: &str,
    max_depth: Option<usize>,
) -> Result<CrawlerStateRef, CrawlError> {
    let handle = CrawlController::new(config, sink).start(seed, max_depth)?;
    Ok(handle.wait().await)
}
