use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use log2::{debug, info};
use url::Url;

use super::extract::LinkExtractor;
use super::fetch::{FetchResult, Fetcher};
use super::output::{PageReport, ReportSink};
use super::pool::{Task, WorkerPool};
use super::state::CrawlerStateRef;

/// Collaborators shared by every task of one crawl
pub struct CrawlContext {
    pub fetcher: Fetcher,
    pub extractor: LinkExtractor,
    pub sink: Arc<dyn ReportSink>,
    pub state: CrawlerStateRef,
}

pub type CrawlContextRef = Arc<CrawlContext>;

/// How a task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Depth exceeded the ceiling, nothing was fetched or printed
    BeyondMaxDepth,
    /// Visited tracking is on and another task already took this url
    AlreadyVisited,
    /// The fetch produced no body, only the url was reported
    Failed,
    Completed { children: usize },
}

/// Fetch one url, report its links and hand one child task per link to the pool.
/// Depth is fixed at construction and children are always one level deeper.
pub struct CrawlTask {
    url: Url,
    raw: String,
    depth: usize,
    max_depth: Option<usize>,
    context: CrawlContextRef,
}

impl CrawlTask {
    /// The seed task at depth 0
    pub fn root(seed: &str, max_depth: Option<usize>, context: CrawlContextRef) -> Result<Self, url::ParseError> {
        Self::at_depth(seed, 0, max_depth, context)
    }

    pub fn at_depth(
        url: &str,
        depth: usize,
        max_depth: Option<usize>,
        context: CrawlContextRef,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(url)?,
            raw: url.to_string(),
            depth,
            max_depth,
            context,
        })
    }

    fn child(&self, link: &str) -> Result<Self, url::ParseError> {
        Self::at_depth(link, self.depth + 1, self.max_depth, Arc::clone(&self.context))
    }

    pub fn url(&self) -> &str {
        &self.raw
    }

    pub fn is_http(&self) -> bool {
        matches!(self.url.scheme(), "http" | "https")
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Without a ceiling every depth is allowed, otherwise it is inclusive.
    pub fn within_depth(&self) -> bool {
        self.max_depth.is_none_or(|max| self.depth <= max)
    }

    pub async fn execute(self, pool: &WorkerPool<CrawlTask>) -> TaskOutcome {
        let state = &self.context.state;

        if !self.within_depth() {
            debug!("Depth {} of {} is beyond {:?}, skipping", self.depth, self.raw, self.max_depth);
            state.depth_cutoffs.fetch_add(1, Ordering::Relaxed);
            return TaskOutcome::BeyondMaxDepth;
        }

        if !state.claim(&self.raw).await {
            debug!("{} was already crawled", self.raw);
            return TaskOutcome::AlreadyVisited;
        }

        info!("Crawling {} at depth {}", self.raw, self.depth);
        let fetched = self.context.fetcher.try_fetch(&self.url).await;
        if let Err(e) = &fetched {
            self.context.sink.diagnostic(&e.to_string());
        }
        let page = FetchResult::from(fetched);
        state.record_fetch(self.depth, page.succeeded);

        let links = self.context.extractor.extract(page.body.as_deref());

        let mut children = 0;
        for link in &links {
            match self.child(link) {
                Ok(child) => {
                    pool.submit(child);
                    children += 1;
                }
                Err(e) => self.context.sink.diagnostic(&format!("Malformed url {}: {}", link, e)),
            }
        }
        state.links_dispatched.fetch_add(children, Ordering::Relaxed);
        debug!("{} dispatched {} children", self.raw, children);

        self.context.sink.page(&PageReport { url: self.raw, depth: self.depth, links });

        if page.succeeded {
            TaskOutcome::Completed { children }
        } else {
            TaskOutcome::Failed
        }
    }
}

impl Task for CrawlTask {
    fn run(self, pool: WorkerPool<Self>) -> impl Future<Output = ()> + Send + 'static {
        async move {
            let url = self.raw.clone();
            let outcome = self.execute(&pool).await;
            debug!("Task for {} ended: {:?}", url, outcome);
        }
    }
}

impl fmt::Debug for CrawlTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlTask")
            .field("url", &self.raw)
            .field("depth", &self.depth)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}
