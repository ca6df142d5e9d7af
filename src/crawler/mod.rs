pub mod config;
pub mod extract;
pub mod fetch;
pub mod output;
pub mod pool;
pub mod runner;
pub mod state;
pub mod task;


pub use config::{CrawlerConfig, CrawlerConfigRef, TlsPolicy, BROWSER_USER_AGENT};
pub use extract::{LinkExtractor, DEFAULT_LINK_GROUP, DEFAULT_LINK_PATTERN};
pub use fetch::{FetchError, FetchResult, Fetcher};
pub use output::{MemorySink, PageReport, ReportSink, StdoutSink};
pub use pool::{PoolConfig, Task, WorkerPool};
pub use runner::{crawl, CrawlController, CrawlError, CrawlHandle};
pub use state::{CrawlerState, CrawlerStateRef};
pub use task::{CrawlContext, CrawlContextRef, CrawlTask, TaskOutcome};
