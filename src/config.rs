use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::crawler::config::{
    CrawlerConfig, DEFAULT_CORE_WORKERS, DEFAULT_KEEP_ALIVE_SEC, DEFAULT_MAX_WORKERS, DEFAULT_REQUEST_TIMEOUT_SEC,
};
use crate::crawler::{BROWSER_USER_AGENT, TlsPolicy};

pub const DEFAULT_LOG_FILE: &str = "webcrawler.log";

/// Log levels as defined in log2 crate
#[derive(Debug, Serialize, Deserialize, Clone, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Everything the command line can say. `CrawlerConfig` is derived from it and
/// only describes the crawler itself.
#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(author, version, about = "Recursively crawls the web from a seed url", long_about = None)]
pub struct Config {
    /// Url the crawl starts from
    pub seed: String,
    /// The max depth to search (inclusive), unbounded when omitted
    #[arg(short = 'n', long)]
    pub max_depth: Option<usize>,
    /// Workers kept alive for the whole crawl
    #[arg(long, default_value_t = DEFAULT_CORE_WORKERS)]
    pub core_workers: usize,
    /// Upper bound on concurrent workers
    #[arg(long, default_value_t = DEFAULT_MAX_WORKERS)]
    pub max_workers: usize,
    /// Seconds an extra worker stays idle before it is reclaimed
    #[arg(long, default_value_t = DEFAULT_KEEP_ALIVE_SEC)]
    pub keep_alive: u64,
    /// Per request timeout in seconds, 0 waits forever
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_SEC)]
    pub timeout: u64,
    /// Validate server certificates instead of trusting all of them
    #[arg(long)]
    pub verify_tls: bool,
    /// Send a User-Agent header, a browser-like one when no value is given
    #[arg(long, num_args = 0..=1, default_missing_value = BROWSER_USER_AGENT)]
    pub user_agent: Option<String>,
    /// Never fetch the same url twice during one crawl
    #[arg(long)]
    pub track_visited: bool,
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", value_enum)]
    pub log_level: LogLevel,
    /// File receiving log output, kept apart from the crawl report on stdout
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
    /// Log to stdout, interleaved with the crawl report, instead of the log file
    #[arg(long, conflicts_with = "log_file")]
    pub log_stdout: bool,
}

impl Config {
    pub fn new() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.core_workers == 0 {
            anyhow::bail!("core_workers must be greater than 0");
        }
        if self.max_workers < self.core_workers {
            anyhow::bail!("max_workers must be at least core_workers");
        }
        Ok(())
    }

    /// Where log2 writes, `None` meaning stdout
    pub fn log_target(&self) -> Option<&Path> {
        (!self.log_stdout).then_some(self.log_file.as_path())
    }

    pub fn crawler_config(&self) -> CrawlerConfig {
        let tls_policy = if self.verify_tls { TlsPolicy::Verify } else { TlsPolicy::InsecureAcceptAll };
        let mut config = CrawlerConfig::new()
            .with_workers(self.core_workers, self.max_workers)
            .with_keep_alive(self.keep_alive)
            .with_request_timeout((self.timeout > 0).then_some(self.timeout))
            .with_tls_policy(tls_policy)
            .with_visited_tracking(self.track_visited);
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        config
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}
