use log2::*;
use anyhow::Result;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use webcrawler::config;
use webcrawler::crawler::{CrawlController, CrawlError, StdoutSink};

/// Indicates start time of a project, lazily initialized
pub static START_TIME: once_cell::sync::Lazy<Instant> = once_cell::sync::Lazy::new(Instant::now);

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let _ = *START_TIME;
    let cfg = config::Config::new();
    cfg.validate()?;
    // stdout carries the crawl report, so logs only join it when asked to
    let logger = match cfg.log_target() {
        Some(path) => open(&path.to_string_lossy()),
        None => stdout(),
    };
    let _log2 = logger
        .module(true) // include module name
        .module_with_line(true) // include line number from module
        .module_filter(|module| module.starts_with("webcrawler")) // include only modules having this pattern
        .compress(false) // compress output
        .level(cfg.log_level.to_string()) // level of logging (trace -
        .start();

    let crawler_config = Arc::new(cfg.crawler_config());
    let controller = CrawlController::new(crawler_config, Arc::new(StdoutSink));

    // start() itself does not wait; the runtime would cancel the workers on return
    let handle = match controller.start(&cfg.seed, cfg.max_depth) {
        Ok(handle) => handle,
        // already reported on stderr by the sink
        Err(CrawlError::MalformedUrl { .. } | CrawlError::UnsupportedScheme { .. }) => return Ok(ExitCode::from(2)),
        Err(e) => return Err(e.into()),
    };

    let state = handle.wait().await;
    info!(
        "Crawl finished in {:?}: {} pages fetched, {} failed, {} cut off by depth",
        START_TIME.elapsed(),
        state.pages_fetched(),
        state.failed_fetches(),
        state.depth_cutoffs()
    );
    Ok(ExitCode::SUCCESS)
}
