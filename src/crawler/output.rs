use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log2::debug;

/// What one finished task has to say: its url and the links found on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub url: String,
    pub depth: usize,
    pub links: Vec<String>,
}

impl fmt::Display for PageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.url)?;
        for link in &self.links {
            writeln!(f, "\t{}", link)?;
        }
        Ok(())
    }
}

/// Destination for crawl output. Each call must land as one uninterrupted block.
pub trait ReportSink: Send + Sync {
    fn page(&self, report: &PageReport);
    fn diagnostic(&self, message: &str);
}

/// Pages go to stdout, diagnostics to stderr.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl ReportSink for StdoutSink {
    fn page(&self, report: &PageReport) {
        // rendering first keeps the stdout lock down to a single write
        let block = report.to_string();
        let mut out = io::stdout().lock();
        if let Err(e) = out.write_all(block.as_bytes()).and_then(|_| out.flush()) {
            debug!("Dropped output block for {}: {}", report.url, e);
        }
    }

    fn diagnostic(&self, message: &str) {
        let mut err = io::stderr().lock();
        let _ = writeln!(err, "{}", message);
    }
}

/// Keeps everything in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pages: Mutex<Vec<PageReport>>,
    diagnostics: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pages(&self) -> Vec<PageReport> {
        lock(&self.pages).clone()
    }

    pub fn diagnostics(&self) -> Vec<String> {
        lock(&self.diagnostics).clone()
    }

    /// Every report emitted for `url`, in emission order
    pub fn pages_for(&self, url: &str) -> Vec<PageReport> {
        lock(&self.pages).iter().filter(|p| p.url == url).cloned().collect()
    }

    /// All blocks concatenated the way `StdoutSink` would print them
    pub fn rendered(&self) -> String {
        lock(&self.pages).iter().map(ToString::to_string).collect()
    }
}

impl ReportSink for MemorySink {
    fn page(&self, report: &PageReport) {
        lock(&self.pages).push(report.clone());
    }

    fn diagnostic(&self, message: &str) {
        lock(&self.diagnostics).push(message.to_string());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_lists_url_then_tab_indented_links() {
        let report = PageReport {
            url: "http://a.example.com".into(),
            depth: 0,
            links: vec!["http://x.com/a".into(), "http://y.com".into()],
        };
        assert_eq!(report.to_string(), "http://a.example.com\n\thttp://x.com/a\n\thttp://y.com\n");
    }

    #[test]
    fn page_without_links_is_a_single_line() {
        let report = PageReport { url: "http://dead.example.com".into(), depth: 2, links: vec![] };
        assert_eq!(report.to_string(), "http://dead.example.com\n");
    }

    #[test]
    fn memory_sink_keeps_pages_and_diagnostics_apart() {
        let sink = MemorySink::new();
        sink.page(&PageReport { url: "http://a".into(), depth: 0, links: vec![] });
        sink.diagnostic("boom");
        assert_eq!(sink.pages().len(), 1);
        assert_eq!(sink.pages_for("http://a").len(), 1);
        assert_eq!(sink.diagnostics(), vec!["boom".to_string()]);
        assert_eq!(sink.rendered(), "http://a\n");
    }
}
