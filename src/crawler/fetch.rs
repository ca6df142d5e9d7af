use std::error::Error as StdError;

use log2::debug;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use super::config::{CrawlerConfig, TlsPolicy};

/// Everything that can go wrong while retrieving one page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("could not build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("connection to {url} failed: {source}")]
    ConnectionFailure {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("protocol error talking to {url}: {source}")]
    ProtocolViolation {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    UnacceptableStatus { url: String, status: StatusCode },
    #[error("certificate of {url} was rejected: {source}")]
    CertificateVerification {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} timed out")]
    Timeout { url: String },
}

/// Outcome of one fetch as seen by a crawl task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    pub body: Option<String>,
    pub succeeded: bool,
}

impl FetchResult {
    pub fn failed() -> Self {
        Self { body: None, succeeded: false }
    }
}

impl From<Result<String, FetchError>> for FetchResult {
    fn from(result: Result<String, FetchError>) -> Self {
        match result {
            Ok(body) => Self { body: Some(body), succeeded: true },
            Err(_) => Self::failed(),
        }
    }
}

/// Only these statuses carry a page worth reading.
pub fn is_acceptable(status: StatusCode) -> bool {
    matches!(status, StatusCode::OK | StatusCode::ACCEPTED)
}

/// Issues single GET requests over HTTP/1.1. Connections are never kept around for reuse.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(config: &CrawlerConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder().http1_only().pool_max_idle_per_host(0);

        if config.tls_policy == TlsPolicy::InsecureAcceptAll {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        let client = builder.build().map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Fetch `url`, folding every failure into an absent body.
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        self.try_fetch(url).await.into()
    }

    /// Fetch `url` and return the body of a 200/202 response as text.
    pub async fn try_fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        debug!("GET {} -> {}", url, status);
        if !is_acceptable(status) {
            // dropping the response tears the connection down
            return Err(FetchError::UnacceptableStatus { url: url.to_string(), status });
        }

        response.text().await.map_err(|e| classify(url, e))
    }
}

fn classify(url: &Url, source: reqwest::Error) -> FetchError {
    let url = url.to_string();
    if source.is_timeout() {
        FetchError::Timeout { url }
    } else if mentions_certificate(&source) {
        FetchError::CertificateVerification { url, source }
    } else if source.is_connect() || source.is_request() || source.is_body() {
        FetchError::ConnectionFailure { url, source }
    } else {
        FetchError::ProtocolViolation { url, source }
    }
}

fn mentions_certificate(error: &reqwest::Error) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(error);
    while let Some(err) = current {
        let text = err.to_string().to_lowercase();
        if text.contains("certificate") {
            return true;
        }
        current = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ok_and_accepted_are_acceptable() {
        assert!(is_acceptable(StatusCode::OK));
        assert!(is_acceptable(StatusCode::ACCEPTED));
        assert!(!is_acceptable(StatusCode::NO_CONTENT));
        assert!(!is_acceptable(StatusCode::NOT_FOUND));
        assert!(!is_acceptable(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn failed_results_have_no_body() {
        let result: FetchResult = Err(FetchError::Timeout { url: "http://a".into() }).into();
        assert_eq!(result, FetchResult::failed());
        assert!(result.body.is_none());
    }

    #[test]
    fn both_tls_policies_build_a_client() {
        assert!(Fetcher::new(&CrawlerConfig::new()).is_ok());
        assert!(Fetcher::new(&CrawlerConfig::new().with_tls_policy(TlsPolicy::Verify)).is_ok());
    }
}
