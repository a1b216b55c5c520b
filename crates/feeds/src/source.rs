//! Product page sources.
//!
//! `HttpPageSource` performs one GET per poll cycle against the configured
//! listing page. `MockPageSource` replays scripted responses for tests.

use crate::error::FetchError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// User agent sent with page requests. Some retailers reject the reqwest default.
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Default page fetch timeout.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

/// Source of raw page content for a poll cycle.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page body.
    async fn fetch(&self) -> Result<String, FetchError>;

    /// URL the page is fetched from (used in messages and logs).
    fn url(&self) -> &str;
}

/// Fetches the listing page over HTTP.
pub struct HttpPageSource {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl HttpPageSource {
    /// Create a source with the default user agent and timeout.
    pub fn new(url: Url) -> Result<Self, FetchError> {
        Self::with_timeout(url, FETCH_TIMEOUT)
    }

    pub fn with_timeout(url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    fn map_error(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: self.url.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        debug!(url = %self.url, bytes = body.len(), "Fetched page");
        Ok(body)
    }

    fn url(&self) -> &str {
        self.url.as_str()
    }
}

/// Scripted page source for testing.
///
/// Each fetch pops the next queued response; once the queue is drained the
/// last response is repeated.
pub struct MockPageSource {
    url: String,
    responses: Mutex<VecDeque<Result<String, String>>>,
    last: Mutex<Option<Result<String, String>>>,
}

impl MockPageSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            responses: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
        }
    }

    /// Queue a successful page body.
    pub fn push_page(&self, body: impl Into<String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Ok(body.into()));
        }
    }

    /// Queue a request failure.
    pub fn push_failure(&self, reason: impl Into<String>) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(Err(reason.into()));
        }
    }
}

#[async_trait]
impl PageSource for MockPageSource {
    async fn fetch(&self) -> Result<String, FetchError> {
        let next = self
            .responses
            .lock()
            .map_err(|_| FetchError::Request("mock source poisoned".into()))?
            .pop_front();
        let mut last = self
            .last
            .lock()
            .map_err(|_| FetchError::Request("mock source poisoned".into()))?;

        if let Some(response) = next {
            *last = Some(response);
        }

        match last.as_ref() {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(reason)) => Err(FetchError::Request(reason.clone())),
            None => Err(FetchError::Request("no scripted response".into())),
        }
    }

    fn url(&self) -> &str {
        &self.url
    }
}
