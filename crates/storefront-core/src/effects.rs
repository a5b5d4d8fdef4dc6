//! Side-effect seams: wall clock and HTTP.

use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::ACCEPT;
use time::OffsetDateTime;

use crate::acquire::FetchError;

const USER_AGENT: &str = concat!("storefront/", env!("CARGO_PKG_VERSION"));
pub(crate) const CSV_ACCEPT: &str = "text/csv, text/plain, */*";

pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
    }
}

/// Status and body of a completed GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Transport: Send + Sync {
    /// Issue a GET asking for CSV or plain text. Non-2xx statuses are
    /// returned, not turned into errors; only transport failures are.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// # Errors
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, CSV_ACCEPT)
            .send()
            .await
            .map_err(|err| FetchError::transport(url, &err))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| FetchError::transport(url, &err))?;
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_reports_milliseconds() {
        let now = SystemClock.now_ms();
        // 2020-01-01T00:00:00Z
        assert!(now > 1_577_836_800_000);
    }

    #[test]
    fn only_2xx_counts_as_success() {
        let ok = HttpResponse {
            status: 204,
            body: String::new(),
        };
        let moved = HttpResponse {
            status: 301,
            body: String::new(),
        };
        assert!(ok.is_success());
        assert!(!moved.is_success());
    }
}
