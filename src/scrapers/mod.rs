//! Page fetching and per-site scrapers.
//!
//! Fetching sits behind the [`FetchPage`] trait so scrapers can be exercised
//! against canned HTML in tests. The only production implementation is
//! [`HttpFetcher`], a thin `reqwest` client that identifies itself with a
//! custom `User-Agent`.
//!
//! # Supported Sources
//!
//! | Source | Module | Notes |
//! |--------|--------|-------|
//! | The Daily Pennsylvanian | [`dp`] | Home page sections or multimedia page |
//!
//! Fetch errors are returned, never retried: a failed run simply records no
//! data point.

pub mod dp;

use reqwest::Client;
use std::error::Error;
use std::time::{Duration, Instant};
use tracing::{info, instrument, warn};

/// Trait for retrieving a page body.
pub trait FetchPage {
    /// Fetch `url` and return the body text of a successful response.
    ///
    /// Network errors and non-success statuses are both errors.
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>>;
}

/// HTTP GET with a fixed `User-Agent` and request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl FetchPage for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let resp = self.client.get(url).send().await?;

        info!(request_url = %resp.url(), "Request URL");
        info!(status = resp.status().as_u16(), "Request status code");

        let resp = match resp.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!(elapsed_ms = t0.elapsed().as_millis() as u64, error = %e, "Request failed");
                return Err(e.into());
            }
        };
        let body = resp.text().await?;
        info!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}
