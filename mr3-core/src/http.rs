//! Page fetching for the wiki scraper.

use crate::config::ScraperConfig;
use crate::error::Result;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// Something that can return the HTML of a page by URL.
pub trait PageSource {
    /// Fetch a page body. `Ok(None)` means the page does not exist.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Option<String>>>;
}

/// HTTP client for the fandom wiki.
pub struct WikiClient {
    client: reqwest::Client,
}

impl WikiClient {
    pub fn new(config: &ScraperConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl PageSource for WikiClient {
    async fn fetch(&self, url: &str) -> Result<Option<String>> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("404 for {}", url);
            return Ok(None);
        }

        let body = response.error_for_status()?.text().await?;
        Ok(Some(body))
    }
}
