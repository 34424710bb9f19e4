//! Static HTTP fetcher.

mod user_agent;

pub use user_agent::{resolve_user_agent, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT as ACCEPT_HEADER, ACCEPT_LANGUAGE as ACCEPT_LANGUAGE_HEADER,
};
use reqwest::Client;
use tracing::debug;

use super::error::ScrapeError;
use super::fetch::{FetchedPage, PageFetcher};

/// HTTP client that presents itself as a desktop browser.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client with the default user agent and language.
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        Self::with_user_agent(timeout, None, None)
    }

    /// Create a client with custom user agent configuration.
    /// - None: Use the default desktop Chrome user agent
    /// - Some("impersonate"): Use random real browser user agent
    /// - Some(custom): Use custom user agent string
    pub fn with_user_agent(
        timeout: Duration,
        user_agent_config: Option<&str>,
        accept_language: Option<&str>,
    ) -> Result<Self, ScrapeError> {
        let user_agent = resolve_user_agent(user_agent_config);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_HEADER, HeaderValue::from_static(ACCEPT));
        let language = accept_language.unwrap_or(ACCEPT_LANGUAGE);
        headers.insert(
            ACCEPT_LANGUAGE_HEADER,
            HeaderValue::from_str(language)
                .unwrap_or_else(|_| HeaderValue::from_static(ACCEPT_LANGUAGE)),
        );

        let client = Client::builder()
            .user_agent(&user_agent)
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .build()?;

        Ok(Self { client, timeout })
    }

    /// GET `url` and return the body, failing on non-2xx responses.
    pub async fn get_text(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
        debug!("GET {} (timeout {}s)", url, self.timeout.as_secs());
        let start = Instant::now();

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let final_url = response.url().to_string();
        let html = response.text().await?;
        debug!(
            "Fetched {} ({} bytes, {}ms)",
            final_url,
            html.len(),
            start.elapsed().as_millis()
        );

        Ok(FetchedPage { final_url, html })
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError> {
        self.get_text(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_with_custom_language() {
        let client =
            HttpClient::with_user_agent(Duration::from_secs(20), Some("MyBot/1.0"), Some("en-US"));
        assert!(client.is_ok());
    }
}
