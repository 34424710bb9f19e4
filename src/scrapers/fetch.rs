//! Collaborator seams between extractors and the network.
//!
//! Extractors only see these traits, so tests drive them with canned pages.

use async_trait::async_trait;

use super::config::PriceProbeConfig;
use super::error::ScrapeError;

/// A fetched HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// URL after redirects.
    pub final_url: String,
    pub html: String,
}

/// Prices read directly from the rendered DOM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbedPrices {
    pub list: Option<u64>,
    pub sale: Option<u64>,
}

/// How a rendered fetch should behave.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions<'a> {
    /// Post-load settle delay in milliseconds.
    pub settle_ms: u64,
    /// Navigation timeout in seconds.
    pub navigation_timeout: u64,
    /// Price probes to run before the page is closed.
    pub probe: Option<&'a PriceProbeConfig>,
}

/// Output of a rendered fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedPage {
    pub final_url: String,
    pub html: String,
    pub probed: ProbedPrices,
}

/// Plain HTTP GET.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapeError>;
}

/// Headless browser render. Every call owns its browser session and releases
/// it before returning, whatever the outcome.
#[async_trait]
pub trait RenderedFetcher: Send + Sync {
    async fn render(&self, url: &str, options: RenderOptions<'_>)
        -> Result<RenderedPage, ScrapeError>;
}
