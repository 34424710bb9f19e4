//! Fetching and per-store extraction.
//!
//! - `http_client`: static GET with browser-like headers
//! - `browser`: headless Chromium render and DOM price probes
//! - `sites`: one extractor per store plus the tiered runner
//! - `router`: URL to record dispatch

pub mod browser;
pub mod config;
mod error;
pub mod fetch;
mod http_client;
pub mod router;
pub mod sites;

pub use browser::{BrowserEngineConfig, BrowserFetcher};
pub use config::{
    PricePolicy, PriceProbeConfig, PriceWindow, SiteStrategy, SiteStrategyOverride,
    SoldOutPricing, StrategyTier,
};
pub use error::ScrapeError;
pub use fetch::{FetchedPage, PageFetcher, ProbedPrices, RenderOptions, RenderedFetcher, RenderedPage};
pub use http_client::{resolve_user_agent, HttpClient, ACCEPT_LANGUAGE, USER_AGENT};
pub use router::Router;
