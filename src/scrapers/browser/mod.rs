//! Headless Chromium fetcher.
//!
//! Uses chromiumoxide (CDP). Each render launches its own browser and tears
//! it down before returning, so a crashed or hung page never leaks into the
//! next URL.

mod config;
#[cfg(feature = "browser")]
mod fetch;
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
mod probe;
#[cfg(feature = "browser")]
mod stealth;

pub use config::BrowserEngineConfig;
pub use probe::pick_probe_price;

use async_trait::async_trait;

use super::error::ScrapeError;
use super::fetch::{RenderOptions, RenderedFetcher, RenderedPage};
use super::http_client::{ACCEPT_LANGUAGE, USER_AGENT};

#[cfg(feature = "browser")]
use std::path::PathBuf;

#[cfg(feature = "browser")]
use anyhow::{Context, Result};
#[cfg(feature = "browser")]
use chromiumoxide::{Browser, BrowserConfig};
#[cfg(feature = "browser")]
use futures::StreamExt;
#[cfg(feature = "browser")]
use tokio::task::JoinHandle;
#[cfg(feature = "browser")]
use tracing::{debug, info};

/// Browser-based fetcher with stealth capabilities.
#[cfg_attr(not(feature = "browser"), allow(dead_code))]
pub struct BrowserFetcher {
    pub(crate) config: BrowserEngineConfig,
    pub(crate) user_agent: String,
    pub(crate) accept_language: String,
}

impl BrowserFetcher {
    /// Create a new browser fetcher.
    pub fn new(config: BrowserEngineConfig) -> Self {
        Self {
            config,
            user_agent: USER_AGENT.to_string(),
            accept_language: ACCEPT_LANGUAGE.to_string(),
        }
    }

    /// Present the same identity as the static client.
    pub fn with_identity(mut self, user_agent: &str, accept_language: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self.accept_language = accept_language.to_string();
        self
    }
}

#[cfg(feature = "browser")]
impl BrowserFetcher {
    /// Common Chrome executable paths to check.
    const CHROME_PATHS: &'static [&'static str] = &[
        // Linux
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        // macOS
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
        // Windows
        r"C:\Program Files\Google\Chrome\Application\chrome.exe",
        r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    ];

    /// Find Chrome executable.
    fn find_chrome(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.config.chrome_executable {
            return Ok(path.clone());
        }

        for path in Self::CHROME_PATHS {
            let p = std::path::Path::new(path);
            if p.exists() {
                debug!("Found Chrome at: {}", path);
                return Ok(p.to_path_buf());
            }
        }

        for cmd in &[
            "google-chrome",
            "google-chrome-stable",
            "chromium",
            "chromium-browser",
            "chrome",
        ] {
            if let Ok(path) = which::which(cmd) {
                debug!("Found Chrome in PATH: {}", path.display());
                return Ok(path);
            }
        }

        Err(anyhow::anyhow!(
            "Chrome/Chromium not found. Install it or set browser.chrome_executable:\n\
             - Ubuntu/Debian: sudo apt install chromium-browser\n\
             - Fedora: sudo dnf install chromium\n\
             - Or download from: https://www.google.com/chrome/"
        ))
    }

    /// Launch a fresh browser and spawn its CDP handler.
    async fn launch(&self) -> Result<(Browser, JoinHandle<()>)> {
        info!("Launching browser (headless={})", self.config.headless);

        let chrome_path = self.find_chrome()?;
        let mut builder = BrowserConfig::builder().chrome_executable(chrome_path);

        // with_head means NOT headless
        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(ref proxy) = self.config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }

        builder = builder
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-background-networking")
            .arg("--disable-sync")
            .arg("--disable-translate")
            .arg("--lang=ko-KR")
            .arg("--no-sandbox")
            .arg("--disable-gpu");

        for arg in &self.config.chrome_args {
            builder = builder.arg(arg);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        Ok((browser, handle))
    }
}

#[cfg(feature = "browser")]
#[async_trait]
impl RenderedFetcher for BrowserFetcher {
    async fn render(
        &self,
        url: &str,
        options: RenderOptions<'_>,
    ) -> Result<RenderedPage, ScrapeError> {
        let (mut browser, handle) = self.launch().await?;

        let result = match browser.new_page("about:blank").await {
            Ok(page) => {
                let result = self.render_inner(&page, url, options).await;
                let _ = page.close().await;
                result
            }
            Err(e) => Err(ScrapeError::Browser(format!("Failed to open page: {}", e))),
        };

        // Always release the session, whatever happened above.
        if let Err(e) = browser.close().await {
            debug!("Browser close failed: {}", e);
        }
        let _ = browser.wait().await;
        handle.abort();

        result
    }
}

// Stub for when browser feature is disabled
#[cfg(not(feature = "browser"))]
#[async_trait]
impl RenderedFetcher for BrowserFetcher {
    async fn render(
        &self,
        _url: &str,
        _options: RenderOptions<'_>,
    ) -> Result<RenderedPage, ScrapeError> {
        Err(ScrapeError::Browser(
            "Browser support not compiled. Rebuild with: cargo build --features browser"
                .to_string(),
        ))
    }
}
