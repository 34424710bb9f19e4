//! Rendered page fetch and price probing.

use std::time::Duration;

use tracing::{debug, info, warn};

use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
use chromiumoxide::Page;

use super::probe::{amounts, label_script, pick_probe_price, xpath_script};
use super::stealth::STEALTH_SCRIPTS;
use super::BrowserFetcher;
use crate::extract::parse_price;
use crate::scrapers::config::PriceProbeConfig;
use crate::scrapers::error::ScrapeError;
use crate::scrapers::fetch::{ProbedPrices, RenderOptions, RenderedPage};

/// JavaScript to wait for page ready state.
const WAIT_FOR_READY_SCRIPT: &str = r#"
    new Promise((resolve) => {
        if (document.readyState === 'complete') {
            resolve(document.readyState);
        } else {
            window.addEventListener('load', () => resolve(document.readyState));
            setTimeout(() => resolve('timeout'), 10000);
        }
    })
"#;

/// Wait for the page to reach a ready state.
async fn wait_for_page_ready(page: &Page, timeout_secs: u64) {
    let ready_timeout = Duration::from_secs(timeout_secs);
    match tokio::time::timeout(
        ready_timeout,
        page.evaluate(WAIT_FOR_READY_SCRIPT.to_string()),
    )
    .await
    {
        Ok(Ok(result)) => {
            let state: String = result
                .into_value()
                .unwrap_or_else(|_| "unknown".to_string());
            debug!("Page ready state: {}", state);
        }
        Ok(Err(e)) => {
            debug!("Could not check ready state: {}", e);
        }
        Err(_) => {
            warn!("Timeout waiting for page ready state");
        }
    }
}

/// Evaluate a script that returns a JSON string and decode it.
async fn evaluate_json<T: serde::de::DeserializeOwned>(page: &Page, script: String) -> Option<T> {
    let result = match page.evaluate(script).await {
        Ok(result) => result,
        Err(e) => {
            debug!("Probe script failed: {}", e);
            return None;
        }
    };
    let raw: String = result.into_value().ok()?;
    serde_json::from_str(&raw).ok()
}

async fn probe_prices(page: &Page, probe: &PriceProbeConfig) -> ProbedPrices {
    let spam = probe.spam_threshold;

    let mut sale = None;
    if let Some(ref xpath) = probe.xpath {
        let text: Option<String> = evaluate_json::<Option<String>>(page, xpath_script(xpath))
            .await
            .flatten();
        sale = parse_price(text.as_deref()).filter(|v| *v > spam);
        debug!("XPath probe: {:?}", sale);
    }

    if sale.is_none() {
        let raw: Vec<String> = evaluate_json(page, label_script(&probe.sale_labels))
            .await
            .unwrap_or_default();
        sale = pick_probe_price(&amounts(&raw), spam);
        debug!("Sale label probe: {} candidates -> {:?}", raw.len(), sale);
    }

    let raw: Vec<String> = evaluate_json(page, label_script(&probe.list_labels))
        .await
        .unwrap_or_default();
    let list = pick_probe_price(&amounts(&raw), spam);
    debug!("List label probe: {} candidates -> {:?}", raw.len(), list);

    ProbedPrices { list, sale }
}

impl BrowserFetcher {
    /// Page flow for one rendered fetch. Page and browser cleanup is handled
    /// by the caller.
    pub(crate) async fn render_inner(
        &self,
        page: &Page,
        url: &str,
        options: RenderOptions<'_>,
    ) -> Result<RenderedPage, ScrapeError> {
        let ua = SetUserAgentOverrideParams::builder()
            .user_agent(self.user_agent.clone())
            .accept_language(self.accept_language.clone())
            .build()
            .map_err(ScrapeError::Browser)?;
        page.execute(ua)
            .await
            .map_err(|e| ScrapeError::Browser(format!("Failed to set user agent: {}", e)))?;

        self.navigate_to_url(page, url, options.navigation_timeout)
            .await?;

        wait_for_page_ready(page, self.config.timeout).await;

        if self.config.stealth {
            self.apply_stealth(page).await;
        }

        tokio::time::sleep(Duration::from_millis(options.settle_ms)).await;

        let probed = match options.probe {
            Some(probe) => probe_prices(page, probe).await,
            None => ProbedPrices::default(),
        };

        let final_url = page
            .url()
            .await
            .map_err(|e| ScrapeError::Browser(e.to_string()))?
            .map(|u| u.to_string())
            .unwrap_or_else(|| url.to_string());
        let html = page
            .content()
            .await
            .map_err(|e| ScrapeError::Browser(format!("Failed to read page content: {}", e)))?;

        info!("Rendered {} ({} bytes)", final_url, html.len());

        Ok(RenderedPage {
            final_url,
            html,
            probed,
        })
    }

    /// Navigate and wait for the load to settle, bounded by `timeout_secs`.
    async fn navigate_to_url(
        &self,
        page: &Page,
        url: &str,
        timeout_secs: u64,
    ) -> Result<(), ScrapeError> {
        info!("Navigating to {}", url);
        let nav_params = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(|e| ScrapeError::Browser(format!("Invalid URL: {}", e)))?;

        let navigation = async {
            page.execute(nav_params).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        };

        tokio::time::timeout(Duration::from_secs(timeout_secs), navigation)
            .await
            .map_err(|_| ScrapeError::Timeout {
                secs: timeout_secs,
                url: url.to_string(),
            })?
            .map_err(|e| ScrapeError::Browser(format!("Navigation failed for {}: {}", url, e)))
    }

    async fn apply_stealth(&self, page: &Page) {
        debug!("Applying stealth scripts");

        for script in STEALTH_SCRIPTS {
            if let Err(e) = page.evaluate(script.to_string()).await {
                debug!("Stealth script injection skipped: {}", e);
            }
        }
    }
}
