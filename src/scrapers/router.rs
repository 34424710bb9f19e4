//! URL dispatch: one normalized record per URL, whatever happens.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{info, warn};

use super::config::SiteStrategy;
use super::fetch::{PageFetcher, RenderedFetcher};
use super::sites::{
    run_strategies, AladinExtractor, KyoboExtractor, SiteExtractor, Yes24Extractor,
    YpbooksExtractor,
};
use crate::models::{ResultRecord, SiteId};

pub struct Router {
    http: Arc<dyn PageFetcher>,
    browser: Arc<dyn RenderedFetcher>,
    strategies: HashMap<SiteId, SiteStrategy>,
}

impl Router {
    /// Router with the built-in strategy for every store.
    pub fn new(http: Arc<dyn PageFetcher>, browser: Arc<dyn RenderedFetcher>) -> Self {
        let strategies = SiteId::SUPPORTED
            .iter()
            .map(|site| (*site, SiteStrategy::for_site(*site)))
            .collect();
        Self {
            http,
            browser,
            strategies,
        }
    }

    /// Replace the strategy table (sites missing from it use the built-in).
    pub fn with_strategies(mut self, strategies: HashMap<SiteId, SiteStrategy>) -> Self {
        self.strategies.extend(strategies);
        self
    }

    fn extractor(site: SiteId) -> Option<&'static dyn SiteExtractor> {
        match site {
            SiteId::Yes24 => Some(&Yes24Extractor),
            SiteId::Aladin => Some(&AladinExtractor),
            SiteId::Kyobo => Some(&KyoboExtractor),
            SiteId::Ypbooks => Some(&YpbooksExtractor),
            SiteId::Unknown => None,
        }
    }

    /// Route `url` to its store's extractor.
    ///
    /// A store is skipped only when `enabled` names it with `false`; absent
    /// entries count as enabled. Errors and panics inside an extractor become
    /// `exception` records.
    pub async fn parse_any(&self, url: &str, enabled: &HashMap<SiteId, bool>) -> ResultRecord {
        let site = SiteId::detect(url);

        if enabled.get(&site) == Some(&false) {
            info!("{}: disabled, skipping {}", site, url);
            return ResultRecord::skipped(site, url);
        }

        let Some(extractor) = Self::extractor(site) else {
            info!("Unsupported URL: {}", url);
            return ResultRecord::unsupported(url);
        };

        let fallback;
        let strategy = match self.strategies.get(&site) {
            Some(strategy) => strategy,
            None => {
                fallback = SiteStrategy::for_site(site);
                &fallback
            }
        };

        let run = run_strategies(
            extractor,
            url,
            strategy,
            self.http.as_ref(),
            self.browser.as_ref(),
        );

        match AssertUnwindSafe(run).catch_unwind().await {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                warn!("{}: {} failed: {}", site, url, e);
                ResultRecord::exception(site, url, e.kind(), &e.to_string())
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "extractor panicked".to_string());
                warn!("{}: {} panicked: {}", site, url, message);
                ResultRecord::exception(site, url, "Panic", &message)
            }
        }
    }
}
