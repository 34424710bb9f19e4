//! Per-site extraction strategy configuration.
//!
//! Thresholds, banned context words and out-of-stock phrasing differ between
//! stores. They live here as named settings rather than as literals inside
//! the extractors, and every field can be overridden from the config file.

use serde::{Deserialize, Serialize};

use crate::extract::{default_banned_context, default_exclusions, PageStatePolicy, StockMatcher};
use crate::models::SiteId;

/// One fetch-and-parse tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTier {
    /// Plain HTTP GET.
    Static,
    /// Headless browser render.
    Rendered,
    /// Headless render plus DOM price probes.
    RenderedWithProbe,
}

impl StrategyTier {
    pub fn is_rendered(&self) -> bool {
        !matches!(self, Self::Static)
    }
}

/// What price fields hold when a book is out of stock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SoldOutPricing {
    /// Prices are cleared.
    #[default]
    Absent,
    /// Prices are set to 0.
    Zero,
}

impl SoldOutPricing {
    pub fn value(&self) -> Option<u64> {
        match self {
            Self::Absent => None,
            Self::Zero => Some(0),
        }
    }
}

/// Whether a record needs a price to count as a success.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricePolicy {
    /// Title or ISBN, and at least one price.
    #[default]
    Required,
    /// Title, ISBN or a sale price is enough.
    Optional,
}

/// DOM probes run inside the rendered page to read the price directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceProbeConfig {
    /// Absolute XPath of the sale price element, tried first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpath: Option<String>,
    /// Labels whose neighbourhood holds the list price.
    pub list_labels: Vec<String>,
    /// Labels whose neighbourhood holds the sale price.
    pub sale_labels: Vec<String>,
    /// Amounts at or below this are shipping/benefit noise.
    pub spam_threshold: u64,
}

impl Default for PriceProbeConfig {
    fn default() -> Self {
        Self {
            xpath: Some(
                "/html/body/div[3]/main/section/div[2]/div[1]/div[3]/div[1]/div[2]/div[1]/div/span[1]/span/span[1]"
                    .to_string(),
            ),
            list_labels: vec!["정가".to_string()],
            sale_labels: vec![
                "판매가".to_string(),
                "할인가".to_string(),
                "최종 판매가".to_string(),
            ],
            spam_threshold: 6000,
        }
    }
}

/// Resolved strategy for one store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteStrategy {
    /// Tiers tried in order until one yields an accepted record.
    pub strategies: Vec<StrategyTier>,
    pub price_policy: PricePolicy,
    /// A resolved price at or below this forces escalation.
    pub suspicion_floor: Option<u64>,
    /// Words that disqualify an unlabelled amount found right after them.
    pub banned_context: Vec<String>,
    /// Out-of-stock phrases, compiled; empty disables detection.
    #[serde(rename = "out_of_stock_patterns")]
    pub out_of_stock: StockMatcher,
    pub sold_out_pricing: SoldOutPricing,
    /// Render-state blob walk; `None` skips it.
    pub page_state: Option<PageStatePolicy>,
    /// Extra script ids holding structured book data.
    pub island_ids: Vec<String>,
    /// Post-load settle delay for rendered fetches, in milliseconds.
    pub settle_ms: u64,
    /// Rendered navigation timeout in seconds.
    pub navigation_timeout: u64,
    pub price_probe: Option<PriceProbeConfig>,
    /// Swap list and sale when list ends up below sale.
    pub swap_inverted_prices: bool,
}

impl SiteStrategy {
    fn base() -> Self {
        Self {
            strategies: vec![StrategyTier::Static, StrategyTier::Rendered],
            price_policy: PricePolicy::Required,
            suspicion_floor: None,
            banned_context: default_banned_context(),
            out_of_stock: StockMatcher::none(),
            sold_out_pricing: SoldOutPricing::Absent,
            page_state: None,
            island_ids: Vec::new(),
            settle_ms: 500,
            navigation_timeout: 30,
            price_probe: None,
            swap_inverted_prices: false,
        }
    }

    pub fn yes24() -> Self {
        Self::base()
    }

    pub fn aladin() -> Self {
        Self {
            price_policy: PricePolicy::Optional,
            ..Self::base()
        }
    }

    pub fn kyobo() -> Self {
        let mut exclusions = default_exclusions();
        exclusions.extend(
            ["card", "event", "bundle", "package", "used", "ebook", "recommend", "related"]
                .iter()
                .map(|s| s.to_string()),
        );

        Self {
            strategies: vec![StrategyTier::Static, StrategyTier::RenderedWithProbe],
            suspicion_floor: Some(6000),
            out_of_stock: StockMatcher::default(),
            page_state: Some(PageStatePolicy {
                min_price: 1000,
                exclusions,
                ..PageStatePolicy::default()
            }),
            settle_ms: 1200,
            navigation_timeout: 45,
            price_probe: Some(PriceProbeConfig::default()),
            swap_inverted_prices: true,
            ..Self::base()
        }
    }

    pub fn ypbooks() -> Self {
        Self {
            price_policy: PricePolicy::Optional,
            ..Self::base()
        }
    }

    /// Built-in strategy for a site.
    pub fn for_site(site: SiteId) -> Self {
        match site {
            SiteId::Yes24 => Self::yes24(),
            SiteId::Aladin => Self::aladin(),
            SiteId::Kyobo => Self::kyobo(),
            SiteId::Ypbooks => Self::ypbooks(),
            SiteId::Unknown => Self::base(),
        }
    }

    /// Whether `price` should be treated as a fee or credit rather than the
    /// book's price. A missing price is always suspicious.
    pub fn is_suspicious(&self, price: Option<u64>) -> bool {
        match (price, self.suspicion_floor) {
            (None, _) => true,
            (Some(p), Some(floor)) => p <= floor,
            (Some(_), None) => false,
        }
    }
}

/// Plausible book price range for the render-state walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceWindow {
    pub min: u64,
    pub max: u64,
}

/// Partial strategy from the config file; present fields replace defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteStrategyOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategies: Option<Vec<StrategyTier>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_policy: Option<PricePolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suspicion_floor: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned_context: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_of_stock_patterns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sold_out_pricing: Option<SoldOutPricing>,
    /// Key-path tokens ignored in the render-state walk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_state_exclusions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_window: Option<PriceWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub island_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settle_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_timeout: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_probe: Option<PriceProbeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_inverted_prices: Option<bool>,
}

impl SiteStrategyOverride {
    pub fn apply(&self, strategy: &mut SiteStrategy) {
        if let Some(ref tiers) = self.strategies {
            if !tiers.is_empty() {
                strategy.strategies = tiers.clone();
            }
        }
        if let Some(policy) = self.price_policy {
            strategy.price_policy = policy;
        }
        if let Some(floor) = self.suspicion_floor {
            strategy.suspicion_floor = Some(floor);
        }
        if let Some(ref words) = self.banned_context {
            strategy.banned_context = words.clone();
        }
        if let Some(ref patterns) = self.out_of_stock_patterns {
            strategy.out_of_stock = StockMatcher::new(patterns);
        }
        if let Some(pricing) = self.sold_out_pricing {
            strategy.sold_out_pricing = pricing;
        }
        if self.page_state_exclusions.is_some() || self.price_window.is_some() {
            let page_state = strategy.page_state.get_or_insert_with(PageStatePolicy::default);
            if let Some(ref exclusions) = self.page_state_exclusions {
                page_state.exclusions = exclusions.clone();
            }
            if let Some(window) = self.price_window {
                page_state.min_price = window.min;
                page_state.max_price = window.max;
            }
        }
        if let Some(ref ids) = self.island_ids {
            strategy.island_ids = ids.clone();
        }
        if let Some(ms) = self.settle_ms {
            strategy.settle_ms = ms;
        }
        if let Some(secs) = self.navigation_timeout {
            strategy.navigation_timeout = secs;
        }
        if let Some(ref probe) = self.price_probe {
            strategy.price_probe = Some(probe.clone());
        }
        if let Some(swap) = self.swap_inverted_prices {
            strategy.swap_inverted_prices = swap;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kyobo_defaults() {
        let s = SiteStrategy::for_site(SiteId::Kyobo);
        assert_eq!(
            s.strategies,
            vec![StrategyTier::Static, StrategyTier::RenderedWithProbe]
        );
        assert_eq!(s.suspicion_floor, Some(6000));
        assert!(!s.out_of_stock.is_empty());
        assert!(s.page_state.as_ref().unwrap().exclusions.contains(&"card".to_string()));
        assert!(s.price_probe.is_some());
    }

    #[test]
    fn test_price_policy_per_site() {
        assert_eq!(SiteStrategy::yes24().price_policy, PricePolicy::Required);
        assert_eq!(SiteStrategy::aladin().price_policy, PricePolicy::Optional);
        assert_eq!(SiteStrategy::ypbooks().price_policy, PricePolicy::Optional);
    }

    #[test]
    fn test_is_suspicious() {
        let kyobo = SiteStrategy::kyobo();
        assert!(kyobo.is_suspicious(None));
        assert!(kyobo.is_suspicious(Some(5000)));
        assert!(kyobo.is_suspicious(Some(6000)));
        assert!(!kyobo.is_suspicious(Some(6001)));
        assert!(!SiteStrategy::yes24().is_suspicious(Some(100)));
    }

    #[test]
    fn test_override_replaces_only_present_fields() {
        let mut s = SiteStrategy::kyobo();
        let o = SiteStrategyOverride {
            suspicion_floor: Some(7000),
            sold_out_pricing: Some(SoldOutPricing::Zero),
            strategies: Some(Vec::new()),
            ..Default::default()
        };
        o.apply(&mut s);
        assert_eq!(s.suspicion_floor, Some(7000));
        assert_eq!(s.sold_out_pricing, SoldOutPricing::Zero);
        assert_eq!(s.strategies.len(), 2);
        assert_eq!(s.settle_ms, 1200);
        assert!(s.out_of_stock.find("일시품절").is_some());
    }

    #[test]
    fn test_out_of_stock_override_recompiles() {
        let mut s = SiteStrategy::yes24();
        assert!(s.out_of_stock.is_empty());
        let o = SiteStrategyOverride {
            out_of_stock_patterns: Some(vec!["재고\\s*없음".to_string()]),
            ..Default::default()
        };
        o.apply(&mut s);
        assert!(s.out_of_stock.find("현재 재고 없음").is_some());
        assert!(s.out_of_stock.find("일시품절").is_none());
    }

    #[test]
    fn test_price_window_override_keeps_exclusions() {
        let mut s = SiteStrategy::kyobo();
        let o = SiteStrategyOverride {
            price_window: Some(PriceWindow { min: 2000, max: 90_000 }),
            ..Default::default()
        };
        o.apply(&mut s);
        let page_state = s.page_state.unwrap();
        assert_eq!((page_state.min_price, page_state.max_price), (2000, 90_000));
        assert!(page_state.exclusions.contains(&"ebook".to_string()));
    }

    #[test]
    fn test_override_parses_from_toml() {
        let o: SiteStrategyOverride = toml::from_str(
            r#"
            strategies = ["static", "rendered_with_probe"]
            sold_out_pricing = "zero"
            price_probe = { spam_threshold = 5000 }
            "#,
        )
        .unwrap();
        assert_eq!(o.sold_out_pricing, Some(SoldOutPricing::Zero));
        let probe = o.price_probe.unwrap();
        assert_eq!(probe.spam_threshold, 5000);
        assert_eq!(probe.sale_labels.len(), 3);
    }

    #[test]
    fn test_sold_out_pricing_values() {
        assert_eq!(SoldOutPricing::Absent.value(), None);
        assert_eq!(SoldOutPricing::Zero.value(), Some(0));
    }
}
