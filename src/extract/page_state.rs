//! Price recovery from a page's embedded render-state JSON (`__NEXT_DATA__`).
//!
//! The blob holds every number the page will ever show: book prices, but also
//! shipping fees, point rewards, coupon amounts and prices of recommended
//! books. Candidates are filtered by key name, key path and magnitude, then
//! scored so that sale-type keys beat list-type keys.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::price::json_price;

/// Keys naming the price actually charged.
const SALE_KEYS: &[&str] = &[
    "saleprice",
    "sellprice",
    "sellingprice",
    "discountprice",
    "dcprice",
    "finalprice",
    "currentprice",
    "saleprc",
    "sellprc",
];

/// Keys naming the cover price.
const LIST_KEYS: &[&str] = &[
    "listprice",
    "standardprice",
    "normalprice",
    "originalprice",
    "orgprice",
    "fixedprice",
    "regularprice",
    "listprc",
];

/// Path tokens that place a value in the product's own detail section.
const CONTEXT_TOKENS: &[&str] = &["product", "detail", "goods", "item", "book"];

const SALE_SCORE: u64 = 200;
const LIST_SCORE: u64 = 100;
const CONTEXT_BONUS: u64 = 30;
/// Cap on the magnitude tie-breaker so it never crosses a key tier.
const MAGNITUDE_CAP: u64 = 49;

const MAX_DEPTH: usize = 64;

/// Filters applied while walking the state blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStatePolicy {
    /// Script element id holding the blob.
    pub script_id: String,
    /// Smallest plausible book price.
    pub min_price: u64,
    /// Largest plausible book price.
    pub max_price: u64,
    /// Any key-path containing one of these is ignored.
    pub exclusions: Vec<String>,
}

impl Default for PageStatePolicy {
    fn default() -> Self {
        Self {
            script_id: "__NEXT_DATA__".to_string(),
            min_price: 500,
            max_price: 500_000,
            exclusions: default_exclusions(),
        }
    }
}

pub fn default_exclusions() -> Vec<String> {
    [
        "delivery", "dlvr", "shipping", "point", "coupon", "benefit", "member", "gift", "reward",
        "mileage", "cashback", "fee",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    Sale,
    List,
    Generic,
}

#[derive(Debug, Clone)]
struct Candidate {
    value: u64,
    score: u64,
    kind: KeyKind,
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn classify_key(key: &str) -> Option<KeyKind> {
    let key = normalize_key(key);
    if SALE_KEYS.iter().any(|k| key.contains(k)) {
        Some(KeyKind::Sale)
    } else if LIST_KEYS.iter().any(|k| key.contains(k)) {
        Some(KeyKind::List)
    } else if key == "price" || key.ends_with("price") {
        Some(KeyKind::Generic)
    } else {
        None
    }
}

struct Walker<'a> {
    policy: &'a PageStatePolicy,
    path: Vec<String>,
    found: Vec<Candidate>,
}

impl Walker<'_> {
    fn walk(&mut self, value: &Value) {
        if self.path.len() > MAX_DEPTH {
            return;
        }
        match value {
            Value::Object(map) => {
                for (key, child) in map {
                    self.path.push(normalize_key(key));
                    match child {
                        Value::Object(_) | Value::Array(_) => self.walk(child),
                        leaf => self.consider(key, leaf),
                    }
                    self.path.pop();
                }
            }
            Value::Array(items) => {
                for item in items {
                    match item {
                        Value::Object(_) | Value::Array(_) => self.walk(item),
                        leaf => {
                            if let Some(key) = self.path.last().cloned() {
                                self.consider(&key, leaf);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn consider(&mut self, key: &str, leaf: &Value) {
        let Some(kind) = classify_key(key) else {
            return;
        };

        let joined = self.path.join(".");
        if self
            .policy
            .exclusions
            .iter()
            .any(|token| joined.contains(token.as_str()))
        {
            return;
        }

        let Some(value) = json_price(leaf) else {
            return;
        };
        if value < self.policy.min_price || value > self.policy.max_price {
            return;
        }

        let base = match kind {
            KeyKind::Sale => SALE_SCORE,
            KeyKind::List => LIST_SCORE,
            KeyKind::Generic => 0,
        };
        let context = if CONTEXT_TOKENS.iter().any(|t| joined.contains(t)) {
            CONTEXT_BONUS
        } else {
            0
        };
        let score = base + (value / 1000).min(MAGNITUDE_CAP) + context;

        self.found.push(Candidate { value, score, kind });
    }
}

/// Highest-scoring candidate; earliest wins ties.
fn best<'c>(candidates: impl Iterator<Item = &'c Candidate>) -> Option<&'c Candidate> {
    let mut best: Option<&'c Candidate> = None;
    for c in candidates {
        if best.map_or(true, |b| c.score > b.score) {
            best = Some(c);
        }
    }
    best
}

/// Score an already-parsed state blob into `(list, sale)`.
fn prices_from_state(state: &Value, policy: &PageStatePolicy) -> (Option<u64>, Option<u64>) {
    let mut walker = Walker {
        policy,
        path: Vec::new(),
        found: Vec::new(),
    };
    walker.walk(state);
    let found = walker.found;

    let Some(sale) = best(found.iter()).map(|c| c.value) else {
        return (None, None);
    };

    let list = best(found.iter().filter(|c| c.kind == KeyKind::List))
        .map(|c| c.value)
        .or_else(|| found.iter().map(|c| c.value).max())
        .map(|v| v.max(sale));

    debug!(
        "Page state yielded {} price candidates (list={:?}, sale={})",
        found.len(),
        list,
        sale
    );

    (list, Some(sale))
}

/// `(list, sale)` from the page's render-state blob, if it has one.
pub fn extract_structured_page_data_prices(
    document: &Html,
    policy: &PageStatePolicy,
) -> (Option<u64>, Option<u64>) {
    let Ok(selector) = Selector::parse(&format!("script#{}", policy.script_id)) else {
        return (None, None);
    };
    let Some(script) = document.select(&selector).next() else {
        return (None, None);
    };

    let raw: String = script.text().collect();
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(state) => prices_from_state(&state, policy),
        Err(e) => {
            debug!("Page state blob did not parse: {}", e);
            (None, None)
        }
    }
}
