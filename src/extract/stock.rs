//! Out-of-stock detection over visible page text.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Phrases that mean the book cannot be bought right now.
///
/// Generic wording that shows up on every product page (delivery notices,
/// "notify me when restocked" widgets) is deliberately absent.
fn default_out_of_stock_patterns() -> Vec<String> {
    [
        r"재고\s*사정.*품절",
        r"일시\s*품절",
        r"현재\s*품절",
        r"품절\s*도서",
        r"절판",
        r"판매\s*중지",
        r"구매\s*불가",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Compiled out-of-stock patterns.
///
/// Compiled once when a strategy is resolved; (de)serializes as the list of
/// pattern strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct StockMatcher {
    patterns: Vec<Regex>,
}

impl StockMatcher {
    /// Compile patterns, dropping (and logging) any that are invalid.
    pub fn new(patterns: &[String]) -> Self {
        let patterns = patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Ignoring invalid out-of-stock pattern {:?}: {}", p, e);
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// The first pattern found in `text`, if any.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.patterns
            .iter()
            .find_map(|re| re.find(text).map(|m| m.as_str()))
    }

    /// Matches nothing.
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn patterns(&self) -> Vec<String> {
        self.patterns.iter().map(|re| re.as_str().to_string()).collect()
    }
}

impl Default for StockMatcher {
    fn default() -> Self {
        Self::new(&default_out_of_stock_patterns())
    }
}

impl PartialEq for StockMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.patterns() == other.patterns()
    }
}

impl Eq for StockMatcher {}

impl From<Vec<String>> for StockMatcher {
    fn from(patterns: Vec<String>) -> Self {
        Self::new(&patterns)
    }
}

impl From<StockMatcher> for Vec<String> {
    fn from(matcher: StockMatcher) -> Self {
        matcher.patterns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_sold_out_phrases() {
        let m = StockMatcher::default();
        assert!(m.find("이 상품은 일시품절 되었습니다").is_some());
        assert!(m.find("일시 품절").is_some());
        assert!(m.find("출판사 사정으로 절판된 도서입니다").is_some());
        assert!(m.find("재고 사정으로 인해 현재 품절").is_some());
        assert!(m.find("판매 중지 상품").is_some());
        assert_eq!(m.find("구매불가 상품"), Some("구매불가"));
    }

    #[test]
    fn test_ignores_ordinary_pages() {
        let m = StockMatcher::default();
        assert!(m.find("정가 18,000원 판매가 16,200원 바로구매 장바구니").is_none());
        assert!(m.find("품절 시 알림 신청").is_none());
    }

    #[test]
    fn test_invalid_patterns_are_dropped() {
        let m = StockMatcher::new(&["(unclosed".to_string(), "품절임박".to_string()]);
        assert!(m.find("품절임박").is_some());
        assert!(m.find("(unclosed").is_none());
    }

    #[test]
    fn test_serializes_as_pattern_list() {
        let m: StockMatcher = serde_json::from_str(r#"["절판", "(bad"]"#).unwrap();
        assert!(m.find("절판 도서").is_some());
        assert_eq!(serde_json::to_string(&m).unwrap(), r#"["절판"]"#);
        assert_eq!(m, StockMatcher::new(&["절판".to_string()]));
        assert!(StockMatcher::none().is_empty());
    }
}
