//! ALADIN product pages (`wproduct.aspx?ItemId=<id>`).

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use super::{book_fields, finish, record_from_fields, visible_text, PageInput, SiteExtractor, Verdict};
use crate::extract::{has_banned_context, parse_price, scan_isbn, text_nodes};
use crate::models::SiteId;
use crate::scrapers::config::{SiteStrategy, StrategyTier};

static PRODUCT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ItemId=(\d+)").unwrap());

const FAILURE: &str = "필수 정보를 찾지 못했습니다(페이지 구조/차단 가능).";

pub struct AladinExtractor;

/// First text node that reads like a won amount and is not a fee or benefit.
fn first_price_node(document: &Html, banned: &[String]) -> Option<u64> {
    text_nodes(document)
        .iter()
        .filter(|t| t.contains('원') && t.chars().any(|c| c.is_ascii_digit()))
        .filter(|t| !has_banned_context(t, banned))
        .find_map(|t| parse_price(Some(t.as_str())).filter(|v| *v > 0))
}

impl SiteExtractor for AladinExtractor {
    fn site(&self) -> SiteId {
        SiteId::Aladin
    }

    fn product_id(&self, url: &str) -> Option<String> {
        PRODUCT_ID.captures(url).map(|c| c[1].to_string())
    }

    fn evaluate(
        &self,
        page: PageInput<'_>,
        product_id: Option<String>,
        tier: StrategyTier,
        strategy: &SiteStrategy,
    ) -> Verdict {
        let document = Html::parse_document(page.html);
        let fields = book_fields(&document, strategy);
        let text = visible_text(&document);
        let mut record = record_from_fields(self.site(), &page, product_id, tier, fields);

        if record.isbn.is_none() {
            record.isbn = scan_isbn(&text);
        }

        if record.sale_price.is_none() {
            record.sale_price = first_price_node(&document, &strategy.banned_context);
        }
        if record.list_price.is_none() {
            record.list_price = record.sale_price;
        }

        finish(record, &text, strategy, FAILURE)
    }
}
