//! KYOBO product pages (`/detail/<id>`).
//!
//! The static page routinely exposes the shipping fee or a point reward where
//! the price should be, so any price at or below the suspicion floor sends
//! the URL to the rendered tier, where the price is read from the live DOM.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use tracing::debug;

use super::{
    apply_out_of_stock, book_fields, record_from_fields, visible_text, PageInput, SiteExtractor,
    Verdict,
};
use crate::extract::{
    extract_structured_page_data_prices, format_won, scan_isbn, scan_prices_from_text,
    scan_publisher,
};
use crate::models::{ResultRecord, ResultStatus, SiteId};
use crate::scrapers::config::{SiteStrategy, StrategyTier};

static PRODUCT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/detail/([A-Z0-9]+)").unwrap());

const STATIC_FAILURE: &str = "필수 정보를 찾지 못했습니다(차단/구조 변경 가능).";
const RENDERED_FAILURE: &str = "필수 정보를 찾지 못했습니다.";

fn price_failure(floor: Option<u64>) -> String {
    format!(
        "교보문고 가격을 찾지 못했습니다(배송비/혜택 오탐 방지로 {}원 이하 금액은 제외).",
        format_won(floor.unwrap_or(0))
    )
}

pub struct KyoboExtractor;

impl KyoboExtractor {
    /// Structured data, then the render-state blob (overrides), then the
    /// text scan (fills gaps).
    fn parse(
        &self,
        document: &Html,
        text: &str,
        page: &PageInput<'_>,
        product_id: Option<String>,
        tier: StrategyTier,
        strategy: &SiteStrategy,
    ) -> ResultRecord {
        let fields = book_fields(document, strategy);
        let mut record = record_from_fields(self.site(), page, product_id, tier, fields);

        if let Some(ref policy) = strategy.page_state {
            let (list, sale) = extract_structured_page_data_prices(document, policy);
            if list.is_some() {
                record.list_price = list;
            }
            if sale.is_some() {
                record.sale_price = sale;
            }
        }

        if record.isbn.is_none() {
            record.isbn = scan_isbn(text);
        }
        if record.publisher.is_none() {
            record.publisher = scan_publisher(text);
        }

        if record.list_price.is_none() || record.sale_price.is_none() {
            let (list, sale) = scan_prices_from_text(text, &strategy.banned_context);
            record.list_price = record.list_price.or(list);
            record.sale_price = record.sale_price.or(sale);
        }

        record
    }
}

/// KYOBO sometimes labels the discounted amount as the list price.
fn correct_inverted(record: &mut ResultRecord, strategy: &SiteStrategy) {
    if !strategy.swap_inverted_prices {
        return;
    }
    if let (Some(list), Some(sale)) = (record.list_price, record.sale_price) {
        if list < sale {
            debug!("Swapping inverted prices for {}", record.url);
            record.list_price = Some(sale);
            record.sale_price = Some(list);
        }
    }
}

fn identified(record: &ResultRecord) -> bool {
    record.title.is_some() || record.isbn.is_some()
}

impl SiteExtractor for KyoboExtractor {
    fn site(&self) -> SiteId {
        SiteId::Kyobo
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
        let text = visible_text(&document);
        let mut record = self.parse(&document, &text, &page, product_id, tier, strategy);

        if apply_out_of_stock(&mut record, &text, strategy) {
            return Verdict::Accept(record);
        }

        if !tier.is_rendered() {
            correct_inverted(&mut record, strategy);
            if strategy.is_suspicious(record.effective_price()) {
                record.status = ResultStatus::Failed;
                record.error = Some(price_failure(strategy.suspicion_floor));
                return Verdict::Next(record);
            }
            if identified(&record) {
                record.status = ResultStatus::Success;
            } else {
                record.error = Some(STATIC_FAILURE.to_string());
            }
            return Verdict::Accept(record);
        }

        if let Some(probed) = page.probed {
            debug!("Kyobo probe for {}: {:?}", record.url, probed);
            if probed.list.is_some() {
                record.list_price = probed.list;
            }
            if probed.sale.is_some() {
                record.sale_price = probed.sale;
            }
        }

        correct_inverted(&mut record, strategy);

        if strategy.is_suspicious(record.effective_price()) {
            record.status = ResultStatus::Failed;
            record.error = Some(price_failure(strategy.suspicion_floor));
        } else if identified(&record) {
            record.status = ResultStatus::Success;
            record.error = None;
        } else {
            record.status = ResultStatus::Failed;
            record.error = Some(RENDERED_FAILURE.to_string());
        }
        Verdict::Accept(record)
    }
}
