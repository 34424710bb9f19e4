//! YES24 product pages (`/Product/Goods/<id>`).

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use super::{book_fields, finish, record_from_fields, visible_text, PageInput, SiteExtractor, Verdict};
use crate::extract::{scan_isbn, scan_prices_from_text};
use crate::models::SiteId;
use crate::scrapers::config::{SiteStrategy, StrategyTier};

static PRODUCT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/Goods/(\d+)").unwrap());

const FAILURE: &str = "필수 정보를 찾지 못했습니다(페이지 구조/차단 가능).";

pub struct Yes24Extractor;

impl SiteExtractor for Yes24Extractor {
    fn site(&self) -> SiteId {
        SiteId::Yes24
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

        if record.list_price.is_none() || record.sale_price.is_none() {
            let (list, sale) = scan_prices_from_text(&text, &strategy.banned_context);
            record.list_price = record.list_price.or(list);
            record.sale_price = record.sale_price.or(sale);
        }

        finish(record, &text, strategy, FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::run_strategies;
    use super::*;
    use crate::models::{ParseMode, ResultStatus};

    const URL: &str = "https://www.yes24.com/Product/Goods/12345678";

    #[test]
    fn test_product_id() {
        assert_eq!(Yes24Extractor.product_id(URL).as_deref(), Some("12345678"));
        assert_eq!(Yes24Extractor.product_id("https://www.yes24.com/"), None);
    }

    #[tokio::test]
    async fn test_structured_page_succeeds_statically() {
        let http = FakeHttp::serving(&book_page("소년이 온다", "9788936434120", Some(15000), ""));
        let browser = FakeBrowser::unavailable();

        let record = run_strategies(&Yes24Extractor, URL, &SiteStrategy::yes24(), &http, &browser)
            .await
            .unwrap();

        assert_eq!(record.status, ResultStatus::Success);
        assert_eq!(record.parse_mode, ParseMode::Static);
        assert_eq!(record.product_id.as_deref(), Some("12345678"));
        assert_eq!(record.title.as_deref(), Some("소년이 온다"));
        assert_eq!(record.author.as_deref(), Some("한강"));
        assert_eq!((record.list_price, record.sale_price), (Some(15000), Some(15000)));
        assert!(record.error.is_none());
        assert_eq!(browser.calls(), 0);
    }

    #[tokio::test]
    async fn test_text_scan_fills_prices_and_isbn() {
        let html = r#"<html><head><meta property="og:title" content="작별하지 않는다"></head>
            <body><p>ISBN 9788954682152</p><p>정가 16,800원</p><p>판매가 15,120원</p></body></html>"#;
        let http = FakeHttp::serving(html);
        let browser = FakeBrowser::unavailable();

        let record = run_strategies(&Yes24Extractor, URL, &SiteStrategy::yes24(), &http, &browser)
            .await
            .unwrap();

        assert_eq!(record.status, ResultStatus::Success);
        assert_eq!(record.title.as_deref(), Some("작별하지 않는다"));
        assert_eq!(record.isbn.as_deref(), Some("9788954682152"));
        assert_eq!((record.list_price, record.sale_price), (Some(16800), Some(15120)));
    }

    #[tokio::test]
    async fn test_hyphenated_structured_isbn_is_normalized() {
        let http = FakeHttp::serving(&book_page("소년이 온다", "978-89-364-3412-0", Some(15000), ""));
        let browser = FakeBrowser::unavailable();

        let record = run_strategies(&Yes24Extractor, URL, &SiteStrategy::yes24(), &http, &browser)
            .await
            .unwrap();

        assert_eq!(record.status, ResultStatus::Success);
        assert_eq!(record.isbn.as_deref(), Some("9788936434120"));
    }

    #[tokio::test]
    async fn test_isbn10_falls_back_to_text_scan() {
        let http = FakeHttp::serving(&book_page(
            "소년이 온다",
            "8936434128",
            Some(15000),
            "<p>ISBN 9788936434120</p>",
        ));
        let browser = FakeBrowser::unavailable();

        let record = run_strategies(&Yes24Extractor, URL, &SiteStrategy::yes24(), &http, &browser)
            .await
            .unwrap();

        assert_eq!(record.isbn.as_deref(), Some("9788936434120"));
    }

    #[tokio::test]
    async fn test_missing_price_escalates_to_rendered() {
        let http = FakeHttp::serving(&book_page("소년이 온다", "9788936434120", None, ""));
        let browser = FakeBrowser::serving(&book_page("소년이 온다", "9788936434120", Some(15000), ""));

        let record = run_strategies(&Yes24Extractor, URL, &SiteStrategy::yes24(), &http, &browser)
            .await
            .unwrap();

        assert_eq!(record.parse_mode, ParseMode::Rendered);
        assert_eq!(record.status, ResultStatus::Success);
        assert_eq!(record.sale_price, Some(15000));
        assert_eq!(browser.calls(), 1);
    }

    #[tokio::test]
    async fn test_rendered_failure_keeps_message() {
        let http = FakeHttp::serving("<html><body>접근이 차단되었습니다</body></html>");
        let browser = FakeBrowser::serving("<html><body>접근이 차단되었습니다</body></html>");

        let record = run_strategies(&Yes24Extractor, URL, &SiteStrategy::yes24(), &http, &browser)
            .await
            .unwrap();

        assert_eq!(record.status, ResultStatus::Failed);
        assert_eq!(record.parse_mode, ParseMode::Rendered);
        assert_eq!(record.error.as_deref(), Some(FAILURE));
    }
}
