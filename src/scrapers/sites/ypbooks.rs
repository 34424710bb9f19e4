//! YPBOOKS product pages (`/books/<id>`).

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use super::{book_fields, finish, record_from_fields, visible_text, PageInput, SiteExtractor, Verdict};
use crate::extract::scan_isbn;
use crate::models::SiteId;
use crate::scrapers::config::{SiteStrategy, StrategyTier};

static PRODUCT_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/books/(\d+)").unwrap());

const FAILURE: &str = "필수 정보를 찾지 못했습니다(차단/동적 렌더링 가능).";

pub struct YpbooksExtractor;

impl SiteExtractor for YpbooksExtractor {
    fn site(&self) -> SiteId {
        SiteId::Ypbooks
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

        finish(record, &text, strategy, FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::super::run_strategies;
    use super::*;
    use crate::models::{ParseMode, ResultStatus};

    const URL: &str = "https://www.ypbooks.co.kr/books/202401150001";

    #[test]
    fn test_product_id() {
        assert_eq!(
            YpbooksExtractor.product_id(URL).as_deref(),
            Some("202401150001")
        );
    }

    #[tokio::test]
    async fn test_client_rendered_shell_escalates() {
        let shell = r#"<html><body><div id="app"></div></body></html>"#;
        let http = FakeHttp::serving(shell);
        let browser =
            FakeBrowser::serving(&book_page("희랍어 시간", "9788954620482", Some(12600), ""));

        let record = run_strategies(&YpbooksExtractor, URL, &SiteStrategy::ypbooks(), &http, &browser)
            .await
            .unwrap();

        assert_eq!(record.parse_mode, ParseMode::Rendered);
        assert_eq!(record.status, ResultStatus::Success);
        assert_eq!(record.isbn.as_deref(), Some("9788954620482"));
        assert_eq!(record.sale_price, Some(12600));
        assert_eq!(http.calls(), 1);
        assert_eq!(browser.calls(), 1);
    }

    #[tokio::test]
    async fn test_rendered_shell_fails_with_message() {
        let shell = r#"<html><body><div id="app"></div></body></html>"#;
        let http = FakeHttp::serving(shell);
        let browser = FakeBrowser::serving(shell);

        let record = run_strategies(&YpbooksExtractor, URL, &SiteStrategy::ypbooks(), &http, &browser)
            .await
            .unwrap();

        assert_eq!(record.status, ResultStatus::Failed);
        assert_eq!(record.error.as_deref(), Some(FAILURE));
    }
}
