//! Sequential batch processing and result accumulation.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::models::{ResultRecord, SiteId};
use crate::scrapers::Router;

/// One accumulated result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRow {
    #[serde(flatten)]
    pub record: ResultRecord,
    /// Set when the ISBN already appeared in an earlier row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Rows collected across one or more batches, owned by the caller.
///
/// Repeated ISBNs are annotated, never dropped.
#[derive(Debug, Clone, Default)]
pub struct BatchAccumulator {
    rows: Vec<BatchRow>,
    /// ISBN -> 1-based row number of its first appearance.
    seen_isbns: HashMap<String, usize>,
}

impl BatchAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: ResultRecord) {
        let row_number = self.rows.len() + 1;
        let note = match record.isbn.as_deref().filter(|i| !i.is_empty()) {
            Some(isbn) => match self.seen_isbns.get(isbn) {
                Some(first) => Some(format!("중복 ISBN (이전 행 {})", first)),
                None => {
                    self.seen_isbns.insert(isbn.to_string(), row_number);
                    None
                }
            },
            None => None,
        };
        self.rows.push(BatchRow { record, note });
    }

    pub fn rows(&self) -> &[BatchRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.seen_isbns.clear();
    }
}

/// Route every URL in input order, one at a time, pushing each record.
///
/// `progress` is called after each URL with `(done, total, record)`.
pub async fn run_batch<F>(
    router: &Router,
    urls: &[String],
    enabled: &HashMap<SiteId, bool>,
    acc: &mut BatchAccumulator,
    mut progress: F,
) where
    F: FnMut(usize, usize, &ResultRecord),
{
    let total = urls.len();
    info!("Processing {} URLs", total);

    for (i, url) in urls.iter().enumerate() {
        let record = router.parse_any(url.trim(), enabled).await;
        progress(i + 1, total, &record);
        acc.push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ParseMode, ResultStatus};
    use crate::scrapers::sites::testing::{book_page, FakeBrowser, FakeHttp};
    use std::sync::Arc;

    fn record(isbn: Option<&str>) -> ResultRecord {
        let mut r = ResultRecord::parsed(SiteId::Yes24, "u", None, ParseMode::Static);
        r.isbn = isbn.map(String::from);
        r
    }

    #[test]
    fn test_repeated_isbn_is_annotated() {
        let mut acc = BatchAccumulator::new();
        acc.push(record(Some("9788936434120")));
        acc.push(record(None));
        acc.push(record(Some("9788954651134")));
        acc.push(record(Some("9788936434120")));

        assert_eq!(acc.len(), 4);
        assert_eq!(acc.rows()[0].note, None);
        assert_eq!(acc.rows()[1].note, None);
        assert_eq!(acc.rows()[3].note.as_deref(), Some("중복 ISBN (이전 행 1)"));
    }

    #[test]
    fn test_clear_forgets_isbns() {
        let mut acc = BatchAccumulator::new();
        acc.push(record(Some("9788936434120")));
        acc.clear();
        assert!(acc.is_empty());
        acc.push(record(Some("9788936434120")));
        assert_eq!(acc.rows()[0].note, None);
    }

    #[test]
    fn test_row_serializes_flat() {
        let mut acc = BatchAccumulator::new();
        acc.push(record(Some("9788936434120")));
        acc.push(record(Some("9788936434120")));
        let json = serde_json::to_value(acc.rows()).unwrap();
        assert_eq!(json[1]["isbn"], "9788936434120");
        assert_eq!(json[1]["note"], "중복 ISBN (이전 행 1)");
        assert!(json[0].get("note").is_none());
    }

    #[tokio::test]
    async fn test_run_batch_keeps_order_and_reports_progress() {
        let http = Arc::new(FakeHttp::serving(&book_page(
            "소년이 온다",
            "9788936434120",
            Some(15000),
            "",
        )));
        let router = Router::new(http.clone(), Arc::new(FakeBrowser::unavailable()));
        let urls = vec![
            "https://www.yes24.com/Product/Goods/1".to_string(),
            "https://example.com/x".to_string(),
            "https://product.kyobobook.co.kr/detail/S1".to_string(),
            "https://www.aladin.co.kr/shop/wproduct.aspx?ItemId=2".to_string(),
        ];
        let enabled = HashMap::from([(SiteId::Kyobo, false)]);
        let mut acc = BatchAccumulator::new();
        let mut seen = Vec::new();

        run_batch(&router, &urls, &enabled, &mut acc, |done, total, _| {
            seen.push((done, total))
        })
        .await;

        assert_eq!(seen, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
        let statuses: Vec<_> = acc.rows().iter().map(|r| r.record.status).collect();
        assert_eq!(
            statuses,
            vec![
                ResultStatus::Success,
                ResultStatus::Failed,
                ResultStatus::Skipped,
                ResultStatus::Success
            ]
        );
        assert_eq!(acc.rows()[3].note.as_deref(), Some("중복 ISBN (이전 행 1)"));
        assert_eq!(http.calls(), 2);
    }
}
