//! The normalized per-URL result row.

use serde::{Deserialize, Serialize};

use super::SiteId;

/// Shown when the caller disabled a store for this batch.
pub const SKIPPED_MESSAGE: &str = "해당 서점이 비활성화(토글 OFF) 상태라 건너뛰었습니다.";
/// Shown for URLs outside the supported stores.
pub const UNSUPPORTED_MESSAGE: &str = "지원하지 않는 URL 도메인입니다.";

/// Terminal classification of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Failed,
    Skipped,
}

impl ResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Which strategy produced the kept record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Plain HTTP fetch.
    Static,
    /// Headless browser render.
    Rendered,
    Skipped,
    Unknown,
    Exception,
}

impl ParseMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Rendered => "rendered",
            Self::Skipped => "skipped",
            Self::Unknown => "unknown",
            Self::Exception => "exception",
        }
    }
}

/// One row per input URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub site: SiteId,
    /// Final URL after redirects (the input URL when nothing was fetched).
    pub url: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    /// Won, no minor unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_price: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_price: Option<u64>,
    pub parse_mode: ParseMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResultRecord {
    fn bare(site: SiteId, url: &str, status: ResultStatus, mode: ParseMode) -> Self {
        Self {
            site,
            url: url.to_string(),
            status,
            product_id: None,
            isbn: None,
            title: None,
            author: None,
            publisher: None,
            list_price: None,
            sale_price: None,
            parse_mode: mode,
            error: None,
        }
    }

    /// Empty failed record for a parse attempt; the extractor fills it in.
    pub fn parsed(site: SiteId, url: &str, product_id: Option<String>, mode: ParseMode) -> Self {
        let mut record = Self::bare(site, url, ResultStatus::Failed, mode);
        record.product_id = product_id;
        record
    }

    /// Record for a store the caller switched off. No content fields.
    pub fn skipped(site: SiteId, url: &str) -> Self {
        let mut record = Self::bare(site, url, ResultStatus::Skipped, ParseMode::Skipped);
        record.error = Some(SKIPPED_MESSAGE.to_string());
        record
    }

    /// Record for a URL no extractor handles.
    pub fn unsupported(url: &str) -> Self {
        let mut record = Self::bare(
            SiteId::Unknown,
            url,
            ResultStatus::Failed,
            ParseMode::Unknown,
        );
        record.error = Some(UNSUPPORTED_MESSAGE.to_string());
        record
    }

    /// Record for an extractor that errored out.
    pub fn exception(site: SiteId, url: &str, kind: &str, message: &str) -> Self {
        let mut record = Self::bare(site, url, ResultStatus::Failed, ParseMode::Exception);
        record.error = Some(format!("예외 발생: {}: {}", kind, message));
        record
    }

    /// Sale price, falling back to list price.
    pub fn effective_price(&self) -> Option<u64> {
        self.sale_price.or(self.list_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_has_no_content() {
        let r = ResultRecord::skipped(SiteId::Kyobo, "https://product.kyobobook.co.kr/detail/S1");
        assert_eq!(r.status, ResultStatus::Skipped);
        assert_eq!(r.parse_mode, ParseMode::Skipped);
        assert!(r.title.is_none() && r.isbn.is_none() && r.product_id.is_none());
        assert!(r.list_price.is_none() && r.sale_price.is_none());
        assert_eq!(r.error.as_deref(), Some(SKIPPED_MESSAGE));
    }

    #[test]
    fn test_exception_message_embeds_kind() {
        let r = ResultRecord::exception(SiteId::Yes24, "u", "Timeout", "took too long");
        assert_eq!(r.status, ResultStatus::Failed);
        assert_eq!(r.parse_mode, ParseMode::Exception);
        assert_eq!(r.error.as_deref(), Some("예외 발생: Timeout: took too long"));
    }

    #[test]
    fn test_serialized_vocabulary() {
        let r = ResultRecord::unsupported("https://example.com");
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["site"], "UNKNOWN");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["parse_mode"], "unknown");
        assert!(json.get("isbn").is_none());
    }
}
