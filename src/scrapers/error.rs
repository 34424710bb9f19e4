//! Fetch-layer error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{0}")]
    Browser(String),
    #[error("Timed out after {secs}s loading {url}")]
    Timeout { secs: u64, url: String },
}

impl ScrapeError {
    /// Category name shown in exception records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status { .. } => "HttpStatusError",
            Self::Transport(e) if e.is_timeout() => "TimeoutError",
            Self::Transport(_) => "RequestError",
            Self::Browser(_) => "BrowserError",
            Self::Timeout { .. } => "TimeoutError",
        }
    }
}

impl From<anyhow::Error> for ScrapeError {
    fn from(e: anyhow::Error) -> Self {
        Self::Browser(format!("{:#}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_and_messages() {
        let e = ScrapeError::Status {
            status: 403,
            url: "https://www.yes24.com/Product/Goods/1".to_string(),
        };
        assert_eq!(e.kind(), "HttpStatusError");
        assert_eq!(e.to_string(), "HTTP 403 for https://www.yes24.com/Product/Goods/1");

        let e = ScrapeError::Timeout {
            secs: 45,
            url: "https://product.kyobobook.co.kr/detail/S000001".to_string(),
        };
        assert_eq!(e.kind(), "TimeoutError");
    }

    #[test]
    fn test_anyhow_context_is_kept() {
        let e: ScrapeError = anyhow::anyhow!("no chrome")
            .context("Failed to launch browser")
            .into();
        assert_eq!(e.kind(), "BrowserError");
        assert_eq!(e.to_string(), "Failed to launch browser: no chrome");
    }
}
