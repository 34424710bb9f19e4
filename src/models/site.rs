//! Bookstore identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported bookstores plus the catch-all for unrecognised domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SiteId {
    Yes24,
    Aladin,
    Kyobo,
    Ypbooks,
    Unknown,
}

impl SiteId {
    /// The four bookstores that have an extractor.
    pub const SUPPORTED: [SiteId; 4] = [Self::Yes24, Self::Aladin, Self::Kyobo, Self::Ypbooks];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes24 => "YES24",
            Self::Aladin => "ALADIN",
            Self::Kyobo => "KYOBO",
            Self::Ypbooks => "YPBOOKS",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parse a site name case-insensitively.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YES24" => Some(Self::Yes24),
            "ALADIN" => Some(Self::Aladin),
            "KYOBO" => Some(Self::Kyobo),
            "YPBOOKS" => Some(Self::Ypbooks),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// Hostname fragment identifying this store.
    pub fn domain(&self) -> Option<&'static str> {
        match self {
            Self::Yes24 => Some("yes24.com"),
            Self::Aladin => Some("aladin.co.kr"),
            Self::Kyobo => Some("kyobobook.co.kr"),
            Self::Ypbooks => Some("ypbooks.co.kr"),
            Self::Unknown => None,
        }
    }

    /// Classify a product URL by hostname.
    ///
    /// Falls back to a substring match on the raw string when the URL does
    /// not parse, so scheme-less input like `www.yes24.com/Product/Goods/1`
    /// still resolves.
    pub fn detect(url: &str) -> Self {
        let haystack = url::Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
            .unwrap_or_else(|| url.to_ascii_lowercase());

        Self::SUPPORTED
            .into_iter()
            .find(|site| site.domain().is_some_and(|d| haystack.contains(d)))
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
