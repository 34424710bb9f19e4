//! Text and markup utilities shared by the per-site extractors.
//!
//! - `price`: price-string normalization
//! - `structured`: `ld+json` blocks, book-like object selection, og:title
//! - `page_state`: price recovery from the embedded render-state blob
//! - `text`: ISBN / publisher / price scans over visible text
//! - `stock`: out-of-stock phrase detection

mod page_state;
mod price;
mod stock;
mod structured;
mod text;

pub use page_state::{default_exclusions, extract_structured_page_data_prices, PageStatePolicy};
pub use price::{format_won, parse_price};
pub use stock::StockMatcher;
pub use structured::{
    extract_structured_book_data, og_title, pick_book_like, BookFields, Names,
};
pub use text::{
    has_banned_context, page_text, scan_isbn, scan_prices_from_text, scan_publisher, text_nodes,
};

/// Words that, shortly before an amount, mark it as something other than
/// the book's price.
pub fn default_banned_context() -> Vec<String> {
    [
        "배송비",
        "배송",
        "적립",
        "포인트",
        "쿠폰",
        "회원가",
        "최대 할인",
        "최대할인",
        "캐시백",
        "마일리지",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
