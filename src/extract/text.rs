//! Heuristic scans over the visible page text.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

use super::price::parse_price;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static ISBN_LABELED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"ISBN(?:-?13)?\s*[:：\-]?\s*(97[89]\d{10})").unwrap());
static ISBN_BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(97[89]\d{10})(?:\D|$)").unwrap());
static ISBN_HYPHENATED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(97[89](?:[ \-]?\d){10})(?:\D|$)").unwrap());

static PUBLISHER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"출판사\s*[:：]?\s*([0-9A-Za-z가-힣&().,·'\- ]{1,30})").unwrap()
});

static LIST_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"정가").unwrap());
static SALE_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"판매가|할인가|판매\s*가격").unwrap());
static WON_AMOUNT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d[\d,]*)\s*원").unwrap());

/// Labels that follow the publisher name in detail tables.
const PUBLISHER_STOP_LABELS: &[&str] = &[
    "출간일", "발행일", "출판일", "발매일", "쪽수", "페이지", "정가", "판매가", "ISBN", "저자",
    "지은이", "역자", "옮긴이", "크기",
];

const PUBLISHER_MAX_CHARS: usize = 30;
/// Characters searched after a price label.
const LABEL_WINDOW_CHARS: usize = 60;
/// Characters checked before an unlabeled amount for banned context.
const CONTEXT_WINDOW_CHARS: usize = 25;

const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Text nodes outside script/style containers, trimmed, in document order.
pub fn text_nodes(document: &Html) -> Vec<String> {
    document
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let hidden = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
            });
            if hidden {
                return None;
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

/// Visible page text joined with single spaces.
pub fn page_text(document: &Html) -> String {
    normalize_whitespace(&text_nodes(document).join(" "))
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

/// Digits of an ISBN-13 with a 978/979 prefix. Anything else is rejected.
pub(crate) fn normalize_isbn(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|ch| ch.is_ascii_digit()).collect();
    (digits.len() == 13 && (digits.starts_with("978") || digits.starts_with("979")))
        .then_some(digits)
}

/// Find a 13-digit 978/979 ISBN, preferring one next to an `ISBN` label.
pub fn scan_isbn(text: &str) -> Option<String> {
    let text = normalize_whitespace(text);

    if let Some(c) = ISBN_LABELED.captures(&text) {
        return Some(c[1].to_string());
    }
    if let Some(c) = ISBN_BARE.captures(&text) {
        return Some(c[1].to_string());
    }
    ISBN_HYPHENATED
        .captures(&text)
        .map(|c| c[1].chars().filter(|ch| ch.is_ascii_digit()).collect())
}

/// Publisher name following a `출판사` label.
pub fn scan_publisher(text: &str) -> Option<String> {
    let text = normalize_whitespace(text);
    let captured = PUBLISHER.captures(&text)?.get(1)?.as_str();

    let cut = PUBLISHER_STOP_LABELS
        .iter()
        .filter_map(|label| captured.find(label))
        .min()
        .unwrap_or(captured.len());

    let name: String = captured[..cut]
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '：' | ',' | '-' | '·'))
        .chars()
        .take(PUBLISHER_MAX_CHARS)
        .collect();

    (!name.is_empty()).then_some(name)
}

/// Amount in won within `window` characters after any `label` match.
fn labeled_price(text: &str, label: &Regex, window: usize) -> Option<u64> {
    label.find_iter(text).find_map(|m| {
        let rest = &text[m.end()..];
        let end = rest
            .char_indices()
            .nth(window)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        WON_AMOUNT
            .captures(&rest[..end])
            .and_then(|c| parse_price(c.get(1).map(|g| g.as_str())))
    })
}

/// The characters immediately preceding byte offset `at`.
fn preceding_chars(text: &str, at: usize, count: usize) -> &str {
    let head = &text[..at];
    let start = head
        .char_indices()
        .rev()
        .nth(count.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    &head[start..]
}

/// Whether `context` mentions any banned word (shipping, points, coupons, ...).
pub fn has_banned_context(context: &str, banned: &[String]) -> bool {
    banned.iter().any(|word| context.contains(word.as_str()))
}

/// First won amount in the text whose leading context is clean.
fn first_clean_amount(text: &str, banned: &[String]) -> Option<u64> {
    WON_AMOUNT.captures_iter(text).find_map(|c| {
        let whole = c.get(0)?;
        let context = preceding_chars(text, whole.start(), CONTEXT_WINDOW_CHARS);
        if has_banned_context(context, banned) {
            return None;
        }
        parse_price(c.get(1).map(|g| g.as_str())).filter(|v| *v > 0)
    })
}

/// `(list, sale)` from labelled amounts in the page text.
///
/// When no labelled sale price exists the first unlabelled amount is used,
/// unless shipping/points/coupon style words precede it.
pub fn scan_prices_from_text(text: &str, banned: &[String]) -> (Option<u64>, Option<u64>) {
    let text = normalize_whitespace(text);

    let list = labeled_price(&text, &LIST_LABEL, LABEL_WINDOW_CHARS);
    let sale = labeled_price(&text, &SALE_LABEL, LABEL_WINDOW_CHARS)
        .or_else(|| first_clean_amount(&text, banned));

    (list, sale)
}
