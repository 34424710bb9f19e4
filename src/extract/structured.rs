//! Embedded structured data (`ld+json` blocks and JSON islands).

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

use super::price::json_price;
use super::text::normalize_isbn;

static SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());
static OG_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());

/// Collect every structured-data object embedded in the page.
///
/// Picks up `<script type="...ld+json">` blocks plus any script whose `id` is
/// listed in `island_ids`. Blocks that fail to parse are dropped; top-level
/// arrays are flattened into their object members.
pub fn extract_structured_book_data(document: &Html, island_ids: &[String]) -> Vec<Value> {
    let mut blocks = Vec::new();

    for script in document.select(&SCRIPT) {
        let attrs = script.value();
        let is_ld = attrs
            .attr("type")
            .is_some_and(|t| t.to_ascii_lowercase().contains("ld+json"));
        let is_island = attrs
            .attr("id")
            .is_some_and(|id| island_ids.iter().any(|i| i == id));
        if !is_ld && !is_island {
            continue;
        }

        let raw: String = script.text().collect();
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => blocks.push(Value::Object(map)),
            Ok(Value::Array(items)) => {
                blocks.extend(items.into_iter().filter(|v| v.is_object()));
            }
            Ok(_) => {}
            Err(e) => debug!("Skipping unparseable structured data block: {}", e),
        }
    }

    blocks
}

fn is_book_like(node: &Value) -> bool {
    let declared = match node.get("@type") {
        Some(Value::String(s)) => s.to_lowercase(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase(),
        _ => return false,
    };
    declared.contains("book") || declared.contains("product")
}

/// First object typed as a book or product, looking one level into `@graph`
/// arrays when nothing matches at the top.
pub fn pick_book_like(blocks: &[Value]) -> Option<&Value> {
    if let Some(found) = blocks.iter().find(|b| is_book_like(b)) {
        return Some(found);
    }

    blocks
        .iter()
        .filter_map(|b| b.get("@graph").and_then(|g| g.as_array()))
        .flatten()
        .find(|node| node.is_object() && is_book_like(node))
}

/// A person/organisation reference that may be one name or several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Names {
    Name(String),
    NameList(Vec<String>),
}

impl Names {
    /// Accepts `{"name": ..}`, a bare string, or a list mixing both.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) | Value::Object(_) => single_name(value).map(Names::Name),
            Value::Array(items) => {
                let names: Vec<String> = items.iter().filter_map(single_name).collect();
                if names.is_empty() {
                    None
                } else {
                    Some(Names::NameList(names))
                }
            }
            _ => None,
        }
    }

    /// Comma-joined display form.
    pub fn joined(&self) -> String {
        match self {
            Names::Name(name) => name.clone(),
            Names::NameList(names) => names.join(", "),
        }
    }
}

fn single_name(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("name")?.as_str()?,
        _ => return None,
    };
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Fields read from a book-typed structured-data object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFields {
    pub title: Option<String>,
    pub isbn: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub offer_price: Option<u64>,
}

impl BookFields {
    pub fn from_block(book: &Value) -> Self {
        let title = book
            .get("name")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        let isbn = ["isbn", "ISBN"]
            .iter()
            .filter_map(|k| book.get(*k))
            .find_map(|v| match v {
                Value::String(s) => normalize_isbn(s),
                Value::Number(n) => normalize_isbn(&n.to_string()),
                _ => None,
            });

        Self {
            title,
            isbn,
            author: book.get("author").and_then(Names::from_json).map(|n| n.joined()),
            publisher: book
                .get("publisher")
                .and_then(Names::from_json)
                .map(|n| n.joined()),
            offer_price: book.get("offers").and_then(offer_price),
        }
    }

    /// Parse the page and read the first book-like block, if any.
    pub fn from_document(document: &Html, island_ids: &[String]) -> Self {
        let blocks = extract_structured_book_data(document, island_ids);
        pick_book_like(&blocks)
            .map(Self::from_block)
            .unwrap_or_default()
    }
}

fn offer_price(offers: &Value) -> Option<u64> {
    match offers {
        Value::Object(_) => offers.get("price").and_then(json_price),
        Value::Array(items) => items
            .iter()
            .filter_map(|o| o.get("price"))
            .find_map(json_price),
        _ => None,
    }
}

/// `<meta property="og:title">` content.
pub fn og_title(document: &Html) -> Option<String> {
    document
        .select(&OG_TITLE)
        .filter_map(|m| m.value().attr("content"))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(String::from)
}
