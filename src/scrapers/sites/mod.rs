//! Per-store extractors and the tiered fetch runner they share.
//!
//! An extractor never fetches. It turns one fetched page into a record and
//! says whether that record is good enough or the next tier should be tried.
//! HTML parsing happens inside the synchronous `evaluate` so parsed documents
//! never live across an await point.

mod aladin;
mod kyobo;
mod yes24;
mod ypbooks;

pub use aladin::AladinExtractor;
pub use kyobo::KyoboExtractor;
pub use yes24::Yes24Extractor;
pub use ypbooks::YpbooksExtractor;

use scraper::Html;
use tracing::{debug, info, warn};

use super::config::{PricePolicy, SiteStrategy, StrategyTier};
use super::error::ScrapeError;
use super::fetch::{PageFetcher, ProbedPrices, RenderOptions, RenderedFetcher};
use crate::extract::{og_title, page_text, BookFields};
use crate::models::{ParseMode, ResultRecord, ResultStatus, SiteId};

pub const OUT_OF_STOCK_MESSAGE: &str = "품절/재고없음 도서";

/// A fetched page as seen by an extractor.
#[derive(Debug, Clone, Copy)]
pub struct PageInput<'a> {
    pub final_url: &'a str,
    pub html: &'a str,
    /// Prices read from the live DOM, when the tier probed for them.
    pub probed: Option<ProbedPrices>,
}

/// Outcome of parsing one tier's page.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Final; stop here.
    Accept(ResultRecord),
    /// Not good enough; try the next tier. Returned as-is on the last tier.
    Next(ResultRecord),
}

impl Verdict {
    pub fn into_record(self) -> ResultRecord {
        match self {
            Self::Accept(r) | Self::Next(r) => r,
        }
    }
}

pub trait SiteExtractor: Send + Sync {
    fn site(&self) -> SiteId;

    /// Store-specific product identifier from the requested URL.
    fn product_id(&self, url: &str) -> Option<String>;

    /// Parse one page fetched by `tier`.
    fn evaluate(
        &self,
        page: PageInput<'_>,
        product_id: Option<String>,
        tier: StrategyTier,
        strategy: &SiteStrategy,
    ) -> Verdict;
}

pub fn parse_mode(tier: StrategyTier) -> ParseMode {
    if tier.is_rendered() {
        ParseMode::Rendered
    } else {
        ParseMode::Static
    }
}

/// Walk the configured tiers until one yields an accepted record.
///
/// A failed fetch on a non-final tier is logged and skipped; on the final
/// tier it is returned to the caller.
pub async fn run_strategies(
    extractor: &dyn SiteExtractor,
    url: &str,
    strategy: &SiteStrategy,
    http: &dyn PageFetcher,
    browser: &dyn RenderedFetcher,
) -> Result<ResultRecord, ScrapeError> {
    let site = extractor.site();
    let product_id = extractor.product_id(url);
    let tiers: &[StrategyTier] = if strategy.strategies.is_empty() {
        &[StrategyTier::Static]
    } else {
        &strategy.strategies
    };

    for (i, tier) in tiers.iter().copied().enumerate() {
        let is_last = i + 1 == tiers.len();
        debug!("{}: trying {:?} tier for {}", site, tier, url);

        let verdict = match tier {
            StrategyTier::Static => match http.fetch(url).await {
                Ok(page) => extractor.evaluate(
                    PageInput {
                        final_url: &page.final_url,
                        html: &page.html,
                        probed: None,
                    },
                    product_id.clone(),
                    tier,
                    strategy,
                ),
                Err(e) if !is_last => {
                    warn!("{}: static fetch failed for {}: {}", site, url, e);
                    continue;
                }
                Err(e) => return Err(e),
            },
            StrategyTier::Rendered | StrategyTier::RenderedWithProbe => {
                let options = RenderOptions {
                    settle_ms: strategy.settle_ms,
                    navigation_timeout: strategy.navigation_timeout,
                    probe: match tier {
                        StrategyTier::RenderedWithProbe => strategy.price_probe.as_ref(),
                        _ => None,
                    },
                };
                match browser.render(url, options).await {
                    Ok(page) => extractor.evaluate(
                        PageInput {
                            final_url: &page.final_url,
                            html: &page.html,
                            probed: options.probe.map(|_| page.probed),
                        },
                        product_id.clone(),
                        tier,
                        strategy,
                    ),
                    Err(e) if !is_last => {
                        warn!("{}: rendered fetch failed for {}: {}", site, url, e);
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        match verdict {
            Verdict::Accept(record) => return Ok(record),
            Verdict::Next(record) if is_last => return Ok(record),
            Verdict::Next(record) => {
                info!(
                    "{}: escalating {} past {:?} tier (price={:?}, reason={})",
                    site,
                    url,
                    tier,
                    record.effective_price(),
                    record.error.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Err(ScrapeError::Browser(format!(
        "No fetch tier produced a page for {}",
        url
    )))
}

/// Structured data with the og:title fallback applied.
pub(crate) fn book_fields(document: &Html, strategy: &SiteStrategy) -> BookFields {
    let mut fields = BookFields::from_document(document, &strategy.island_ids);
    if fields.title.is_none() {
        fields.title = og_title(document);
    }
    fields
}

/// Start a record from structured fields. Both prices take the offer price.
pub(crate) fn record_from_fields(
    site: SiteId,
    page: &PageInput<'_>,
    product_id: Option<String>,
    tier: StrategyTier,
    fields: BookFields,
) -> ResultRecord {
    let mut record = ResultRecord::parsed(site, page.final_url, product_id, parse_mode(tier));
    record.title = fields.title;
    record.isbn = fields.isbn;
    record.author = fields.author;
    record.publisher = fields.publisher;
    record.list_price = fields.offer_price;
    record.sale_price = fields.offer_price;
    record
}

/// Visible text of a parsed document.
pub(crate) fn visible_text(document: &Html) -> String {
    page_text(document)
}

/// Force the out-of-stock outcome when the text matches a configured pattern.
pub(crate) fn apply_out_of_stock(
    record: &mut ResultRecord,
    text: &str,
    strategy: &SiteStrategy,
) -> bool {
    if strategy.out_of_stock.is_empty() {
        return false;
    }
    let Some(found) = strategy.out_of_stock.find(text) else {
        return false;
    };

    info!("{}: out of stock ({:?}) at {}", record.site, found, record.url);
    let price = strategy.sold_out_pricing.value();
    record.list_price = price;
    record.sale_price = price;
    record.status = ResultStatus::Failed;
    record.error = Some(OUT_OF_STOCK_MESSAGE.to_string());
    true
}

/// Whether the record meets the store's success bar.
pub(crate) fn meets_policy(record: &ResultRecord, policy: PricePolicy) -> bool {
    let identified = record.title.is_some() || record.isbn.is_some();
    match policy {
        PricePolicy::Required => {
            identified && (record.sale_price.is_some() || record.list_price.is_some())
        }
        PricePolicy::Optional => identified || record.sale_price.is_some_and(|p| p > 0),
    }
}

/// Shared finish for stores without price-probe handling.
pub(crate) fn finish(
    mut record: ResultRecord,
    text: &str,
    strategy: &SiteStrategy,
    failure: &str,
) -> Verdict {
    if apply_out_of_stock(&mut record, text, strategy) {
        return Verdict::Accept(record);
    }

    let plausible = strategy.suspicion_floor.is_none()
        || !strategy.is_suspicious(record.effective_price());

    if meets_policy(&record, strategy.price_policy) && plausible {
        record.status = ResultStatus::Success;
        record.error = None;
        Verdict::Accept(record)
    } else {
        record.status = ResultStatus::Failed;
        record.error = Some(failure.to_string());
        Verdict::Next(record)
    }
}
