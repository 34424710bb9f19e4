//! Data models for bookfill.

mod record;
mod site;

pub use record::{ParseMode, ResultRecord, ResultStatus, SKIPPED_MESSAGE, UNSUPPORTED_MESSAGE};
pub use site::SiteId;
