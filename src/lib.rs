//! bookfill - book metadata from Korean online bookstore product pages.
//!
//! Given YES24, ALADIN, KYOBO or YPBOOKS product URLs, extracts ISBN, title,
//! author, publisher and list/sale price, escalating from a static fetch to a
//! headless render when the static page is incomplete or misleading.

pub mod batch;
pub mod cli;
pub mod config;
pub mod extract;
pub mod models;
pub mod scrapers;
