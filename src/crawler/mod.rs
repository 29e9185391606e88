//! Hierarchy traversal engine
//!
//! This module contains the breadth-first crawl over the site's content
//! tree: page fetching over the authenticated session, DOM classification
//! of each node as branch or leaf, and the coordinator loop that owns the
//! work queue and visited set.

mod coordinator;
mod fetch;
pub mod page;

pub use coordinator::{CrawlStats, Crawler};
pub use fetch::fetch_page;
pub use page::{classify_page, ChildEntry, PageView};
