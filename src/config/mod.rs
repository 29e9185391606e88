//! Configuration loading and validation
//!
//! Cepage is configured from a single TOML file: site URLs, credentials,
//! crawl pacing/retry bounds, and the record output path.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{Config, CrawlerConfig, CredentialsConfig, OutputConfig, SiteConfig};
pub use validation::validate;
