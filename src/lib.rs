//! Cepage: a compendium harvester for session-gated wine references
//!
//! This crate implements a crawler that logs into a session-gated reference
//! site, walks its nested appellation hierarchy breadth-first, and extracts
//! structured compendium records from leaf pages.

pub mod auth;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod retry;
pub mod sink;
pub mod url;

use thiserror::Error;

/// Fatal errors that abort a run
///
/// Everything here terminates the crawl immediately. Node-local trouble
/// (an unreachable page, a page whose structure does not match) is handled
/// inside the crawl loop and never surfaces through this type.
#[derive(Debug, Error)]
pub enum CepageError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Authentication errors
///
/// `FormMissing` and `TokenMissing` are setup errors: the login page no
/// longer has the structure we expect, so retrying cannot help. `Rejected`
/// means the credentials were refused. All three are fatal.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Failed to load login page {url}: {source}")]
    PageLoad { url: String, source: reqwest::Error },

    #[error("Cancelled during login")]
    Cancelled,

    #[error("Login form not present on {url}")]
    FormMissing { url: String },

    #[error("Hidden token {name} missing from login form")]
    TokenMissing { name: String },

    #[error("Failed to submit credentials: {0}")]
    Submit(#[source] reqwest::Error),

    #[error("Credentials rejected by the login endpoint")]
    Rejected,
}

/// Transient fetch errors, retried by the crawl loop
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request for {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Base origin has no host: {0}")]
    MissingHost(String),

    #[error("Malformed href: {0}")]
    Malformed(String),
}

/// Result type alias for cepage operations
pub type Result<T> = std::result::Result<T, CepageError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use auth::{AuthSession, Authenticator};
pub use config::Config;
pub use crawler::{CrawlStats, Crawler};
pub use sink::{FieldValue, JsonLinesSink, MemorySink, Record, RecordSink};
pub use url::{normalize_href, origin_of};
