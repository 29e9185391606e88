use serde::Deserialize;

/// Main configuration structure for cepage
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub credentials: CredentialsConfig,
    pub crawler: CrawlerConfig,
    pub output: OutputConfig,
}

/// Site URLs
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Base origin every relative href is normalized against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Login page holding the anti-forgery tokens
    #[serde(rename = "login-url")]
    pub login_url: String,

    /// Root of the hierarchy walk (the secure-area start page)
    #[serde(rename = "start-url")]
    pub start_url: String,
}

/// Login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    pub password: String,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Attempt bound for every retried operation (fetches, render waits)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Lower bound of the jittered delay between requests (milliseconds)
    #[serde(rename = "min-delay-ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the jittered delay between requests (milliseconds)
    #[serde(rename = "max-delay-ms")]
    pub max_delay_ms: u64,

    /// Backoff time unit: the sleep before retry n is 2^n of these
    #[serde(rename = "retry-base-ms", default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    /// Optional node budget; absent means the walk is bounded only by the
    /// hierarchy itself
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<usize>,
}

fn default_retry_base_ms() -> u64 {
    1000
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON-lines record file
    #[serde(rename = "records-path")]
    pub records_path: String,
}
