use crate::config::types::Config;
use crate::ConfigError;
use url::Url;

/// Validates a parsed configuration
///
/// Checks that the site URLs are absolute http(s) URLs, credentials are
/// non-empty, the retry bound allows at least one attempt, and the pacing
/// window is well-ordered.
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    check_url("site.base-url", &config.site.base_url)?;
    check_url("site.login-url", &config.site.login_url)?;
    check_url("site.start-url", &config.site.start_url)?;

    if config.credentials.username.trim().is_empty() {
        return Err(ConfigError::Validation(
            "credentials.username must not be empty".to_string(),
        ));
    }
    if config.credentials.password.is_empty() {
        return Err(ConfigError::Validation(
            "credentials.password must not be empty".to_string(),
        ));
    }

    if config.crawler.max_retries < 1 {
        return Err(ConfigError::Validation(
            "crawler.max-retries must be at least 1".to_string(),
        ));
    }

    if config.crawler.min_delay_ms > config.crawler.max_delay_ms {
        return Err(ConfigError::Validation(format!(
            "crawler.min-delay-ms ({}) must not exceed crawler.max-delay-ms ({})",
            config.crawler.min_delay_ms, config.crawler.max_delay_ms
        )));
    }

    if config.output.records_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output.records-path must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn check_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("{}: {} ({})", key, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{}: expected http or https, got {}",
            key,
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!("{}: missing host", key)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{CrawlerConfig, CredentialsConfig, OutputConfig, SiteConfig};

    fn valid_config() -> Config {
        Config {
            site: SiteConfig {
                base_url: "https://example.com".to_string(),
                login_url: "https://example.com/login".to_string(),
                start_url: "https://example.com/study".to_string(),
            },
            credentials: CredentialsConfig {
                username: "taster".to_string(),
                password: "barrel-sample".to_string(),
            },
            crawler: CrawlerConfig {
                max_retries: 3,
                min_delay_ms: 100,
                max_delay_ms: 500,
                retry_base_ms: 1000,
                max_pages: None,
            },
            output: OutputConfig {
                records_path: "./records.jsonl".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let mut config = valid_config();
        config.site.login_url = "ftp://example.com/login".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rejects_relative_url() {
        let mut config = valid_config();
        config.site.start_url = "/study".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_empty_username() {
        let mut config = valid_config();
        config.credentials.username = "  ".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_empty_password() {
        let mut config = valid_config();
        config.credentials.password = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_retries() {
        let mut config = valid_config();
        config.crawler.max_retries = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_inverted_delay_window() {
        let mut config = valid_config();
        config.crawler.min_delay_ms = 900;
        config.crawler.max_delay_ms = 100;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_empty_records_path() {
        let mut config = valid_config();
        config.output.records_path = String::new();
        assert!(validate(&config).is_err());
    }
}
