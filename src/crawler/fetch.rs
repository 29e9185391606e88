//! Page fetching over the authenticated session
//!
//! One GET per call; retry and backoff live in the caller's
//! [`RetryPolicy`](crate::retry::RetryPolicy), never here.

use crate::FetchError;
use reqwest::Client;
use tracing::debug;

/// Fetches a page body through the session client
///
/// Non-2xx statuses and transport errors both come back as [`FetchError`];
/// the crawl loop treats either as transient and retries.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, FetchError> {
    debug!("Fetching {}", url);

    let response = client.get(url).send().await.map_err(|e| FetchError::Http {
        url: url.to_string(),
        source: e,
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| FetchError::Http {
        url: url.to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let client = Client::new();
        let body = fetch_page(&client, &format!("{}/page", server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = Client::new();
        let result = fetch_page(&client, &format!("{}/gone", server.uri())).await;
        assert!(matches!(
            result,
            Err(FetchError::Status { status: 503, .. })
        ));
    }

    #[tokio::test]
    async fn test_connection_failure_is_error() {
        let client = Client::new();
        // Port 9 (discard) is assumed closed.
        let result = fetch_page(&client, "http://127.0.0.1:9/page").await;
        assert!(matches!(result, Err(FetchError::Http { .. })));
    }
}
