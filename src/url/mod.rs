//! URL normalization for hierarchy hrefs
//!
//! The hierarchy listing mixes absolute links, protocol-relative links,
//! root-relative paths and plain relative paths. Everything is canonicalized
//! against the configured base origin before it touches the work queue, so
//! the visited set only ever compares absolute URLs.

use crate::UrlError;
use url::Url;

/// Canonicalizes an href against a base origin
///
/// Rules, applied in priority order:
///
/// 1. Already has an `http`/`https` scheme: returned unchanged.
/// 2. Protocol-relative (`//host/...`): prefixed with `https:`.
/// 3. Root-relative (`/path`): resolved against the scheme+host of the
///    base origin only.
/// 4. Anything else: joined relative to `base_origin + "/"`.
///
/// Rule 3 must run before rule 4, or root-relative paths would pick up the
/// base origin's path component and come out double-prefixed.
///
/// Callers must reject empty hrefs before calling; an empty href is a
/// precondition violation, not an input this function classifies.
///
/// # Examples
///
/// ```
/// use cepage::url::normalize_href;
///
/// let url = normalize_href("/study/wine", "https://example.com/guides").unwrap();
/// assert_eq!(url, "https://example.com/study/wine");
/// ```
pub fn normalize_href(href: &str, base_origin: &str) -> Result<String, UrlError> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Ok(href.to_string());
    }

    if href.starts_with("//") {
        return Ok(format!("https:{}", href));
    }

    if href.starts_with('/') {
        let origin = origin_of(base_origin)?;
        return Ok(format!("{}{}", origin, href));
    }

    // Relative path: join against the base origin with exactly one
    // trailing slash so the last path segment is treated as a directory.
    let base = format!("{}/", base_origin.trim_end_matches('/'));
    let base = Url::parse(&base).map_err(|e| UrlError::Parse(e.to_string()))?;
    let joined = base
        .join(href)
        .map_err(|e| UrlError::Malformed(format!("{}: {}", href, e)))?;

    Ok(joined.to_string())
}

/// Returns the scheme+host(+port) root of a base origin, without any path
///
/// # Examples
///
/// ```
/// use cepage::url::origin_of;
///
/// assert_eq!(origin_of("https://example.com/a/b").unwrap(), "https://example.com");
/// ```
pub fn origin_of(base_origin: &str) -> Result<String, UrlError> {
    let base = Url::parse(base_origin).map_err(|e| UrlError::Parse(e.to_string()))?;
    let host = base
        .host_str()
        .ok_or_else(|| UrlError::MissingHost(base_origin.to_string()))?;

    match base.port() {
        Some(port) => Ok(format!("{}://{}:{}", base.scheme(), host, port)),
        None => Ok(format!("{}://{}", base.scheme(), host)),
    }
}
