//! URL handling for fathom
//!
//! The crawler treats URLs as opaque strings and performs no normalization;
//! the only thing it ever derives from a URL is its host, the unit of
//! per-host throttling.

use crate::{UrlError, UrlResult};
use url::{Position, Url};

/// Extracts the host of a URL in `scheme://authority` form.
///
/// All URLs sharing this prefix share one admission queue and therefore one
/// per-host concurrency budget. The authority keeps any explicit port, so
/// `http://example.com` and `http://example.com:8080` are distinct hosts.
///
/// # Arguments
///
/// * `url` - The URL string to derive the host from
///
/// # Returns
///
/// * `Ok(String)` - The `scheme://authority` prefix
/// * `Err(UrlError)` - The URL is malformed or has no host
///
/// # Examples
///
/// ```
/// use fathom::url::host_of;
///
/// assert_eq!(
///     host_of("https://example.com/a/b?q=1").unwrap(),
///     "https://example.com"
/// );
/// assert_eq!(
///     host_of("http://example.com:8080/x").unwrap(),
///     "http://example.com:8080"
/// );
/// assert!(host_of("not a url").is_err());
/// ```
pub fn host_of(url: &str) -> UrlResult<String> {
    let parsed = Url::parse(url).map_err(|e| UrlError::Parse(format!("{url}: {e}")))?;

    if parsed.host_str().is_none() {
        return Err(UrlError::MissingHost(url.to_string()));
    }

    Ok(parsed[..Position::BeforePath].to_string())
}
