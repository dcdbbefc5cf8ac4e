//! HTTP downloader implementation
//!
//! This module handles the actual network side of crawling:
//! - Building a reqwest client with proper user agent and timeouts
//! - GET requests with status and transport error classification
//! - Link extraction from fetched HTML via scraper

use crate::config::HttpConfig;
use crate::downloader::{Document, Downloader};
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP client configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Production [`Downloader`] backed by reqwest
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Creates a downloader from HTTP configuration.
    pub fn new(config: &HttpConfig) -> crate::Result<Self> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    /// Creates a downloader around an existing client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::Malformed(format!("{url}: {e}")))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        // Resolve links against the post-redirect URL, not the requested one
        let final_url = response.url().clone();

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        tracing::trace!(url, bytes = body.len(), "page downloaded");

        Ok(Box::new(HttpDocument { final_url, body }))
    }
}

/// Classifies a reqwest transport error into a [`FetchError`]
fn classify_transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Network("request timeout".to_string())
    } else if err.is_connect() {
        FetchError::Network(format!("connection failed: {err}"))
    } else {
        FetchError::Network(err.to_string())
    }
}

/// A fetched HTML page
pub struct HttpDocument {
    final_url: Url,
    body: String,
}

#[async_trait]
impl Document for HttpDocument {
    async fn extract_links(&self) -> Result<Vec<String>, FetchError> {
        Ok(collect_links(&self.body, &self.final_url))
    }
}

/// Extracts all followable links from an HTML body as absolute URLs.
///
/// Anchors with a `download` attribute are skipped, as are hrefs that fail
/// to resolve or resolve to a non-HTTP(S) scheme. Kept in a plain function
/// so the non-`Send` scraper DOM never crosses an await point.
fn collect_links(html: &str, base_url: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    if let Ok(selector) = Selector::parse("a[href]") {
        for element in document.select(&selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(href) = element.value().attr("href") {
                if let Some(absolute) = resolve_link(href, base_url) {
                    links.push(absolute);
                }
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links (same page anchors)
/// - Invalid URLs or non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(mut absolute) => {
            if absolute.scheme() != "http" && absolute.scheme() != "https" {
                return None;
            }
            // Anchors within an already-discovered page are the same page
            absolute.set_fragment(None);
            Some(absolute.to_string())
        }
        Err(_) => None,
    }
}
