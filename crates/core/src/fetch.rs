//! Outbound retrieval of remote documents, plus local readers for offline parsing.
//!
//! [`Transport`] is bound to one adapter's origin. Every request it sends
//! carries the same browser-like header set and a `Referer` equal to that
//! origin, because most target sites reject or redirect bare requests.
//! Non-success statuses surface as [`TankobonError::Status`] and are never
//! retried here.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::{Result, TankobonError};

/// Default desktop browser identity.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

/// HTTP client configuration shared by every adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent sent with every request.
    pub user_agent: String,
    /// Accept header for document requests.
    pub accept: String,
    /// Accept-Language header.
    pub accept_language: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
        }
    }
}

impl FetchConfig {
    /// Creates a new builder for FetchConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tankobon_core::FetchConfig;
    ///
    /// let config = FetchConfig::builder().timeout(10).build();
    /// assert_eq!(config.timeout, 10);
    /// ```
    pub fn builder() -> FetchConfigBuilder {
        FetchConfigBuilder::new()
    }
}

/// Builder for FetchConfig.
pub struct FetchConfigBuilder {
    config: FetchConfig,
}

impl FetchConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: FetchConfig::default() }
    }

    /// Sets the request timeout in seconds.
    pub fn timeout(mut self, value: u64) -> Self {
        self.config.timeout = value;
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.user_agent = value.into();
        self
    }

    /// Sets the Accept header used for document requests.
    pub fn accept(mut self, value: impl Into<String>) -> Self {
        self.config.accept = value.into();
        self
    }

    /// Sets the Accept-Language header.
    pub fn accept_language(mut self, value: impl Into<String>) -> Self {
        self.config.accept_language = value.into();
        self
    }

    /// Builds the config.
    pub fn build(self) -> FetchConfig {
        self.config
    }
}

impl Default for FetchConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HTTP access to one site's origin.
///
/// Holds a single `reqwest::Client`, so one transport can serve any number of
/// concurrent calls; no per-call state is kept.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    referer: String,
    config: FetchConfig,
}

impl Transport {
    /// Creates a transport for the given origin.
    ///
    /// # Errors
    ///
    /// Returns [`TankobonError::InvalidUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str, config: FetchConfig) -> Result<Self> {
        let parsed = Url::parse(base_url).map_err(|e| TankobonError::InvalidUrl(format!("{}: {}", base_url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TankobonError::InvalidUrl(format!(
                "{}: base URL must use http or https",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(TankobonError::HttpError)?;

        let referer = base_url.trim_end_matches('/').to_string();

        Ok(Self { client, referer, config })
    }

    /// The origin as a string without a trailing slash.
    pub fn origin(&self) -> &str {
        &self.referer
    }

    /// Resolves an absolute URL or a path relative to the base origin.
    ///
    /// Anything starting with `http` is taken as absolute. Everything else is
    /// appended to the origin, so `?s=q` and `/page/2` both land on the site.
    ///
    /// ```rust
    /// use tankobon_core::{FetchConfig, Transport};
    ///
    /// let transport = Transport::new("https://manhuafast.com", FetchConfig::default()).unwrap();
    /// assert_eq!(transport.resolve("/page/2/").unwrap().as_str(), "https://manhuafast.com/page/2/");
    /// assert_eq!(transport.resolve("https://cdn.example/x.jpg").unwrap().as_str(), "https://cdn.example/x.jpg");
    /// ```
    pub fn resolve(&self, path_or_url: &str) -> Result<Url> {
        let raw = if path_or_url.starts_with("http") {
            path_or_url.to_string()
        } else if path_or_url.starts_with('/') || path_or_url.starts_with('?') {
            format!("{}{}", self.referer, path_or_url)
        } else {
            format!("{}/{}", self.referer, path_or_url)
        };

        Url::parse(&raw).map_err(|e| TankobonError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    /// Fetches a document as text.
    pub async fn fetch_document(&self, path_or_url: &str) -> Result<String> {
        let url = self.resolve(path_or_url)?;
        debug!(%url, "fetching document");

        let request = self
            .with_headers(self.client.get(url.clone()))
            .header(ACCEPT, &self.config.accept);
        let response = self.send(request, &url).await?;

        Ok(response.text().await?)
    }

    /// Fetches a JSON document and deserializes it.
    pub async fn fetch_payload<T: DeserializeOwned>(&self, path_or_url: &str) -> Result<T> {
        let url = self.resolve(path_or_url)?;
        debug!(%url, "fetching payload");

        let request = self
            .with_headers(self.client.get(url.clone()))
            .header(ACCEPT, "application/json");
        let response = self.send(request, &url).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| TankobonError::PayloadError(format!("{}: {}", url, e)))
    }

    /// Posts to a secondary endpoint the way a page script would.
    ///
    /// Used for chapter lists that are loaded asynchronously after the main
    /// document; the request is marked with `X-Requested-With: XMLHttpRequest`.
    pub async fn post_document(&self, path_or_url: &str) -> Result<String> {
        let url = self.resolve(path_or_url)?;
        debug!(%url, "posting for document");

        let request = self
            .with_headers(self.client.post(url.clone()))
            .header(ACCEPT, &self.config.accept)
            .header("X-Requested-With", "XMLHttpRequest");
        let response = self.send(request, &url).await?;

        Ok(response.text().await?)
    }

    fn with_headers(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(USER_AGENT, &self.config.user_agent)
            .header(ACCEPT_LANGUAGE, &self.config.accept_language)
            .header(REFERER, &self.referer)
    }

    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() { TankobonError::Timeout { timeout: self.config.timeout } } else { TankobonError::HttpError(e) }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TankobonError::Status { url: url.to_string(), status: status.as_u16() });
        }

        Ok(response)
    }
}

/// Reads a saved page from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(TankobonError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(TankobonError::from)
    }
}

/// Reads a page from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(TankobonError::from)?;

    Ok(buffer)
}
