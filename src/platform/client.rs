//! Blocking HTTP fetch primitive for pages and companion scripts

use crate::error::VidmapError;
use reqwest::blocking::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, warn};

/// Default desktop browser user agent
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Fetches a URL and returns its body as text
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<String, VidmapError>;
}

impl<F> Fetch for F
where
    F: Fn(&str) -> Result<String, VidmapError>,
{
    fn fetch(&self, url: &str) -> Result<String, VidmapError> {
        self(url)
    }
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// User agent string
    pub user_agent: Option<String>,
    /// Proxy URL
    pub proxy_url: Option<String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: None,
            proxy_url: None,
        }
    }
}

impl HttpClientConfig {
    /// Read overrides from `VIDMAP_HTTP_TIMEOUT` (e.g. "45s"),
    /// `VIDMAP_USER_AGENT` and `VIDMAP_PROXY`
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(timeout) = std::env::var("VIDMAP_HTTP_TIMEOUT") {
            match humantime::parse_duration(timeout.trim()) {
                Ok(duration) => config.timeout = duration,
                Err(e) => warn!("Ignoring VIDMAP_HTTP_TIMEOUT={:?}: {}", timeout, e),
            }
        }
        config.user_agent = std::env::var("VIDMAP_USER_AGENT")
            .ok()
            .filter(|ua| !ua.is_empty());
        config.proxy_url = std::env::var("VIDMAP_PROXY")
            .ok()
            .filter(|proxy| !proxy.is_empty());

        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }
}

/// [`Fetch`] implementation backed by a blocking reqwest client
pub struct HttpFetcher {
    client: Client,
    config: HttpClientConfig,
}

impl HttpFetcher {
    /// Create a fetcher with default configuration
    pub fn new() -> Result<Self, VidmapError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, VidmapError> {
        let mut builder = ClientBuilder::new()
            .timeout(config.timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));

        if let Some(proxy_url) = &config.proxy_url {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, VidmapError> {
        debug!("GET {}", url);
        let response = self.client.get(url).send()?.error_for_status()?;
        let body = response.text()?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
