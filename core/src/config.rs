//! Client configuration: API keys and base URL.

use std::fmt;

use url::Url;

use crate::error::{Error, Result};

/// Production origin of the PlayPath API.
pub const DEFAULT_BASE_URL: &str = "https://api.playpath.io";

pub const API_KEY_ENV: &str = "PLAYPATH_API_KEY";
pub const EMBEDDINGS_KEY_ENV: &str = "PLAYPATH_EMBEDDINGS_KEY";
pub const BASE_URL_ENV: &str = "PLAYPATH_BASE_URL";

/// Which configured key authenticates a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EndpointKind {
    #[default]
    Items,
    Rag,
}

/// Keys and base URL shared by every request.
///
/// Built once at startup and treated as immutable afterwards. The base URL is
/// validated on the way in, so it is always an absolute HTTP(S) URL.
#[derive(Clone, PartialEq, Eq)]
pub struct Configuration {
    api_key: Option<String>,
    embeddings_api_key: Option<String>,
    base_url: Url,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            api_key: None,
            embeddings_api_key: None,
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
        }
    }
}

// Keys are redacted.
impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "embeddings_api_key",
                &self.embeddings_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Key used for RAG endpoints in place of the primary key.
    pub fn with_embeddings_api_key(mut self, key: impl Into<String>) -> Self {
        self.embeddings_api_key = Some(key.into());
        self
    }

    /// Fails unless `base_url` is an absolute `http` or `https` URL.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    /// Reads `PLAYPATH_API_KEY`, `PLAYPATH_EMBEDDINGS_KEY` and
    /// `PLAYPATH_BASE_URL`. Unset or blank variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(key) = read(API_KEY_ENV) {
            config = config.with_api_key(key);
        }
        if let Some(key) = read(EMBEDDINGS_KEY_ENV) {
            config = config.with_embeddings_api_key(key);
        }
        if let Some(base_url) = read(BASE_URL_ENV) {
            config = config.with_base_url(&base_url)?;
        }
        Ok(config)
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn embeddings_api_key(&self) -> Option<&str> {
        self.embeddings_api_key.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Key for `kind`, or `None` if it resolves to nothing usable.
    ///
    /// RAG calls prefer the embeddings key and fall back to the primary key;
    /// everything else uses the primary key. Empty strings count as absent.
    pub fn api_key_for(&self, kind: EndpointKind) -> Option<&str> {
        let primary = non_empty(self.api_key.as_deref());
        match kind {
            EndpointKind::Rag => non_empty(self.embeddings_api_key.as_deref()).or(primary),
            EndpointKind::Items => primary,
        }
    }

    /// Whether item calls can authenticate.
    pub fn is_configured(&self) -> bool {
        self.api_key_for(EndpointKind::Items).is_some()
    }
}

fn non_empty(key: Option<&str>) -> Option<&str> {
    key.filter(|k| !k.is_empty())
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::Configuration(format!("base URL {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(Error::Configuration(format!(
            "base URL {raw:?} must be an absolute http(s) URL"
        ))),
    }
}
