use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::{fmt::Debug, time::Duration};
use thiserror::Error;
use url::Url;

use crate::config::IconConfig;
use crate::render::DecodedIcon;

/// Fetches and decodes a remote icon. Any failure is reported as `None`.
#[async_trait]
pub trait IconFetcher: Send + Sync + Debug {
    async fn fetch(&self, url: Option<&str>) -> Option<DecodedIcon>;
}

#[derive(Debug, Error)]
pub enum IconError {
    #[error("invalid icon URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("unsupported icon URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("icon request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("icon request returned status {0}")]
    Status(StatusCode),

    #[error("icon body exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("icon could not be decoded: {0}")]
    Decode(#[from] image::ImageError),

    #[error("icon decode task failed: {0}")]
    DecodeTask(#[from] tokio::task::JoinError),
}

/// Icon fetcher over HTTP(S) with a bounded request timeout and body size.
#[derive(Debug, Clone)]
pub struct HttpIconFetcher {
    http: Client,
    default_scheme: String,
    max_bytes: u64,
}

impl HttpIconFetcher {
    pub fn new(config: &IconConfig) -> Result<Self, IconError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            default_scheme: config.default_scheme.clone(),
            max_bytes: config.max_bytes,
        })
    }

    /// Build with an explicit timeout; used where whole-second granularity is too coarse.
    pub fn with_timeout(
        timeout: Duration,
        default_scheme: impl Into<String>,
    ) -> Result<Self, IconError> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            default_scheme: default_scheme.into(),
            max_bytes: IconConfig::default().max_bytes,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn try_fetch(&self, raw: &str) -> Result<DecodedIcon, IconError> {
        let url = resolve_icon_url(raw, &self.default_scheme)?;

        let mut res = self.http.get(url).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(IconError::Status(status));
        }

        let limit = self.max_bytes;
        if res.content_length().is_some_and(|len| len > limit) {
            return Err(IconError::TooLarge { limit });
        }

        // Content-Length is advisory; the limit applies to the bytes actually read.
        let mut bytes = Vec::new();
        while let Some(chunk) = res.chunk().await? {
            if (bytes.len() + chunk.len()) as u64 > limit {
                return Err(IconError::TooLarge { limit });
            }
            bytes.extend_from_slice(&chunk);
        }

        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await??;

        Ok(DecodedIcon::from(image.to_rgba8()))
    }
}

#[async_trait]
impl IconFetcher for HttpIconFetcher {
    async fn fetch(&self, url: Option<&str>) -> Option<DecodedIcon> {
        let raw = url.filter(|u| !u.is_empty())?;

        match self.try_fetch(raw).await {
            Ok(icon) => {
                tracing::debug!(
                    url = raw,
                    width = icon.width(),
                    height = icon.height(),
                    "icon loaded"
                );
                Some(icon)
            }
            Err(e) => {
                tracing::warn!(url = raw, "Error loading icon: {}", e);
                None
            }
        }
    }
}

/// Resolve a possibly scheme-relative (`//host/path`) icon URL.
pub fn resolve_icon_url(raw: &str, default_scheme: &str) -> Result<Url, IconError> {
    let candidate = if raw.starts_with("//") {
        format!("{default_scheme}:{raw}")
    } else {
        raw.to_string()
    };

    let url = Url::parse(&candidate).map_err(|source| IconError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(IconError::UnsupportedScheme(other.to_string())),
    }
}
