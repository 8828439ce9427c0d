use crate::model::LibraryEnvelope;
use crate::thumbnail;
use futures_util::StreamExt;
use image::RgbImage;
use reqwest::Url;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Library data endpoint, relative to the server base URL.
pub const API_PATH: &str = "api/";
pub const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(10);
pub const MAX_THUMBNAIL_BYTES: usize = 8 * 1024 * 1024;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Errors from the library data request.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed library data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("fetch task ended without a result")]
    Interrupted,
}

impl FetchError {
    /// Message shown in place of the library view.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Status(_) => "Failed to fetch library data".to_string(),
            FetchError::Http(e) => format!("Network error: {}", e),
            FetchError::Decode(e) => format!("Invalid library data: {}", e),
            FetchError::Interrupted => "An error occurred".to_string(),
        }
    }
}

/// Errors from loading a single thumbnail.
#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("invalid thumbnail URL: {0}")]
    InvalidUrl(String),

    #[error("thumbnail request returned HTTP {0}")]
    Status(u16),

    #[error("thumbnail exceeds the 8 MiB limit")]
    TooLarge,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not decode thumbnail: {0}")]
    Decode(String),
}

/// HTTP client for the library server. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    http: reqwest::Client,
}

impl ApiClient {
    /// `base` must end with `/` so relative paths join beneath it.
    pub fn new(base: Url) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { base, http })
    }

    pub fn api_url(&self) -> Url {
        // API_PATH is a fixed relative path, joining it cannot fail on an http(s) base.
        self.base.join(API_PATH).unwrap_or_else(|_| self.base.clone())
    }

    /// Resolve an item URL (absolute, or relative to the server) to a full URL.
    pub fn resolve(&self, reference: &str) -> Result<Url, String> {
        self.base.join(reference.trim()).map_err(|e| e.to_string())
    }

    pub async fn fetch_libraries(&self) -> Result<LibraryEnvelope, FetchError> {
        let url = self.api_url();
        info!(%url, "fetching library data");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let envelope: LibraryEnvelope = serde_json::from_slice(&body)?;
        info!(
            libraries = envelope.libraries.len(),
            bytes = body.len(),
            "library data received"
        );
        Ok(envelope)
    }

    /// Download and decode one thumbnail.
    pub async fn fetch_thumbnail(&self, source: &str) -> Result<RgbImage, ThumbnailError> {
        let url = self.resolve(source).map_err(ThumbnailError::InvalidUrl)?;
        debug!(%url, "fetching thumbnail");

        let response = self.http.get(url).timeout(THUMBNAIL_TIMEOUT).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ThumbnailError::Status(status.as_u16()));
        }
        if response
            .content_length()
            .is_some_and(|len| len > MAX_THUMBNAIL_BYTES as u64)
        {
            return Err(ThumbnailError::TooLarge);
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if bytes.len() + chunk.len() > MAX_THUMBNAIL_BYTES {
                return Err(ThumbnailError::TooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }

        tokio::task::spawn_blocking(move || thumbnail::decode(&bytes))
            .await
            .map_err(|e| ThumbnailError::Decode(e.to_string()))?
            .map_err(|e| ThumbnailError::Decode(e.to_string()))
    }
}
