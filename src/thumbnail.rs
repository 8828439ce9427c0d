use image::RgbImage;
use std::sync::Arc;

/// Decoded thumbnails are shrunk to this box (pixels) before they reach the UI.
pub const MAX_DECODED_WIDTH: u32 = 160;
pub const MAX_DECODED_HEIGHT: u32 = 240;

/// Load state of the image shown in an open item modal.
#[derive(Debug, Clone)]
pub enum ThumbnailStatus {
    /// The item has no thumbnail URL; nothing is ever requested.
    Missing,
    Loading { request: u64 },
    Loaded(Arc<RgbImage>),
    Failed,
}

/// Image slot of one card or modal instance. A new item gets a new
/// `Thumbnail`, so a failure for one source never leaks into the next.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    source: Option<String>,
    status: ThumbnailStatus,
}

impl Thumbnail {
    pub fn new(source: Option<&str>, request: u64) -> Self {
        match source {
            Some(source) => Self {
                source: Some(source.to_string()),
                status: ThumbnailStatus::Loading { request },
            },
            None => Self {
                source: None,
                status: ThumbnailStatus::Missing,
            },
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn status(&self) -> &ThumbnailStatus {
        &self.status
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.status, ThumbnailStatus::Loaded(_))
    }

    /// The request id this slot is waiting on, if any.
    pub fn pending_request(&self) -> Option<u64> {
        match self.status {
            ThumbnailStatus::Loading { request } => Some(request),
            _ => None,
        }
    }

    /// Apply a finished load. Returns false when the result belongs to some
    /// other request and was dropped.
    pub fn resolve<E>(&mut self, request: u64, result: Result<RgbImage, E>) -> bool {
        if self.pending_request() != Some(request) {
            return false;
        }
        self.status = match result {
            Ok(image) => ThumbnailStatus::Loaded(Arc::new(image)),
            Err(_) => ThumbnailStatus::Failed,
        };
        true
    }
}

/// Decode an encoded image and shrink it for terminal display.
pub fn decode(bytes: &[u8]) -> Result<RgbImage, image::ImageError> {
    let image = image::load_from_memory(bytes)?;
    Ok(image
        .thumbnail(MAX_DECODED_WIDTH, MAX_DECODED_HEIGHT)
        .to_rgb8())
}
