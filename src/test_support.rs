//! Shared fixtures for unit tests.

use crate::model::{Libraries, Library, LibraryEnvelope, LibraryItem};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::Url;
use std::io::Cursor;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn serve(router: axum::Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([200, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn item(title: &str) -> LibraryItem {
    LibraryItem {
        title: title.to_string(),
        year: None,
        thumb_url: None,
        added_at: "2024-01-05T15:04:05Z".to_string(),
        rating: None,
        description: None,
        cast: None,
        trailer_url: None,
    }
}

pub fn envelope(libraries: Vec<(&str, Vec<LibraryItem>)>) -> LibraryEnvelope {
    LibraryEnvelope {
        libraries: Libraries::from(
            libraries
                .into_iter()
                .map(|(name, items)| Library {
                    name: name.to_string(),
                    items,
                })
                .collect::<Vec<_>>(),
        ),
        last_updated: "2024-01-06 10:00:00".to_string(),
    }
}

/// A client pointed at a port nothing listens on.
pub fn offline_client() -> crate::api::ApiClient {
    crate::api::ApiClient::new(Url::parse("http://127.0.0.1:9/").unwrap()).unwrap()
}
