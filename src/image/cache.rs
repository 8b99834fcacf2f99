//! URL-keyed memoization of image resolution.
//!
//! [`ImageCache`] resolves an image URL to a self-contained data URL, with
//! one physical fetch per distinct URL for the lifetime of the cache. When
//! multiple callers request the same URL concurrently, all of them share the
//! same in-flight resolution instead of triggering duplicate work; later
//! callers get the settled result synchronously.
//!
//! Entries are never invalidated or expired: this is memoization, not a TTL
//! cache. A URL that failed to resolve stays failed for the lifetime of the
//! cache instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use super::client::ImageFetcher;

/// One pending-or-settled resolution, shared by every caller for its URL.
type SharedResolution = Shared<BoxFuture<'static, Option<String>>>;

/// URL-keyed cache of image resolutions.
///
/// `resolve` returns the image as a data URL, or `None` if the image could
/// not be loaded or decoded. Failures are logged here and never propagated.
pub struct ImageCache<F> {
    fetcher: Arc<F>,
    entries: Mutex<HashMap<String, SharedResolution>>,
}

impl<F: ImageFetcher + 'static> ImageCache<F> {
    /// Creates a cache around the given fetcher.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves `url` to a data URL, or `None` on any failure.
    ///
    /// Data-URL inputs are already self-contained and are returned as-is,
    /// without touching the network or the cache. For everything else the
    /// first caller triggers a fetch and every concurrent or later caller
    /// shares its outcome.
    pub async fn resolve(&self, url: &str) -> Option<String> {
        if url.starts_with("data:image/") {
            return Some(url.to_owned());
        }

        let resolution = {
            let mut entries = self.entries.lock().expect("image cache lock poisoned");
            match entries.get(url) {
                Some(existing) => {
                    debug!(url = url, "image cache hit");
                    existing.clone()
                }
                None => {
                    debug!(url = url, "image cache miss, fetching");
                    let created = resolution_future(Arc::clone(&self.fetcher), url.to_owned());
                    entries.insert(url.to_owned(), created.clone());
                    created
                }
            }
        };

        resolution.await
    }

    /// Returns the number of URLs the cache has seen.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("image cache lock poisoned").len()
    }

    /// Returns true if the cache has seen no URLs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds the shared fetch-and-encode future for one URL.
///
/// Every exit path resolves to either a data URL or `None`; no failure
/// escapes as an error or a panic.
fn resolution_future<F: ImageFetcher + 'static>(fetcher: Arc<F>, url: String) -> SharedResolution {
    async move {
        let response = match fetcher.fetch(&url).await {
            Ok(response) => response,
            Err(error) => {
                warn!(url = %url, error = %error, "could not load image");
                return None;
            }
        };

        match encode_data_url(&response.bytes, response.content_type.as_deref()) {
            Some(data_url) => Some(data_url),
            None => {
                warn!(url = %url, "could not encode image bytes as a data URL");
                None
            }
        }
    }
    .boxed()
    .shared()
}

/// Encodes image bytes as a `data:<mime>;base64,...` URL.
///
/// The MIME type comes from the declared content type when it names an image
/// format, otherwise it is sniffed from the magic bytes. Returns `None` when
/// neither yields a usable type.
pub(crate) fn encode_data_url(bytes: &[u8], content_type: Option<&str>) -> Option<String> {
    let mime = match content_type {
        Some(declared) if declared.starts_with("image/") => declared
            .split(';')
            .next()
            .unwrap_or(declared)
            .trim()
            .to_owned(),
        _ => image::guess_format(bytes).ok()?.to_mime_type().to_owned(),
    };

    Some(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}
