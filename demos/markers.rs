//! Minimal end-to-end demo: reconcile a changing location list against a
//! renderer that just logs what it would draw.
//!
//! Run with: `cargo run --example markers`

use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::info;

use markerkit::icon::{IconConfig, IconResolver, RendererSpec, ResolvedIcon, StaticStyles};
use markerkit::image::{ImageCache, ReqwestImageFetcher};
use markerkit::logging;
use markerkit::marker::{Location, MarkerReconciler, MarkerRenderer, RenderError};

/// Renderer that logs marker operations instead of drawing.
struct LogRenderer {
    next_handle: AtomicU64,
}

impl MarkerRenderer for LogRenderer {
    type Handle = u64;

    fn create_marker(&self, location: &Location, icon: &ResolvedIcon) -> Result<u64, RenderError> {
        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
        info!(
            id = %location.id,
            lat = location.lat,
            lng = location.lng,
            class = %icon.class_name,
            handle = handle,
            "marker created"
        );
        Ok(handle)
    }

    fn remove_marker(&self, handle: u64) {
        info!(handle = handle, "marker removed");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _guard = logging::init_logging(logging::default_log_dir(), logging::default_log_file())?;

    let cache = Arc::new(ImageCache::new(ReqwestImageFetcher::new()?));
    let styles = Arc::new(
        StaticStyles::new()
            .with_context("demo")
            .with_property("--mk-accent-color", "#2e6fb7"),
    );
    let resolver = Arc::new(IconResolver::new(cache, styles));
    let reconciler = Arc::new(MarkerReconciler::new(
        resolver,
        LogRenderer {
            next_handle: AtomicU64::new(1),
        },
    ));

    let berlin = Location::new(1, 52.52, 13.405).with_name("Berlin");
    let munich = Location::new(2, 48.137, 11.575)
        .with_name("Munich")
        .with_icon(IconConfig {
            renderers: vec![
                RendererSpec::Image {
                    // Self-contained, so no network round trip is needed.
                    url: "data:image/svg+xml;base64,PHN2Zy8+".to_owned(),
                    wrap: None,
                },
                RendererSpec::TraditionalIcon,
            ],
            wrap_defaults: None,
        });

    let (tx, rx) = watch::channel(vec![berlin.clone(), munich]);
    let reconcile_loop = Arc::clone(&reconciler).watch_locations(rx);

    tokio::time::sleep(Duration::from_millis(200)).await;
    info!(markers = reconciler.len(), "initial reconciliation done");

    tx.send(vec![berlin])?;
    tokio::time::sleep(Duration::from_millis(200)).await;
    info!(markers = reconciler.len(), "after removing Munich");

    drop(tx);
    reconcile_loop.await?;
    Ok(())
}
