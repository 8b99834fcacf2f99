//! Integration tests for the marker reconciliation core.
//!
//! These tests verify the complete flow across the public API:
//! - Image resolution memoization (one fetch per URL, shared by all callers)
//! - Renderer fallback order under resolution failure
//! - Epoch-fenced suppression of superseded reconciliation passes
//! - Synchronous deletion independent of pending resolutions
//!
//! Run with: `cargo test --test reconciler_integration`

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tokio::sync::watch;
use tokio::time::sleep;

use markerkit::icon::{IconConfig, IconResolver, RendererSpec, ResolvedIcon, StaticStyles};
use markerkit::image::{FetchError, ImageCache, ImageFetcher, ImageResponse};
use markerkit::marker::{Location, LocationId, MarkerReconciler, MarkerRenderer, RenderError};

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

// ============================================================================
// Mock Implementations
// ============================================================================

/// Per-URL scripted response with an artificial latency.
#[derive(Clone)]
struct ScriptedResponse {
    delay: Duration,
    result: Result<ImageResponse, FetchError>,
}

/// Mock fetcher serving scripted responses and counting physical fetches.
struct ScriptedFetcher {
    responses: HashMap<String, ScriptedResponse>,
    fetch_count: Arc<AtomicUsize>,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self {
            responses: HashMap::new(),
            fetch_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn with_image(mut self, url: &str, delay_ms: u64) -> Self {
        self.responses.insert(
            url.to_owned(),
            ScriptedResponse {
                delay: Duration::from_millis(delay_ms),
                result: Ok(ImageResponse {
                    bytes: PNG_MAGIC.to_vec(),
                    content_type: Some("image/png".to_owned()),
                }),
            },
        );
        self
    }

    fn with_failure(mut self, url: &str) -> Self {
        self.responses.insert(
            url.to_owned(),
            ScriptedResponse {
                delay: Duration::ZERO,
                result: Err(FetchError::Status {
                    status: 404,
                    url: url.to_owned(),
                }),
            },
        );
        self
    }

    /// Counter handle that survives moving the fetcher into a cache.
    fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetch_count)
    }
}

impl ImageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<ImageResponse, FetchError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(url) {
            Some(scripted) => {
                sleep(scripted.delay).await;
                scripted.result.clone()
            }
            None => Err(FetchError::Status {
                status: 404,
                url: url.to_owned(),
            }),
        }
    }
}

/// Renderer recording every creation and removal.
struct RecordingRenderer {
    next_handle: AtomicU64,
    created: Mutex<Vec<(LocationId, ResolvedIcon)>>,
    removed: Mutex<Vec<u64>>,
}

impl RecordingRenderer {
    fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            created: Mutex::new(Vec::new()),
            removed: Mutex::new(Vec::new()),
        }
    }

    fn created_ids(&self) -> Vec<LocationId> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    fn removed_handles(&self) -> Vec<u64> {
        self.removed.lock().unwrap().clone()
    }
}

impl MarkerRenderer for RecordingRenderer {
    type Handle = u64;

    fn create_marker(&self, location: &Location, icon: &ResolvedIcon) -> Result<u64, RenderError> {
        let handle = self.next_handle.fetch_add(1, Ordering::SeqCst);
        self.created
            .lock()
            .unwrap()
            .push((location.id.clone(), icon.clone()));
        Ok(handle)
    }

    fn remove_marker(&self, handle: u64) {
        self.removed.lock().unwrap().push(handle);
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn decode_svg(icon: &ResolvedIcon) -> String {
    let payload = icon
        .icon_url
        .strip_prefix("data:image/svg+xml;base64,")
        .expect("inline SVG data URL");
    String::from_utf8(STANDARD.decode(payload).expect("valid base64")).expect("utf-8 SVG")
}

fn image_icon_config(url: &str) -> IconConfig {
    IconConfig {
        renderers: vec![RendererSpec::Image {
            url: url.to_owned(),
            wrap: None,
        }],
        wrap_defaults: None,
    }
}

fn color_icon_config(color: &str) -> IconConfig {
    IconConfig {
        renderers: vec![RendererSpec::Color {
            color: color.to_owned(),
            wrap: None,
        }],
        wrap_defaults: None,
    }
}

fn reconciler_with(
    fetcher: ScriptedFetcher,
    styles: StaticStyles,
) -> Arc<MarkerReconciler<ScriptedFetcher, RecordingRenderer>> {
    let cache = Arc::new(ImageCache::new(fetcher));
    let resolver = Arc::new(IconResolver::new(cache, Arc::new(styles)));
    Arc::new(MarkerReconciler::new(resolver, RecordingRenderer::new()))
}

fn accent_styles() -> StaticStyles {
    StaticStyles::new().with_property("--mk-accent-color", "#0a5")
}

// ============================================================================
// Image resolution
// ============================================================================

#[tokio::test]
async fn test_concurrent_resolution_shares_one_fetch() {
    let fetcher = ScriptedFetcher::new().with_image("http://example.com/pin.png", 20);
    let fetches = fetcher.fetch_counter();
    let cache = Arc::new(ImageCache::new(fetcher));

    let first = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.resolve("http://example.com/pin.png").await }
    });
    let second = tokio::spawn({
        let cache = Arc::clone(&cache);
        async move { cache.resolve("http://example.com/pin.png").await }
    });

    let first = first.await.unwrap();
    let second = second.await.unwrap();

    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_data_url_input_is_returned_unchanged_without_fetching() {
    let fetcher = ScriptedFetcher::new();
    let fetches = fetcher.fetch_counter();
    let cache = ImageCache::new(fetcher);

    let resolved = cache.resolve("data:image/png;base64,AAA").await;

    assert_eq!(resolved.as_deref(), Some("data:image/png;base64,AAA"));
    assert!(cache.is_empty());
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Fallback order
// ============================================================================

#[tokio::test]
async fn test_failed_image_falls_back_to_color_not_default() {
    let fetcher = ScriptedFetcher::new().with_failure("http://example.com/broken.png");
    let cache = Arc::new(ImageCache::new(fetcher));
    let resolver = IconResolver::new(cache, Arc::new(StaticStyles::new()));

    let config = IconConfig {
        renderers: vec![
            RendererSpec::Image {
                url: "http://example.com/broken.png".to_owned(),
                wrap: None,
            },
            RendererSpec::Color {
                color: "red".to_owned(),
                wrap: None,
            },
        ],
        wrap_defaults: None,
    };

    let icon = resolver.resolve_icon(&config, None).await;

    assert_eq!(icon.class_name, "mk-map-marker--type-color");
    assert!(decode_svg(&icon).contains(r#"fill="red""#));
}

// ============================================================================
// Reconciliation
// ============================================================================

#[tokio::test]
async fn test_superseded_pass_commits_nothing() {
    let fetcher = ScriptedFetcher::new().with_image("http://example.com/slow.png", 100);
    let reconciler = reconciler_with(fetcher, accent_styles());

    // Pass A: one location whose icon takes 100ms to resolve.
    let pass_a = tokio::spawn({
        let reconciler = Arc::clone(&reconciler);
        async move {
            let slow = Location::new(1, 10.0, 10.0)
                .with_icon(image_icon_config("http://example.com/slow.png"));
            reconciler.sync(&[slow]).await;
        }
    });

    // Pass B starts before A's resolution completes, with a disjoint list.
    sleep(Duration::from_millis(10)).await;
    let fast = Location::new(2, 20.0, 20.0).with_icon(color_icon_config("red"));
    reconciler.sync(&[fast]).await;

    pass_a.await.unwrap();

    // Only pass B's effects are visible; A's resolution was discarded.
    assert_eq!(reconciler.marker_ids(), vec![LocationId::Number(2)]);
}

#[tokio::test]
async fn test_deletion_applies_before_pending_resolutions_settle() {
    let fetcher = ScriptedFetcher::new().with_image("http://example.com/slow.png", 50);
    let reconciler = reconciler_with(fetcher, accent_styles());

    reconciler.sync(&[Location::new(1, 0.0, 0.0)]).await;
    assert!(reconciler.contains(&LocationId::Number(1)));

    // New pass: location 1 is gone, location 2 needs a 50ms resolution.
    let pass = tokio::spawn({
        let reconciler = Arc::clone(&reconciler);
        async move {
            let slow = Location::new(2, 1.0, 1.0)
                .with_icon(image_icon_config("http://example.com/slow.png"));
            reconciler.sync(&[slow]).await;
        }
    });

    // The removal is synchronous: visible well before the resolution settles.
    sleep(Duration::from_millis(10)).await;
    assert!(!reconciler.contains(&LocationId::Number(1)));
    assert!(!reconciler.contains(&LocationId::Number(2)));

    pass.await.unwrap();
    assert_eq!(reconciler.marker_ids(), vec![LocationId::Number(2)]);
}

#[tokio::test]
async fn test_one_bad_location_does_not_abort_the_pass() {
    let fetcher = ScriptedFetcher::new();
    let reconciler = reconciler_with(fetcher, accent_styles());

    let locations = vec![
        Location::new(1, f64::INFINITY, 0.0),
        Location::new(2, 1.0, 1.0),
        Location::new(3, 2.0, 2.0),
    ];
    reconciler.sync(&locations).await;

    assert_eq!(
        reconciler.marker_ids(),
        vec![LocationId::Number(2), LocationId::Number(3)]
    );
}

#[tokio::test]
async fn test_end_to_end_default_icon_lifecycle() {
    let fetcher = ScriptedFetcher::new();
    let reconciler = reconciler_with(fetcher, accent_styles());

    reconciler.sync(&[Location::new(1, 0.0, 0.0)]).await;

    assert_eq!(reconciler.marker_ids(), vec![LocationId::Number(1)]);
    {
        let created = reconciler.renderer().created.lock().unwrap();
        let (id, icon) = &created[0];
        assert_eq!(*id, LocationId::Number(1));
        assert_eq!(icon.class_name, "mk-map-marker--type-color");
        // Default config resolves the accent property into the embed fill.
        assert!(decode_svg(icon).contains(r##"fill="#0a5""##));
    }

    reconciler.sync(&[]).await;

    assert!(reconciler.is_empty());
    assert_eq!(reconciler.renderer().removed_handles(), vec![1]);
}

#[tokio::test]
async fn test_watch_driven_overlapping_passes_newest_list_wins() {
    let fetcher = ScriptedFetcher::new().with_image("http://example.com/slow.png", 100);
    let reconciler = reconciler_with(fetcher, accent_styles());

    // The initial list's icon is slow to resolve; a replacement list arrives
    // while that pass is still in flight. Whatever order the runtime polls
    // the two passes in, the replacement must be the one that sticks.
    let slow = Location::new(1, 10.0, 10.0)
        .with_icon(image_icon_config("http://example.com/slow.png"));
    let (tx, rx) = watch::channel(vec![slow]);
    let loop_handle = Arc::clone(&reconciler).watch_locations(rx);

    tx.send(vec![Location::new(2, 20.0, 20.0).with_icon(color_icon_config("red"))])
        .unwrap();
    sleep(Duration::from_millis(150)).await;

    assert_eq!(reconciler.marker_ids(), vec![LocationId::Number(2)]);
    assert_eq!(reconciler.renderer().created_ids(), vec![LocationId::Number(2)]);
    assert!(reconciler.renderer().removed_handles().is_empty());

    drop(tx);
    loop_handle.await.unwrap();
}

#[tokio::test]
async fn test_watch_locations_reconciles_immediately_and_on_change() {
    let fetcher = ScriptedFetcher::new();
    let reconciler = reconciler_with(fetcher, accent_styles());

    let (tx, rx) = watch::channel(vec![Location::new(1, 0.0, 0.0)]);
    let loop_handle = Arc::clone(&reconciler).watch_locations(rx);

    sleep(Duration::from_millis(20)).await;
    assert!(reconciler.contains(&LocationId::Number(1)));

    tx.send(vec![Location::new(2, 1.0, 1.0)]).unwrap();
    sleep(Duration::from_millis(20)).await;
    assert_eq!(reconciler.marker_ids(), vec![LocationId::Number(2)]);

    drop(tx);
    loop_handle.await.unwrap();
}
