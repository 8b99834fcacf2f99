//! MarkerKit - async resolution and reconciliation of map markers.
//!
//! This library provides the concurrency core behind a map widget: it turns a
//! changing list of locations into live map markers, resolving each marker's
//! icon asynchronously (possibly over the network) and committing results as
//! they become available while suppressing updates from superseded passes.
//!
//! # High-Level API
//!
//! The [`marker`] module provides the reconciler facade:
//!
//! ```ignore
//! use std::sync::Arc;
//! use markerkit::icon::{IconResolver, StaticStyles};
//! use markerkit::image::{ImageCache, ReqwestImageFetcher};
//! use markerkit::marker::MarkerReconciler;
//!
//! let cache = Arc::new(ImageCache::new(ReqwestImageFetcher::new()?));
//! let resolver = Arc::new(IconResolver::new(cache, Arc::new(StaticStyles::new())));
//! let reconciler = Arc::new(MarkerReconciler::new(resolver, my_renderer));
//!
//! // Drive it from a watch channel of location lists.
//! reconciler.watch_locations(locations_rx);
//! ```

pub mod icon;
pub mod image;
pub mod logging;
pub mod marker;
pub mod settled;

/// Version of the MarkerKit library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
