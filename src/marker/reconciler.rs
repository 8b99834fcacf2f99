//! Epoch-fenced reconciliation of locations against live markers.
//!
//! Each reconciliation pass works one observed location list: deletions are
//! applied up front, then icon resolution for genuinely new locations runs
//! concurrently and results are committed in completion order. A pass's
//! generation comes from a monotonic counter and is assigned when its
//! location snapshot is observed, before any task for it is spawned, so
//! generation order always matches snapshot order even when the runtime
//! polls the passes' tasks out of order. Both the removal phase and every
//! commit compare the pass generation against the current one under the
//! marker-map lock and abandon the remainder of the pass wholesale on
//! mismatch. That way a superseded pass can never clobber state a newer
//! pass has already written, while in-flight image fetches of an abandoned
//! pass still run to completion and populate the URL-keyed cache.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::icon::{IconConfig, IconResolver, ResolvedIcon};
use crate::image::ImageFetcher;
use crate::settled::{Settled, SettledSet};

use super::renderer::MarkerRenderer;
use super::types::{Location, LocationId};

/// Errors that reject a single location within a pass.
///
/// A rejected location is logged and skipped; the rest of the pass proceeds
/// unaffected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReconcileError {
    /// The location carries a coordinate that cannot be placed on a map.
    #[error("location {id} has a non-finite coordinate ({lat}, {lng})")]
    InvalidCoordinate { id: LocationId, lat: f64, lng: f64 },
}

/// Maintains the mapping from location identity to rendered marker handle.
///
/// The marker map is mutated exclusively by this type: synchronously for
/// removals, and under the generation fence for insertions.
pub struct MarkerReconciler<F, R: MarkerRenderer> {
    resolver: Arc<IconResolver<F>>,
    renderer: R,
    default_icon: IconConfig,
    markers: Mutex<HashMap<LocationId, R::Handle>>,
    epoch: AtomicU64,
}

impl<F, R> MarkerReconciler<F, R>
where
    F: ImageFetcher + 'static,
    R: MarkerRenderer,
{
    /// Creates a reconciler with the default accent-color icon config.
    pub fn new(resolver: Arc<IconResolver<F>>, renderer: R) -> Self {
        Self {
            resolver,
            renderer,
            default_icon: IconConfig::default(),
            markers: Mutex::new(HashMap::new()),
            epoch: AtomicU64::new(0),
        }
    }

    /// Replaces the icon config used for locations without one of their own.
    pub fn with_default_icon(mut self, icon: IconConfig) -> Self {
        self.default_icon = icon;
        self
    }

    /// Returns the rendering collaborator.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Returns the ids currently present in the marker map.
    pub fn marker_ids(&self) -> Vec<LocationId> {
        let mut ids: Vec<LocationId> = self.lock_markers().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns true if a marker exists for the given id.
    pub fn contains(&self, id: &LocationId) -> bool {
        self.lock_markers().contains_key(id)
    }

    /// Returns the number of live markers.
    pub fn len(&self) -> usize {
        self.lock_markers().len()
    }

    /// Returns true if no markers are live.
    pub fn is_empty(&self) -> bool {
        self.lock_markers().is_empty()
    }

    /// Runs one reconciliation pass against the given location list.
    ///
    /// Removals happen synchronously before any resolution begins. New
    /// locations resolve concurrently and are committed as each becomes
    /// ready, in completion order, unless a newer pass supersedes this one
    /// first. Markers already present for an id are left untouched.
    pub async fn sync(&self, locations: &[Location]) {
        let pass = self.next_epoch();
        self.run_pass(pass, locations).await;
    }

    /// Claims the next generation. Must be called when the location snapshot
    /// is observed, before the pass is handed to the runtime, so generation
    /// order matches snapshot order regardless of task scheduling.
    fn next_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Executes one pass under an already-claimed generation.
    async fn run_pass(&self, pass: u64, locations: &[Location]) {
        debug!(
            pass = pass,
            locations = locations.len(),
            "reconciliation pass starting"
        );

        if !self.remove_stale(pass, locations) {
            debug!(pass = pass, "pass superseded, skipping removals");
            return;
        }

        let fresh: Vec<Location> = {
            let markers = self.lock_markers();
            locations
                .iter()
                .filter(|location| !markers.contains_key(&location.id))
                .cloned()
                .collect()
        };

        let mut pending: SettledSet<_> = fresh
            .into_iter()
            .map(|location| self.prepare(location))
            .collect();

        while let Some(outcome) = pending.next().await {
            match outcome {
                Settled::Rejected(reason) => {
                    error!(error = %reason, "could not create marker from location");
                }
                Settled::Fulfilled((location, icon)) => {
                    if !self.commit(pass, location, &icon) {
                        debug!(pass = pass, "pass superseded, abandoning remaining results");
                        break;
                    }
                }
            }
        }
    }

    /// Subscribes to a location list, reconciling once immediately and once
    /// per change.
    ///
    /// Each pass runs as its own task, so a rapid sequence of changes yields
    /// overlapping passes; the generation fence guarantees that only the
    /// newest pass commits.
    pub fn watch_locations(self: Arc<Self>, mut rx: watch::Receiver<Vec<Location>>) -> JoinHandle<()>
    where
        F: Send + Sync,
        R: Send + Sync + 'static,
        R::Handle: 'static,
    {
        tokio::spawn(async move {
            loop {
                let locations: Vec<Location> = rx.borrow_and_update().clone();
                // Claim the generation here, not inside the spawned task:
                // the runtime may poll an older snapshot's task after a
                // newer one, and the fence must reflect snapshot order.
                let pass = self.next_epoch();
                let reconciler = Arc::clone(&self);
                tokio::spawn(async move {
                    reconciler.run_pass(pass, &locations).await;
                });
                if rx.changed().await.is_err() {
                    debug!("location source dropped, reconciliation loop ending");
                    break;
                }
            }
        })
    }

    /// Removes every marker whose id is absent from the new location list,
    /// notifying the renderer for each. No resolution is involved.
    ///
    /// The generation check happens under the marker-map lock, like
    /// [`Self::commit`]: a pass that has been superseded removes nothing and
    /// returns false, so its removal phase cannot delete markers a newer
    /// pass has already written. Renderer notifications happen after the
    /// lock is released.
    fn remove_stale(&self, pass: u64, locations: &[Location]) -> bool {
        let live_ids: HashSet<&LocationId> = locations.iter().map(|location| &location.id).collect();
        let removed: Vec<(LocationId, R::Handle)> = {
            let mut markers = self.lock_markers();
            if self.epoch.load(Ordering::SeqCst) != pass {
                return false;
            }
            let stale: Vec<LocationId> = markers
                .keys()
                .filter(|id| !live_ids.contains(id))
                .cloned()
                .collect();
            stale
                .into_iter()
                .filter_map(|id| markers.remove(&id).map(|handle| (id, handle)))
                .collect()
        };
        for (id, handle) in removed {
            self.renderer.remove_marker(handle);
            debug!(id = %id, "marker removed");
        }
        true
    }

    /// Resolves the icon for one new location.
    async fn prepare(&self, location: Location) -> Result<(Location, ResolvedIcon), ReconcileError> {
        if !location.lat.is_finite() || !location.lng.is_finite() {
            return Err(ReconcileError::InvalidCoordinate {
                id: location.id.clone(),
                lat: location.lat,
                lng: location.lng,
            });
        }

        let config = location
            .icon
            .clone()
            .unwrap_or_else(|| self.default_icon.clone());
        let icon = self.resolver.resolve_icon(&config, None).await;
        Ok((location, icon))
    }

    /// Creates the marker and records it, unless the pass is superseded.
    ///
    /// The generation check happens under the marker-map lock: either this
    /// pass commits before a newer pass starts its removal phase, or it
    /// observes the newer generation and commits nothing. Returns false when
    /// the pass is superseded.
    fn commit(&self, pass: u64, location: Location, icon: &ResolvedIcon) -> bool {
        let mut markers = self.lock_markers();
        if self.epoch.load(Ordering::SeqCst) != pass {
            return false;
        }

        match self.renderer.create_marker(&location, icon) {
            Ok(handle) => {
                markers.insert(location.id.clone(), handle);
                debug!(id = %location.id, "marker set");
            }
            Err(reason) => {
                error!(id = %location.id, error = %reason, "renderer rejected marker");
            }
        }
        true
    }

    fn lock_markers(&self) -> std::sync::MutexGuard<'_, HashMap<LocationId, R::Handle>> {
        self.markers.lock().expect("marker map lock poisoned")
    }
}
