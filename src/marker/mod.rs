//! Marker reconciliation against a changing location list.
//!
//! [`MarkerReconciler`] owns the mapping from location identity to rendered
//! marker handle and keeps it in sync with the observed location list,
//! resolving icons concurrently and committing results in completion order
//! while discarding work from superseded passes.

pub mod reconciler;
pub mod renderer;
pub mod types;

pub use reconciler::{MarkerReconciler, ReconcileError};
pub use renderer::{MarkerRenderer, RenderError};
pub use types::{Location, LocationId};
