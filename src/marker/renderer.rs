//! Rendering library abstraction.
//!
//! The thing that actually draws pins is an external capability, accessed
//! only through this narrow interface so it can be injected and faked.

use thiserror::Error;

use crate::icon::ResolvedIcon;

use super::types::Location;

/// Errors raised by the rendering backend while creating a marker.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    /// The backend rejected the marker.
    #[error("marker rendering failed: {0}")]
    Backend(String),
}

/// Trait for the external map rendering collaborator.
///
/// A handle is an opaque token owned by the rendering library; the
/// reconciler stores it in the marker map and hands it back on removal.
pub trait MarkerRenderer: Send + Sync {
    type Handle: Send;

    /// Creates and displays a visual marker at the location's coordinate
    /// with the given icon descriptor.
    ///
    /// The reconciler invokes this while holding its internal marker-map
    /// lock, so that a marker is only ever created inside its pass's
    /// generation fence. Implementations must therefore not call back into
    /// the reconciler from here.
    fn create_marker(
        &self,
        location: &Location,
        icon: &ResolvedIcon,
    ) -> Result<Self::Handle, RenderError>;

    /// Removes a previously created visual marker.
    ///
    /// Invoked outside the reconciler's internal lock; implementations may
    /// query the reconciler freely.
    fn remove_marker(&self, handle: Self::Handle);
}
