//! Location data supplied by the external reactive source.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::icon::IconConfig;

/// Stable identity of a location, either an integer or a string.
///
/// Uniqueness within one location list is required; the reconciler keys its
/// marker map by this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationId {
    Number(i64),
    Text(String),
}

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationId::Number(id) => write!(f, "{}", id),
            LocationId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for LocationId {
    fn from(id: i64) -> Self {
        LocationId::Number(id)
    }
}

impl From<&str> for LocationId {
    fn from(id: &str) -> Self {
        LocationId::Text(id.to_owned())
    }
}

impl From<String> for LocationId {
    fn from(id: String) -> Self {
        LocationId::Text(id)
    }
}

/// A point of interest to be shown as a map marker.
///
/// Immutable from the reconciler's perspective; owned and updated by the
/// external reactive source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub lat: f64,
    pub lng: f64,
    /// Optional display name, passed through to the renderer as the marker
    /// title.
    #[serde(default)]
    pub name: Option<String>,
    /// Icon configuration; the reconciler's default applies when absent.
    #[serde(default)]
    pub icon: Option<IconConfig>,
}

impl Location {
    /// Creates a location with no name and no icon configuration.
    pub fn new(id: impl Into<LocationId>, lat: f64, lng: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            name: None,
            icon: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_owned());
        self
    }

    /// Sets the icon configuration.
    pub fn with_icon(mut self, icon: IconConfig) -> Self {
        self.icon = Some(icon);
        self
    }
}
