//! Marker icon configuration and resolution.
//!
//! A marker's icon is described declaratively as an ordered list of renderer
//! strategies ([`RendererSpec`]); [`IconResolver`] tries them in order and
//! falls back on failure until one produces a concrete [`ResolvedIcon`].

pub mod color;
pub mod resolver;
pub mod types;
pub mod wrapper;

pub use color::{resolve_color, StaticStyles, StyleLookup};
pub use resolver::IconResolver;
pub use types::{AnchorFraction, IconConfig, IconTemplate, RendererSpec, ResolvedIcon, WrapOptions};
