//! Icon configuration surface and resolved icon descriptor.
//!
//! These shapes are fed in from the outside (typically as JSON), so they all
//! derive serde. Field names follow the external camelCase convention and
//! renderer variants are tagged by `type` in kebab-case.

use serde::{Deserialize, Serialize};

/// Accent color referenced by the default icon configuration.
pub const DEFAULT_ACCENT_COLOR: &str = "var(--mk-accent-color)";

/// An anchor point expressed as a fraction of width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorFraction {
    pub x: f64,
    pub y: f64,
}

/// An icon template: markup with named placeholders plus its base geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconTemplate {
    /// Template markup containing the substitution placeholders.
    pub source: String,
    /// Base width before scaling.
    pub width: f64,
    /// Base height before scaling.
    pub height: f64,
    /// Anchor point as a fraction of the final size.
    pub anchor: AnchorFraction,
}

/// Visual wrapper parameters applied when synthesizing an icon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WrapOptions {
    /// Replacement template; the built-in pin template is used when absent.
    pub template: Option<IconTemplate>,
    /// Outer fill color (may be a `var(--name)` reference).
    pub fill: Option<String>,
    /// Fill color of the embedded area (may be a `var(--name)` reference).
    pub embed_fill: Option<String>,
    /// Short label rendered inside the marker.
    pub embed_label: Option<String>,
    /// Stroke color for the embedded label.
    pub embed_label_stroke: Option<String>,
    /// Size multiplier applied to the template's base geometry.
    pub scale: Option<f64>,
}

impl WrapOptions {
    /// Merges these options over `base`, field-wise: a field set here wins,
    /// otherwise the base value is kept.
    pub fn merged_over(&self, base: &WrapOptions) -> WrapOptions {
        WrapOptions {
            template: self.template.clone().or_else(|| base.template.clone()),
            fill: self.fill.clone().or_else(|| base.fill.clone()),
            embed_fill: self.embed_fill.clone().or_else(|| base.embed_fill.clone()),
            embed_label: self.embed_label.clone().or_else(|| base.embed_label.clone()),
            embed_label_stroke: self
                .embed_label_stroke
                .clone()
                .or_else(|| base.embed_label_stroke.clone()),
            scale: self.scale.or(base.scale),
        }
    }
}

/// One strategy for producing a marker icon.
///
/// Order within [`IconConfig::renderers`] defines fallback priority: the
/// first renderer whose prerequisites succeed wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RendererSpec {
    /// An image fetched by URL and embedded into the wrapper template.
    /// Skipped if the image cannot be resolved.
    Image {
        url: String,
        #[serde(default)]
        wrap: Option<WrapOptions>,
    },
    /// A flat color filling the wrapper template's embedded area.
    /// Skipped if the color reference cannot be resolved.
    Color {
        color: String,
        #[serde(default)]
        wrap: Option<WrapOptions>,
    },
    /// A fully custom image with explicit geometry; always succeeds.
    Icon {
        url: String,
        width: f64,
        height: f64,
        anchor: AnchorFraction,
    },
    /// The built-in classic pin; always succeeds.
    TraditionalIcon,
}

/// Declarative icon configuration: ordered renderer strategies plus wrap
/// defaults shared by all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IconConfig {
    pub renderers: Vec<RendererSpec>,
    #[serde(default)]
    pub wrap_defaults: Option<WrapOptions>,
}

impl Default for IconConfig {
    /// A single color renderer referencing the accent custom property.
    fn default() -> Self {
        Self {
            renderers: vec![RendererSpec::Color {
                color: DEFAULT_ACCENT_COLOR.to_owned(),
                wrap: None,
            }],
            wrap_defaults: None,
        }
    }
}

/// A concrete renderable icon descriptor.
///
/// Immutable value, safe to share; `icon_url` is either an external URL or
/// an embedded data URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedIcon {
    pub icon_url: String,
    pub icon_size: [f64; 2],
    pub icon_anchor: [f64; 2],
    pub class_name: String,
}
