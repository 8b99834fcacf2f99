//! Icon synthesis from wrapper templates.
//!
//! A wrapper template is markup with named placeholders for geometry, fill
//! colors, an embedded image URL, and a label. Synthesis substitutes the
//! placeholders and emits a self-contained [`ResolvedIcon`] whose URL is the
//! inline-encoded template. Geometry: final width/height are the template's
//! base size times `scale`, and the anchor point is the final size times the
//! template's anchor fraction.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;

use super::color::{resolve_color, StyleLookup};
use super::types::{AnchorFraction, IconTemplate, ResolvedIcon, WrapOptions};

/// Collapses newlines plus surrounding indentation in template markup.
/// Compiled once; synthesis runs on every icon pass.
static COLLAPSE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n\s*").expect("valid regex"));

/// Class-name prefix identifying the renderer type(s) of a resolved icon.
pub const CLASS_PREFIX: &str = "mk-map-marker--type-";

/// Built-in pin template, 60x70 with the tip at the bottom center.
const DEFAULT_TEMPLATE_SOURCE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="__WIDTH__" height="__HEIGHT__" viewBox="0 0 60 70">
  <path fill="__FILL_COLOR__" d="M30 0C13.4 0 0 13.4 0 30c0 10.6 5.5 19.9 13.9 25.2L30 70l16.1-14.8C54.5 49.9 60 40.6 60 30 60 13.4 46.6 0 30 0z"/>
  <circle cx="30" cy="29" r="22" fill="__EMBED_FILL_COLOR__"/>
  <image x="8" y="7" width="44" height="44" clip-path="circle(22px at 22px 22px)" xlink:href="__EMBED_URL__"/>
  <text x="30" y="37" text-anchor="middle" fill="__EMBED_LABEL_COLOR__" font-family="sans-serif" font-size="22">__EMBED_LABEL__</text>
</svg>"##;

/// Built-in classic pin, 25x41 with the tip at the bottom center.
const TRADITIONAL_ICON_SOURCE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="25" height="41" viewBox="0 0 25 41">
  <path fill="#2e6fb7" stroke="#1d4a7a" d="M12.5 0.5C5.9 0.5 0.5 5.9 0.5 12.5c0 9 12 28 12 28s12-19 12-28C24.5 5.9 19.1 0.5 12.5 0.5z"/>
  <circle cx="12.5" cy="12.5" r="5" fill="#fff"/>
</svg>"##;

/// Returns the built-in pin template.
pub fn default_template() -> IconTemplate {
    IconTemplate {
        source: DEFAULT_TEMPLATE_SOURCE.to_owned(),
        width: 60.0,
        height: 70.0,
        anchor: AnchorFraction { x: 0.5, y: 1.0 },
    }
}

/// Composes the icon class name for a list of renderer types.
fn class_name(renderer_types: &[&str]) -> String {
    renderer_types
        .iter()
        .map(|renderer_type| format!("{}{}", CLASS_PREFIX, renderer_type))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Encodes markup as an inline SVG data URL.
fn svg_data_url(svg: &str) -> String {
    format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
}

/// Formats a dimension the way templates expect: integral values without a
/// fractional part.
fn format_dimension(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// The built-in traditional pin icon.
pub fn traditional_icon() -> ResolvedIcon {
    ResolvedIcon {
        icon_url: svg_data_url(TRADITIONAL_ICON_SOURCE),
        icon_size: [25.0, 41.0],
        icon_anchor: [12.5, 41.0],
        class_name: class_name(&["icon", "traditional-icon"]),
    }
}

/// An icon from a fully custom image with explicit geometry.
pub fn custom_icon(url: &str, width: f64, height: f64, anchor: AnchorFraction) -> ResolvedIcon {
    ResolvedIcon {
        icon_url: url.to_owned(),
        icon_size: [width, height],
        icon_anchor: [width * anchor.x, height * anchor.y],
        class_name: class_name(&["icon"]),
    }
}

/// Synthesizes a wrapped icon from a template and wrap options.
///
/// `image_url` fills the template's embed slot when present (the `image`
/// renderer); the `color` renderer leaves it empty and drives the embedded
/// area via `embed_fill`. Color fields may be `var(...)` references and are
/// resolved against `styles`.
pub fn wrapped_icon(
    styles: &dyn StyleLookup,
    image_url: Option<&str>,
    renderer_types: &[&str],
    wrap: &WrapOptions,
) -> ResolvedIcon {
    let template = wrap.template.clone().unwrap_or_else(default_template);
    let scale = wrap.scale.unwrap_or(1.0);

    let fill =
        resolve_color(styles, wrap.fill.as_deref(), None).unwrap_or_else(|| "#fff".to_owned());
    let embed_fill =
        resolve_color(styles, wrap.embed_fill.as_deref(), None).unwrap_or_else(|| fill.clone());
    let label_color = resolve_color(styles, wrap.embed_label_stroke.as_deref(), None)
        .unwrap_or_else(|| "#fff".to_owned());

    let width = template.width * scale;
    let height = template.height * scale;

    let svg = COLLAPSE_WHITESPACE
        .replace_all(&template.source, " ")
        .replace("__WIDTH__", &format_dimension(width))
        .replace("__HEIGHT__", &format_dimension(height))
        .replace("__FILL_COLOR__", &fill)
        .replace("__EMBED_FILL_COLOR__", &embed_fill)
        .replace("__EMBED_URL__", image_url.unwrap_or(""))
        .replace("__EMBED_LABEL_COLOR__", &label_color)
        .replace("__EMBED_LABEL__", wrap.embed_label.as_deref().unwrap_or(""));

    ResolvedIcon {
        icon_url: svg_data_url(&svg),
        icon_size: [width, height],
        icon_anchor: [width * template.anchor.x, height * template.anchor.y],
        class_name: class_name(renderer_types),
    }
}
