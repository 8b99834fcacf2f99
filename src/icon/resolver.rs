//! Ordered-fallback resolution of icon configurations.

use std::sync::Arc;

use tracing::debug;

use super::color::{resolve_color, StyleLookup};
use super::types::{IconConfig, RendererSpec, ResolvedIcon, WrapOptions};
use super::wrapper::{custom_icon, traditional_icon, wrapped_icon};
use crate::image::{ImageCache, ImageFetcher};

/// Embed fill referenced by the synthesized last-resort icon.
pub const DEFAULT_EMBED_FILL: &str = "var(--mk-map-marker-default-embed-fill)";

/// Resolves a declarative [`IconConfig`] to a concrete [`ResolvedIcon`].
///
/// Renderers are tried in configuration order; the first one whose
/// prerequisites succeed wins. `image` renderers consult the [`ImageCache`]
/// and `color` renderers the [`StyleLookup`]; both fall through to the next
/// renderer on failure. Resolution never fails outright: when every renderer
/// falls through, the caller's default icon or a synthesized default-accent
/// color icon is returned.
pub struct IconResolver<F> {
    cache: Arc<ImageCache<F>>,
    styles: Arc<dyn StyleLookup>,
}

impl<F: ImageFetcher + 'static> IconResolver<F> {
    /// Creates a resolver over an image cache and a styling context.
    pub fn new(cache: Arc<ImageCache<F>>, styles: Arc<dyn StyleLookup>) -> Self {
        Self { cache, styles }
    }

    /// Resolves `config` to a renderable icon, falling back to `default`
    /// (or a synthesized color icon) when no renderer succeeds.
    pub async fn resolve_icon(
        &self,
        config: &IconConfig,
        default: Option<&ResolvedIcon>,
    ) -> ResolvedIcon {
        for renderer in &config.renderers {
            match renderer {
                RendererSpec::Image { url, wrap } => {
                    let Some(resolved_url) = self.cache.resolve(url).await else {
                        debug!(url = %url, "image renderer unresolved, trying next renderer");
                        continue;
                    };
                    let wrap = merged_wrap(config.wrap_defaults.as_ref(), wrap.as_ref());
                    return wrapped_icon(
                        self.styles.as_ref(),
                        Some(&resolved_url),
                        &["image"],
                        &wrap,
                    );
                }
                RendererSpec::Color { color, wrap } => {
                    let Some(resolved) = resolve_color(self.styles.as_ref(), Some(color), None)
                    else {
                        debug!(color = %color, "color renderer unresolved, trying next renderer");
                        continue;
                    };
                    let mut wrap = merged_wrap(config.wrap_defaults.as_ref(), wrap.as_ref());
                    // The resolved color always drives the embedded area.
                    wrap.embed_fill = Some(resolved);
                    return wrapped_icon(self.styles.as_ref(), None, &["color"], &wrap);
                }
                RendererSpec::Icon {
                    url,
                    width,
                    height,
                    anchor,
                } => return custom_icon(url, *width, *height, *anchor),
                RendererSpec::TraditionalIcon => return traditional_icon(),
            }
        }

        default.cloned().unwrap_or_else(|| {
            wrapped_icon(
                self.styles.as_ref(),
                None,
                &["color"],
                &WrapOptions {
                    embed_fill: Some(DEFAULT_EMBED_FILL.to_owned()),
                    ..Default::default()
                },
            )
        })
    }
}

/// Merges a renderer's wrap options over the config-level defaults.
fn merged_wrap(defaults: Option<&WrapOptions>, wrap: Option<&WrapOptions>) -> WrapOptions {
    match (defaults, wrap) {
        (Some(defaults), Some(wrap)) => wrap.merged_over(defaults),
        (Some(defaults), None) => defaults.clone(),
        (None, Some(wrap)) => wrap.clone(),
        (None, None) => WrapOptions::default(),
    }
}
