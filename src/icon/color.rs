//! Color resolution against a styling context.
//!
//! Colors in icon configuration may be literal CSS colors or custom-property
//! references of the form `var(--name)` / `var(--name, fallback)`. Property
//! lookup goes through the [`StyleLookup`] trait so the styling context (a
//! DOM element in the original deployment) can be injected and faked.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Matches `var(--name)` / `var(--name, fallback)` references. Compiled once;
/// resolution runs on every icon pass.
static VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^var\(\s*(--[^,)]+?)\s*(?:,\s*(.+?)\s*)?\)$").expect("valid regex"));

/// Trait for resolving CSS custom properties against a styling context.
pub trait StyleLookup: Send + Sync {
    /// Returns the resolved value of the property, or `None` if unset.
    fn property_value(&self, name: &str) -> Option<String>;

    /// A short description of the lookup context, used in diagnostics.
    fn context(&self) -> &str {
        "default"
    }
}

/// Map-backed [`StyleLookup`] implementation.
#[derive(Debug, Clone, Default)]
pub struct StaticStyles {
    properties: HashMap<String, String>,
    context: String,
}

impl StaticStyles {
    /// Creates an empty style context.
    pub fn new() -> Self {
        Self {
            properties: HashMap::new(),
            context: "static".to_owned(),
        }
    }

    /// Adds a custom property to the context.
    pub fn with_property(mut self, name: &str, value: &str) -> Self {
        self.properties.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Names the context for diagnostics.
    pub fn with_context(mut self, context: &str) -> Self {
        self.context = context.to_owned();
        self
    }
}

impl StyleLookup for StaticStyles {
    fn property_value(&self, name: &str) -> Option<String> {
        self.properties.get(name).cloned()
    }

    fn context(&self) -> &str {
        &self.context
    }
}

/// Resolves a color value, following one level of `var(...)` indirection.
///
/// The value is `color` if present, else `default`. Literal colors pass
/// through unchanged. For a `var(--name[, fallback])` reference the property
/// is looked up in `styles`; an unset property falls back to the reference's
/// own fallback, and failing that a warning names the property and context
/// and the caller's `default` is returned as-is.
pub fn resolve_color(
    styles: &dyn StyleLookup,
    color: Option<&str>,
    default: Option<&str>,
) -> Option<String> {
    let value = color.or(default)?;

    let Some(captures) = VAR_PATTERN.captures(value) else {
        return Some(value.to_owned());
    };

    let property = captures
        .get(1)
        .map(|m| m.as_str())
        .expect("pattern guarantees a property capture");

    match styles.property_value(property) {
        Some(resolved) if !resolved.trim().is_empty() => Some(resolved.trim().to_owned()),
        _ => match captures.get(2) {
            Some(fallback) => Some(fallback.as_str().to_owned()),
            None => {
                warn!(
                    property = property,
                    context = styles.context(),
                    "could not find CSS property in style context"
                );
                default.map(str::to_owned)
            }
        },
    }
}
