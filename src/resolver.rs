//! Render Options Resolver
//!
//! Turns loosely typed caller options into the immutable bundle handed
//! to the renderer. Fields are checked in a fixed order and the first
//! failure aborts resolution.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::assets::OverlayFamily;
use crate::color::ColorValue;
use crate::config::{ConfigError, StyleConfig};
use crate::label::{Alignment, MarginVector};
use crate::options::QrOptions;
use crate::validation::{parse_integer, OptionsError};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static RESOLVE_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_resolve_call_count() -> u32 {
    RESOLVE_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_resolve_call_count() {
    RESOLVE_CALL_COUNT.store(0, Ordering::SeqCst);
}

struct RawField {
    key: &'static str,
    apply: fn(&mut QrOptions, &str) -> Result<(), OptionsError>,
}

/// Recognized raw keys, in the order they are validated.
const RAW_FIELDS: &[RawField] = &[
    RawField { key: "size", apply: |o, v| o.set_size(parse_integer("size", v)?).map(drop) },
    RawField { key: "margin", apply: |o, v| o.set_margin(parse_integer("margin", v)?).map(drop) },
    RawField { key: "color", apply: |o, v| o.set_color(v).map(drop) },
    RawField { key: "background_color", apply: |o, v| o.set_background_color(v).map(drop) },
    RawField { key: "label_text", apply: |o, v| o.set_label_text(v).map(drop) },
    RawField {
        key: "label_size",
        apply: |o, v| o.set_label_font_size(parse_integer("label_size", v)?).map(drop),
    },
    RawField { key: "label_align", apply: |o, v| o.set_label_alignment(v).map(drop) },
    RawField {
        key: "label_margin",
        apply: |o, v| {
            let margin: MarginVector = v.parse()?;
            o.set_label_margin(&margin.to_array()).map(drop)
        },
    },
    RawField { key: "label_color", apply: |o, v| o.set_label_color(v).map(drop) },
    RawField { key: "marker", apply: |o, v| o.set_marker(v).map(drop) },
    RawField { key: "cursor", apply: |o, v| o.set_cursor(v).map(drop) },
    RawField { key: "shape", apply: |o, v| o.set_shape(v).map(drop) },
];

pub fn recognized_keys() -> impl Iterator<Item = &'static str> {
    RAW_FIELDS.iter().map(|field| field.key)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLabel {
    pub text: String,
    pub font_size: u32,
    pub alignment: Alignment,
    pub margin: MarginVector,
    pub color: ColorValue,
}

/// Fully validated bundle for one render. Only [`RenderOptionsResolver`]
/// builds one, fresh per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRenderOptions {
    size: u32,
    margin: u32,
    foreground: ColorValue,
    background: ColorValue,
    label: Option<ResolvedLabel>,
    marker_asset_path: Option<PathBuf>,
    cursor_asset_path: Option<PathBuf>,
    shape_asset_path: Option<PathBuf>,
}

impl ResolvedRenderOptions {
    pub fn size(&self) -> u32 { self.size }
    pub fn margin(&self) -> u32 { self.margin }
    pub fn foreground(&self) -> ColorValue { self.foreground }
    pub fn background(&self) -> ColorValue { self.background }
    pub fn label(&self) -> Option<&ResolvedLabel> { self.label.as_ref() }
    pub fn marker_asset_path(&self) -> Option<&PathBuf> { self.marker_asset_path.as_ref() }
    pub fn cursor_asset_path(&self) -> Option<&PathBuf> { self.cursor_asset_path.as_ref() }
    pub fn shape_asset_path(&self) -> Option<&PathBuf> { self.shape_asset_path.as_ref() }

    pub fn asset_path(&self, family: OverlayFamily) -> Option<&PathBuf> {
        match family {
            OverlayFamily::Marker => self.marker_asset_path(),
            OverlayFamily::Cursor => self.cursor_asset_path(),
            OverlayFamily::Shape => self.shape_asset_path(),
        }
    }
}

pub struct RenderOptionsResolver {
    config: StyleConfig,
    seed: QrOptions,
}

impl RenderOptionsResolver {
    /// Fails when the configured defaults would not pass their own setters.
    pub fn new(config: StyleConfig) -> Result<Self, ConfigError> {
        config.check()?;
        let seed = QrOptions::from_config(&config)?;
        Ok(Self { config, seed })
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    /// Fresh options seeded from the configured defaults.
    pub fn options(&self) -> QrOptions {
        self.seed.clone()
    }

    /// Resolve a raw key/value mapping. Unrecognized keys are ignored.
    pub fn resolve(&self, raw: &BTreeMap<String, String>) -> Result<ResolvedRenderOptions, OptionsError> {
        for key in raw.keys() {
            if !RAW_FIELDS.iter().any(|field| field.key == key.as_str()) {
                tracing::warn!(key = %key, "ignoring unrecognized option");
            }
        }

        let mut options = self.options();
        for field in RAW_FIELDS {
            if let Some(value) = raw.get(field.key) {
                (field.apply)(&mut options, value)?;
            }
        }
        self.resolve_options(&options)
    }

    /// Reconcile an already built configuration against the asset registries.
    pub fn resolve_options(&self, options: &QrOptions) -> Result<ResolvedRenderOptions, OptionsError> {
        #[cfg(feature = "test-hooks")]
        RESOLVE_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        let label = options.label();
        let label = label.text().map(|text| ResolvedLabel {
            text: text.to_string(),
            font_size: label.font_size(),
            alignment: label.alignment(),
            margin: label.margin(),
            color: label.color(),
        });

        let resolved = ResolvedRenderOptions {
            size: options.size(),
            margin: options.margin().get(),
            foreground: options.foreground(),
            background: options.background(),
            label,
            marker_asset_path: self.asset_path(options, OverlayFamily::Marker)?,
            cursor_asset_path: self.asset_path(options, OverlayFamily::Cursor)?,
            shape_asset_path: self.asset_path(options, OverlayFamily::Shape)?,
        };

        tracing::debug!(
            size = resolved.size,
            margin = resolved.margin,
            foreground = %resolved.foreground,
            background = %resolved.background,
            labelled = resolved.label.is_some(),
            "resolved render options"
        );
        Ok(resolved)
    }

    fn asset_path(&self, options: &QrOptions, family: OverlayFamily) -> Result<Option<PathBuf>, OptionsError> {
        options
            .overlays()
            .get(family)
            .map(|key| {
                family
                    .registry()
                    .path_for(key)
                    .map(|rel| self.config.asset_root.join(rel))
            })
            .transpose()
    }
}

impl Default for RenderOptionsResolver {
    fn default() -> Self {
        Self {
            config: StyleConfig::default(),
            seed: QrOptions::default(),
        }
    }
}
