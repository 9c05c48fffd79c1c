//! QR Options - the configuration accumulator callers build up before
//! asking for a render.

use serde::{Deserialize, Serialize};

use crate::assets::OverlayFamily;
use crate::color::{self, ColorValue};
use crate::config::StyleConfig;
use crate::label::LabelConfig;
use crate::validation::{run_checks, OptionsError, QR_MARGIN_CHECKS, SIZE_CHECKS};

/// Quiet zone around the symbol, in pixels. Distinct from the label's
/// [`MarginVector`](crate::label::MarginVector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct QrMargin(u32);

impl TryFrom<i64> for QrMargin {
    type Error = OptionsError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<QrMargin> for u32 {
    fn from(margin: QrMargin) -> u32 {
        margin.0
    }
}

impl QrMargin {
    pub fn new(value: i64) -> Result<Self, OptionsError> {
        run_checks("margin", &value, QR_MARGIN_CHECKS)?;
        Ok(Self(value as u32))
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlaySelection {
    pub marker: Option<String>,
    pub cursor: Option<String>,
    pub shape: Option<String>,
}

impl OverlaySelection {
    pub fn get(&self, family: OverlayFamily) -> Option<&str> {
        match family {
            OverlayFamily::Marker => self.marker.as_deref(),
            OverlayFamily::Cursor => self.cursor.as_deref(),
            OverlayFamily::Shape => self.shape.as_deref(),
        }
    }

    fn slot(&mut self, family: OverlayFamily) -> &mut Option<String> {
        match family {
            OverlayFamily::Marker => &mut self.marker,
            OverlayFamily::Cursor => &mut self.cursor,
            OverlayFamily::Shape => &mut self.shape,
        }
    }
}

/// Serialize only, like [`LabelConfig`]: every field is set through a setter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrOptions {
    size: u32,
    margin: QrMargin,
    foreground: ColorValue,
    background: ColorValue,
    label: LabelConfig,
    overlays: OverlaySelection,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: 300,
            margin: QrMargin(10),
            foreground: ColorValue::BLACK,
            background: ColorValue::WHITE,
            label: LabelConfig::default(),
            overlays: OverlaySelection::default(),
        }
    }
}

impl QrOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the defaults carried by a configuration. The defaults
    /// pass through the same setters as caller input.
    pub fn from_config(config: &StyleConfig) -> Result<Self, OptionsError> {
        let mut options = Self {
            foreground: config.default_foreground,
            background: config.default_background,
            ..Self::default()
        };
        options
            .set_size(config.default_size as i64)?
            .set_margin(config.default_margin as i64)?;
        Ok(options)
    }

    pub fn set_size(&mut self, size: i64) -> Result<&mut Self, OptionsError> {
        run_checks("size", &size, SIZE_CHECKS)?;
        self.size = size as u32;
        Ok(self)
    }

    pub fn set_margin(&mut self, margin: i64) -> Result<&mut Self, OptionsError> {
        self.margin = QrMargin::new(margin)?;
        Ok(self)
    }

    pub fn set_color(&mut self, hex: &str) -> Result<&mut Self, OptionsError> {
        self.foreground = color::normalize_field("color", hex)?;
        Ok(self)
    }

    pub fn set_background_color(&mut self, hex: &str) -> Result<&mut Self, OptionsError> {
        self.background = color::normalize_field("background_color", hex)?;
        Ok(self)
    }

    pub fn set_label_text(&mut self, text: &str) -> Result<&mut Self, OptionsError> {
        self.label.set_text(text)?;
        Ok(self)
    }

    pub fn set_label_font_size(&mut self, size: i64) -> Result<&mut Self, OptionsError> {
        self.label.set_font_size(size)?;
        Ok(self)
    }

    pub fn set_label_alignment(&mut self, token: &str) -> Result<&mut Self, OptionsError> {
        self.label.set_alignment(token)?;
        Ok(self)
    }

    pub fn set_label_margin(&mut self, values: &[i32]) -> Result<&mut Self, OptionsError> {
        self.label.set_margin(values)?;
        Ok(self)
    }

    pub fn set_label_color(&mut self, hex: &str) -> Result<&mut Self, OptionsError> {
        self.label.set_color(hex)?;
        Ok(self)
    }

    /// Select an overlay. Unknown keys are rejected here rather than at render time.
    pub fn set_overlay(&mut self, family: OverlayFamily, key: &str) -> Result<&mut Self, OptionsError> {
        family.registry().path_for(key)?;
        *self.overlays.slot(family) = Some(key.to_string());
        Ok(self)
    }

    pub fn set_marker(&mut self, key: &str) -> Result<&mut Self, OptionsError> {
        self.set_overlay(OverlayFamily::Marker, key)
    }

    pub fn set_cursor(&mut self, key: &str) -> Result<&mut Self, OptionsError> {
        self.set_overlay(OverlayFamily::Cursor, key)
    }

    pub fn set_shape(&mut self, key: &str) -> Result<&mut Self, OptionsError> {
        self.set_overlay(OverlayFamily::Shape, key)
    }

    pub fn clear_overlay(&mut self, family: OverlayFamily) -> &mut Self {
        *self.overlays.slot(family) = None;
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn margin(&self) -> QrMargin {
        self.margin
    }

    pub fn foreground(&self) -> ColorValue {
        self.foreground
    }

    pub fn background(&self) -> ColorValue {
        self.background
    }

    pub fn label(&self) -> &LabelConfig {
        &self.label
    }

    pub fn overlays(&self) -> &OverlaySelection {
        &self.overlays
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fluent_chain() {
        let mut opts = QrOptions::new();
        opts.set_color("#FF5733")
            .and_then(|o| o.set_background_color("#FFFFFF"))
            .and_then(|o| o.set_size(300))
            .and_then(|o| o.set_margin(20))
            .unwrap();
        assert_eq!(opts.foreground(), ColorValue::new(0xFF, 0x57, 0x33, 255));
        assert_eq!(opts.size(), 300);
        assert_eq!(opts.margin().get(), 20);
    }

    #[test]
    fn test_rejected_setter_keeps_state() {
        let mut opts = QrOptions::new();
        opts.set_size(250).unwrap();
        assert!(opts.set_size(-100).is_err());
        assert!(opts.set_size(0).is_err());
        assert_eq!(opts.size(), 250);

        assert!(opts.set_margin(-1).is_err());
        assert_eq!(opts.margin().get(), 10);

        assert!(opts.set_color("INVALID_COLOR").is_err());
        assert_eq!(opts.foreground(), ColorValue::BLACK);
    }

    #[test]
    fn test_overlay_selection() {
        let mut opts = QrOptions::new();
        opts.set_marker("M2").unwrap().set_cursor("C3").unwrap().set_shape("S1").unwrap();
        assert_eq!(opts.overlays().get(OverlayFamily::Cursor), Some("C3"));

        let err = opts.set_marker("M5").unwrap_err();
        assert!(matches!(err, OptionsError::UnknownSelector { ref key, .. } if key == "M5"));
        assert_eq!(opts.overlays().marker.as_deref(), Some("M2"));

        // A cursor key is not a marker.
        assert!(opts.set_marker("C1").is_err());

        opts.clear_overlay(OverlayFamily::Shape);
        assert_eq!(opts.overlays().shape, None);
    }

    #[test]
    fn test_from_config_defaults() {
        let config = StyleConfig {
            default_size: 512,
            default_margin: 4,
            ..StyleConfig::default()
        };
        let opts = QrOptions::from_config(&config).unwrap();
        assert_eq!(opts.size(), 512);
        assert_eq!(opts.margin().get(), 4);
        assert_eq!(opts.background(), ColorValue::WHITE);
    }

    #[test]
    fn test_from_config_rejects_unchecked_defaults() {
        let zero_size = StyleConfig { default_size: 0, ..StyleConfig::default() };
        let err = QrOptions::from_config(&zero_size).unwrap_err();
        assert_eq!(err.field(), "size");

        let wide_margin = StyleConfig { default_margin: 999_999, ..StyleConfig::default() };
        let err = QrOptions::from_config(&wide_margin).unwrap_err();
        assert_eq!(err.field(), "margin");
    }

    #[test]
    fn test_margin_json_goes_through_bounds() {
        assert_eq!(serde_json::from_str::<QrMargin>("25").unwrap().get(), 25);
        assert_eq!(serde_json::to_string(&QrMargin::new(25).unwrap()).unwrap(), "25");
        assert!(serde_json::from_str::<QrMargin>("5000").is_err());
        assert!(serde_json::from_str::<QrMargin>("-1").is_err());
    }
}
