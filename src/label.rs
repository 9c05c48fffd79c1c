//! Label Configuration
//!
//! Setters validate first and only then mutate, so a rejected call
//! leaves the previous value in place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::color::{self, ColorValue};
use crate::validation::{run_checks, OptionsError, FONT_SIZE_CHECKS};

pub const MAX_LABEL_CHARS: usize = 200;
pub const MARGIN_LIMIT: i32 = 250;
pub const DEFAULT_FONT_SIZE: u32 = 20;
pub const DEFAULT_LABEL_MARGIN: MarginVector = MarginVector { top: 0, right: 10, bottom: 10, left: 10 };

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Alignment {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "center" => Ok(Self::Center),
            "right" => Ok(Self::Right),
            _ => Err(OptionsError::invalid(
                "label_align",
                format!("'{}' is not one of left, center, right", s),
            )),
        }
    }
}

/// Label offsets in pixels: top, right, bottom, left. Each within ±250.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MarginFields")]
pub struct MarginVector {
    top: i32,
    right: i32,
    bottom: i32,
    left: i32,
}

/// Wire form of [`MarginVector`]; only reachable through [`MarginVector::new`].
#[derive(Deserialize)]
struct MarginFields {
    top: i32,
    right: i32,
    bottom: i32,
    left: i32,
}

impl TryFrom<MarginFields> for MarginVector {
    type Error = OptionsError;

    fn try_from(m: MarginFields) -> Result<Self, Self::Error> {
        Self::new(&[m.top, m.right, m.bottom, m.left])
    }
}

impl MarginVector {
    const FIELD: &'static str = "label_margin";

    pub fn new(values: &[i32]) -> Result<Self, OptionsError> {
        let [top, right, bottom, left] = <[i32; 4]>::try_from(values).map_err(|_| {
            OptionsError::MalformedVector {
                field: Self::FIELD,
                index: None,
                reason: format!("expected 4 values, got {}", values.len()),
            }
        })?;
        for (index, value) in values.iter().enumerate() {
            if !(-MARGIN_LIMIT..=MARGIN_LIMIT).contains(value) {
                return Err(OptionsError::MalformedVector {
                    field: Self::FIELD,
                    index: Some(index),
                    reason: format!("{} is outside [-{MARGIN_LIMIT}, {MARGIN_LIMIT}]", value),
                });
            }
        }
        Ok(Self { top, right, bottom, left })
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn right(&self) -> i32 {
        self.right
    }

    pub fn bottom(&self) -> i32 {
        self.bottom
    }

    pub fn left(&self) -> i32 {
        self.left
    }

    pub fn to_array(&self) -> [i32; 4] {
        [self.top, self.right, self.bottom, self.left]
    }
}

impl Default for MarginVector {
    fn default() -> Self {
        DEFAULT_LABEL_MARGIN
    }
}

/// Parses `"top,right,bottom,left"`.
impl FromStr for MarginVector {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .enumerate()
            .map(|(index, part)| {
                part.trim().parse::<i32>().map_err(|_| OptionsError::MalformedVector {
                    field: Self::FIELD,
                    index: Some(index),
                    reason: format!("'{}' is not a number", part.trim()),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&values)
    }
}

/// Escape text for safe embedding in HTML/SVG output.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Serialize only. Values enter through the setters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelConfig {
    text: Option<String>,
    font_size: u32,
    alignment: Alignment,
    margin: MarginVector,
    color: ColorValue,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            text: None,
            font_size: DEFAULT_FONT_SIZE,
            alignment: Alignment::default(),
            margin: DEFAULT_LABEL_MARGIN,
            color: ColorValue::BLACK,
        }
    }
}

impl LabelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the HTML-escaped form. Length is measured on the raw text.
    pub fn set_text(&mut self, text: &str) -> Result<&mut Self, OptionsError> {
        let chars = text.chars().count();
        if chars == 0 {
            return Err(OptionsError::invalid("label_text", "label text must not be empty"));
        }
        if chars > MAX_LABEL_CHARS {
            tracing::warn!(chars, "label text rejected");
            return Err(OptionsError::invalid(
                "label_text",
                format!("label text is {} characters, maximum is {}", chars, MAX_LABEL_CHARS),
            ));
        }
        self.text = Some(escape_html(text));
        Ok(self)
    }

    pub fn set_font_size(&mut self, size: i64) -> Result<&mut Self, OptionsError> {
        run_checks("label_size", &size, FONT_SIZE_CHECKS)?;
        self.font_size = size as u32;
        Ok(self)
    }

    pub fn set_alignment(&mut self, token: &str) -> Result<&mut Self, OptionsError> {
        self.alignment = token.parse()?;
        Ok(self)
    }

    pub fn set_margin(&mut self, values: &[i32]) -> Result<&mut Self, OptionsError> {
        self.margin = MarginVector::new(values)?;
        Ok(self)
    }

    pub fn set_margin_str(&mut self, raw: &str) -> Result<&mut Self, OptionsError> {
        self.margin = raw.parse()?;
        Ok(self)
    }

    pub fn set_color(&mut self, hex: &str) -> Result<&mut Self, OptionsError> {
        self.color = color::normalize_field("label_color", hex)?;
        Ok(self)
    }

    /// Escaped label text, if one was set.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn font_size(&self) -> u32 {
        self.font_size
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn margin(&self) -> MarginVector {
        self.margin
    }

    pub fn color(&self) -> ColorValue {
        self.color
    }

    pub fn has_text(&self) -> bool {
        self.text.is_some()
    }
}
