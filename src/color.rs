//! Color Validation - strict `#RGB`, `#RRGGBB`, `#RRGGBBAA`
//!
//! Named colors and functional notation are rejected so the renderer
//! always receives an exact RGBA value.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::validation::OptionsError;

/// Normalized RGBA color. Only constructed from a validated hex string
/// or from explicit channel values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorValue {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ColorValue {
    pub const BLACK: ColorValue = ColorValue::opaque(0, 0, 0);
    pub const WHITE: ColorValue = ColorValue::opaque(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn rgba(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }

    /// Uppercase hex; the alpha byte is only written when not opaque.
    pub fn to_hex(&self) -> String {
        if self.is_opaque() {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for ColorValue {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

impl Serialize for ColorValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ColorValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        normalize(&s).map_err(serde::de::Error::custom)
    }
}

/// True for `#` followed by exactly 3, 6 or 8 hex digits (any case).
pub fn validate(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => matches!(hex.len(), 3 | 6 | 8) && hex.bytes().all(|b| b.is_ascii_hexdigit()),
        None => false,
    }
}

/// Normalize a hex color string into a [`ColorValue`].
pub fn normalize(s: &str) -> Result<ColorValue, OptionsError> {
    normalize_field("color", s)
}

/// Same as [`normalize`], reporting failures against `field`.
pub fn normalize_field(field: &'static str, s: &str) -> Result<ColorValue, OptionsError> {
    if !validate(s) {
        tracing::warn!(field, value = s, "color rejected");
        return Err(OptionsError::invalid(
            field,
            format!("'{}' is not a #RGB, #RRGGBB or #RRGGBBAA color", s),
        ));
    }

    let digits: Vec<u8> = s[1..].bytes().map(hex_value).collect();
    let color = match digits.as_slice() {
        [r, g, b] => ColorValue::opaque(r * 17, g * 17, b * 17),
        [r1, r2, g1, g2, b1, b2] => ColorValue::opaque(r1 << 4 | r2, g1 << 4 | g2, b1 << 4 | b2),
        [r1, r2, g1, g2, b1, b2, a1, a2] => {
            ColorValue::new(r1 << 4 | r2, g1 << 4 | g2, b1 << 4 | b2, a1 << 4 | a2)
        }
        _ => return Err(OptionsError::invalid(field, "unexpected hex length")),
    };
    Ok(color)
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}
