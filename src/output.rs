//! Output Format Tokens
//!
//! Maps the caller's format token onto what the renderer can produce.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::validation::OptionsError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Svg,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Svg => "image/svg+xml",
        }
    }

    /// `data:` URI for an encoded payload of this format.
    pub fn data_uri(&self, data: &[u8]) -> String {
        let encoded = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, data);
        format!("data:{};base64,{}", self.mime_type(), encoded)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            _ => Err(OptionsError::invalid(
                "format",
                format!("'{}' is not a supported output format (png, svg)", s),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!("png".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!(" SVG ".parse::<OutputFormat>().unwrap(), OutputFormat::Svg);
        assert!("gif".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_data_uri() {
        assert_eq!(OutputFormat::Svg.data_uri(b"<svg/>"), "data:image/svg+xml;base64,PHN2Zy8+");
    }
}
