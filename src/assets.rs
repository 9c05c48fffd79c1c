//! Asset Registry - Overlay Selector Contracts
//!
//! Every overlay family declares its selectors as a static table. The
//! tables are the only source of truth for which keys exist; nothing is
//! discovered or registered at runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::validation::OptionsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayFamily {
    Marker,
    Cursor,
    Shape,
}

impl OverlayFamily {
    pub const ALL: [OverlayFamily; 3] = [Self::Marker, Self::Cursor, Self::Shape];

    /// Single-letter tag every selector of this family starts with.
    pub fn prefix(&self) -> char {
        match self {
            Self::Marker => 'M',
            Self::Cursor => 'C',
            Self::Shape => 'S',
        }
    }

    /// Raw option key used to select an overlay of this family.
    pub fn option_key(&self) -> &'static str {
        match self {
            Self::Marker => "marker",
            Self::Cursor => "cursor",
            Self::Shape => "shape",
        }
    }

    pub fn registry(&self) -> AssetRegistry {
        match self {
            Self::Marker => AssetRegistry::new(*self, MARKER_ASSETS),
            Self::Cursor => AssetRegistry::new(*self, CURSOR_ASSETS),
            Self::Shape => AssetRegistry::new(*self, SHAPE_ASSETS),
        }
    }
}

impl fmt::Display for OverlayFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_key())
    }
}

// Paths are relative to the configured asset root.

const MARKER_ASSETS: &[(&str, &str)] = &[
    ("M1", "markers/marker_1.png"),
    ("M2", "markers/marker_2.png"),
    ("M3", "markers/marker_3.png"),
    ("M4", "markers/marker_4.png"),
];

const CURSOR_ASSETS: &[(&str, &str)] = &[
    ("C1", "cursors/cursor_1.png"),
    ("C2", "cursors/cursor_2.png"),
    ("C3", "cursors/cursor_3.png"),
    ("C4", "cursors/cursor_4.png"),
];

const SHAPE_ASSETS: &[(&str, &str)] = &[
    ("S1", "shapes/shape_1.png"),
    ("S2", "shapes/shape_2.png"),
    ("S3", "shapes/shape_3.png"),
    ("S4", "shapes/shape_4.png"),
];

/// Extensions the renderer can composite.
pub const SUPPORTED_ASSET_EXTENSIONS: &[&str] = &["png"];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Asset {key} not found at {}", .path.display())]
    Missing { key: String, path: PathBuf },

    #[error("Asset {key} has unsupported format: {}", .path.display())]
    UnsupportedFormat { key: String, path: PathBuf },
}

/// Read-only view over one family's selector table.
#[derive(Debug, Clone, Copy)]
pub struct AssetRegistry {
    family: OverlayFamily,
    entries: &'static [(&'static str, &'static str)],
}

impl AssetRegistry {
    fn new(family: OverlayFamily, entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { family, entries }
    }

    pub fn family(&self) -> OverlayFamily {
        self.family
    }

    /// All selector keys carrying the family prefix, mapped to their asset paths.
    pub fn all_paths(&self) -> BTreeMap<&'static str, &'static str> {
        let prefix = self.family.prefix();
        self.entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .copied()
            .collect()
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.all_paths().into_keys().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.all_paths().contains_key(key)
    }

    /// Look up a selector, failing with the allowed set when it is unknown.
    pub fn path_for(&self, key: &str) -> Result<&'static str, OptionsError> {
        self.all_paths().get(key).copied().ok_or_else(|| {
            tracing::warn!(family = %self.family, key, "unknown overlay selector");
            OptionsError::UnknownSelector {
                family: self.family,
                key: key.to_string(),
                allowed: self.keys().into_iter().map(str::to_string).collect(),
            }
        })
    }

    /// Check every declared asset exists under `root` in a supported format.
    pub fn verify(&self, root: &Path) -> Result<(), AssetError> {
        for (key, rel) in self.all_paths() {
            let path = root.join(rel);
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or(false, |e| {
                    SUPPORTED_ASSET_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s))
                });
            if !supported {
                return Err(AssetError::UnsupportedFormat { key: key.to_string(), path });
            }
            if !path.is_file() {
                return Err(AssetError::Missing { key: key.to_string(), path });
            }
        }
        Ok(())
    }
}

/// Verify the assets of every overlay family.
pub fn verify_all(root: &Path) -> Result<(), AssetError> {
    OverlayFamily::ALL
        .iter()
        .try_for_each(|family| family.registry().verify(root))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_family_lists_its_own_keys() {
        assert_eq!(OverlayFamily::Marker.registry().keys(), vec!["M1", "M2", "M3", "M4"]);
        assert_eq!(OverlayFamily::Cursor.registry().keys(), vec!["C1", "C2", "C3", "C4"]);
        assert_eq!(OverlayFamily::Shape.registry().keys(), vec!["S1", "S2", "S3", "S4"]);
    }

    #[test]
    fn test_prefix_filter_excludes_foreign_keys() {
        const MIXED: &[(&str, &str)] = &[("C1", "c.png"), ("M9", "m.png")];
        let registry = AssetRegistry::new(OverlayFamily::Cursor, MIXED);
        assert_eq!(registry.keys(), vec!["C1"]);
        assert!(!registry.contains("M9"));
    }

    #[test]
    fn test_unknown_selector_names_key_and_allowed_set() {
        let err = OverlayFamily::Marker.registry().path_for("M5").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("M5"));
        assert!(msg.contains("M1, M2, M3, M4"));
        assert_eq!(err.field(), "marker");
    }

    #[test]
    fn test_selectors_are_case_sensitive() {
        assert!(OverlayFamily::Shape.registry().path_for("s1").is_err());
        assert_eq!(OverlayFamily::Shape.registry().path_for("S1").unwrap(), "shapes/shape_1.png");
    }

    #[test]
    fn test_verify_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = OverlayFamily::Marker.registry().verify(dir.path()).unwrap_err();
        assert!(matches!(err, AssetError::Missing { ref key, .. } if key == "M1"));
    }

    #[test]
    fn test_verify_rejects_unsupported_format() {
        const BAD: &[(&str, &str)] = &[("S1", "shapes/shape_1.gif")];
        let dir = tempfile::tempdir().unwrap();
        let err = AssetRegistry::new(OverlayFamily::Shape, BAD).verify(dir.path()).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_verify_all_with_complete_tree() {
        let dir = tempfile::tempdir().unwrap();
        for family in OverlayFamily::ALL {
            for rel in family.registry().all_paths().values() {
                let path = dir.path().join(rel);
                std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                std::fs::write(&path, b"png").unwrap();
            }
        }
        assert!(verify_all(dir.path()).is_ok());
    }
}
