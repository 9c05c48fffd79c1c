//! Validation System - Declarative Field Checks
//!
//! Each field owns an ordered list of checks. The first failing check
//! produces the error; nothing after it runs.

use thiserror::Error;

use crate::assets::OverlayFamily;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("Unknown {family} selector '{key}' (allowed: {})", .allowed.join(", "))]
    UnknownSelector {
        family: OverlayFamily,
        key: String,
        allowed: Vec<String>,
    },

    #[error("Malformed {field}{}: {reason}", .index.map(|i| format!(" at index {i}")).unwrap_or_default())]
    MalformedVector {
        field: &'static str,
        index: Option<usize>,
        reason: String,
    },
}

impl OptionsError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue { field, reason: reason.into() }
    }

    /// Field name the error was raised for, or the overlay family for selectors.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidValue { field, .. } | Self::MalformedVector { field, .. } => *field,
            Self::UnknownSelector { family, .. } => family.option_key(),
        }
    }
}

/// A single predicate with the reason reported when it fails.
pub struct FieldCheck<T: ?Sized> {
    pub name: &'static str,
    pub predicate: fn(&T) -> bool,
    pub reason: &'static str,
}

/// Run checks in order, failing on the first predicate that does not hold.
pub fn run_checks<T: ?Sized>(
    field: &'static str,
    value: &T,
    checks: &[FieldCheck<T>],
) -> Result<(), OptionsError> {
    for check in checks {
        if !(check.predicate)(value) {
            tracing::warn!(field, check = check.name, "option rejected");
            return Err(OptionsError::invalid(field, check.reason));
        }
    }
    Ok(())
}

/// Parse an integer option, trimming surrounding whitespace.
pub fn parse_integer(field: &'static str, raw: &str) -> Result<i64, OptionsError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| OptionsError::invalid(field, format!("'{}' is not an integer", raw)))
}

// --- Shared check lists ---

pub const MAX_QR_MARGIN: i64 = 1000;

pub const SIZE_CHECKS: &[FieldCheck<i64>] = &[
    FieldCheck { name: "positive", predicate: |v| *v > 0, reason: "size must be greater than 0" },
    FieldCheck { name: "fits_u32", predicate: |v| *v <= u32::MAX as i64, reason: "size is too large" },
];

pub const QR_MARGIN_CHECKS: &[FieldCheck<i64>] = &[
    FieldCheck { name: "non_negative", predicate: |v| *v >= 0, reason: "margin must not be negative" },
    FieldCheck { name: "bounded", predicate: |v| *v <= MAX_QR_MARGIN, reason: "margin must not exceed 1000" },
];

pub const FONT_SIZE_CHECKS: &[FieldCheck<i64>] = &[
    FieldCheck { name: "positive", predicate: |v| *v > 0, reason: "font size must be greater than 0" },
    FieldCheck { name: "fits_u32", predicate: |v| *v <= u32::MAX as i64, reason: "font size is too large" },
];
