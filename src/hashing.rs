//! Hashing - SHA-256 fingerprints of resolved render requests
//!
//! Identical content, options and format always hash the same, so the
//! fingerprint can key a render cache.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::output::OutputFormat;
use crate::resolver::ResolvedRenderOptions;

/// Hex digest of the rendered bytes.
pub fn payload_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compact JSON with object keys in byte order at every depth.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string(&key_ordered(serde_json::to_value(value)?))
}

fn key_ordered(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let ordered: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, key_ordered(v))).collect();
            Value::Object(ordered.into_iter().collect::<Map<_, _>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(key_ordered).collect()),
        other => other,
    }
}

/// Digest over content, output format, canonical options and engine
/// version. Each part is followed by a NUL so adjacent parts cannot
/// run together.
pub fn render_fingerprint(
    content: &str,
    options: &ResolvedRenderOptions,
    format: OutputFormat,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let options = canonical_json(options)?;
    let mut hasher = Sha256::new();
    for part in [content, format.extension(), options.as_str(), engine_version] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    Ok(hex::encode(hasher.finalize()))
}
