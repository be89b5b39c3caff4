//! Canonical encoding of value trees.
//!
//! The canonical form is representation-exact: two trees encode identically
//! iff they are the same declared types with the same raw payloads, set
//! membership order aside. It is used to deduplicate sets, to pair raw-equal
//! set members, and to give set candidates a stable ordering.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Number};

use crate::value::{TypedValue, Value};

const FINGERPRINT_DOMAIN: &str = "semeq-value-v1";

/// Canonical JSON form of a value tree.
///
/// Every node encodes as `{"t": <type>, "k": <kind>, "v": <payload>}`.
/// Set members are sorted by their own canonical text. Non-finite floats
/// are encoded as strings, and `-0.0` stays distinct from `0.0`.
pub fn canonical_json(value: &TypedValue) -> serde_json::Value {
    let payload = match value.value() {
        Value::Null | Value::Unknown => serde_json::Value::Null,
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Float(f) => match Number::from_f64(*f) {
            Some(n) => serde_json::Value::Number(n),
            None if f.is_nan() => json!("NaN"),
            None if *f > 0.0 => json!("inf"),
            None => json!("-inf"),
        },
        Value::String(s) => json!(s),
        Value::Sequence(items) => serde_json::Value::Array(items.iter().map(canonical_json).collect()),
        Value::Set(items) => {
            let mut encoded: Vec<(String, serde_json::Value)> = items
                .iter()
                .map(|item| {
                    let json = canonical_json(item);
                    (json.to_string(), json)
                })
                .collect();
            encoded.sort_by(|a, b| a.0.cmp(&b.0));
            serde_json::Value::Array(encoded.into_iter().map(|(_, j)| j).collect())
        }
        Value::Map(entries) | Value::Object(entries) => {
            let mut map = Map::new();
            for (k, v) in entries {
                map.insert(k.clone(), canonical_json(v));
            }
            serde_json::Value::Object(map)
        }
    };

    json!({
        "t": value.type_id().to_string(),
        "k": value.value().kind_name(),
        "v": payload,
    })
}

/// Compact canonical text of a value tree.
pub fn canonical_string(value: &TypedValue) -> String {
    canonical_json(value).to_string()
}

impl TypedValue {
    /// See [`canonical_string`].
    pub fn canonical_string(&self) -> String {
        canonical_string(self)
    }

    /// See [`Fingerprint::of`].
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// Domain-separated BLAKE3 hash of a value's canonical text.
///
/// Equal fingerprints mean raw-identical representations; the set matcher
/// uses them to pair members before any semantic comparison runs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(value: &TypedValue) -> Self {
        Self::from_canonical(&canonical_string(value))
    }

    /// Fingerprint of text previously produced by [`canonical_string`].
    pub fn from_canonical(text: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(FINGERPRINT_DOMAIN.as_bytes());
        hasher.update(b":");
        hasher.update(text.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First 8 hex characters.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.short_hex())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}
