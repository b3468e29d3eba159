//! Sparse attribute vectors (spec §3, component C4).

use std::collections::BTreeMap;
use std::fmt;

use cicada_core::Vocab;
use serde::{Deserialize, Serialize};

/// Interned identifier for an attribute key (e.g. `"dependency-head"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributeId(u32);

impl AttributeId {
    /// Interns `name` and returns its stable attribute id.
    pub fn intern(name: &str) -> Self {
        AttributeId(Vocab::intern(name))
    }

    /// Resolves this id back to its attribute name.
    pub fn text(self) -> Box<str> {
        Vocab::resolve(self.0)
    }
}

impl fmt::Display for AttributeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

/// A tagged attribute value, per the attribute JSON grammar in spec §6:
/// `{"key": (int|float|"string"), ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// A signed integer value.
    Int(i64),
    /// A floating point value.
    Float(f64),
    /// A UTF-8 string value.
    String(Box<str>),
}

/// Ordered sparse mapping from interned attribute id to a tagged value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeVector {
    values: BTreeMap<AttributeId, AttributeValue>,
}

impl AttributeVector {
    /// Creates an empty attribute vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no attributes are present.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the number of stored attributes.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns the value stored for `key`, if any.
    pub fn get(&self, key: AttributeId) -> Option<&AttributeValue> {
        self.values.get(&key)
    }

    /// Sets `key` to `value`.
    pub fn set(&mut self, key: AttributeId, value: AttributeValue) {
        self.values.insert(key, value);
    }

    /// Removes `key`, returning its previous value if present.
    pub fn remove(&mut self, key: AttributeId) -> Option<AttributeValue> {
        self.values.remove(&key)
    }

    /// Iterates over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (AttributeId, &AttributeValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Merges `other` into `self`, with `other`'s values taking precedence
    /// on key collision (used when composing edges during debinarization).
    pub fn merge_from(&mut self, other: &AttributeVector) {
        for (key, value) in other.iter() {
            self.values.insert(key, value.clone());
        }
    }
}

/// Parses the attribute JSON grammar from spec §6:
/// `{"key": (int|float|"string"), ...}` with `\uXXXX` string escapes (the
/// standard JSON escape set, handled by `serde_json`).
pub fn parse_attributes_json(text: &str) -> Result<AttributeVector, cicada_core::CicadaError> {
    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(text).map_err(|err| {
        cicada_core::CicadaError::malformed_input("attr-json-parse", err.to_string())
    })?;
    let mut attrs = AttributeVector::new();
    for (key, value) in raw {
        let id = AttributeId::intern(&key);
        let value = match value {
            serde_json::Value::Number(n) if n.is_i64() => AttributeValue::Int(n.as_i64().unwrap()),
            serde_json::Value::Number(n) if n.is_u64() => {
                AttributeValue::Int(n.as_u64().unwrap() as i64)
            }
            serde_json::Value::Number(n) => AttributeValue::Float(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => AttributeValue::String(s.into_boxed_str()),
            other => {
                return Err(cicada_core::CicadaError::malformed_input(
                    "attr-json-type",
                    format!("unsupported attribute value: {other}"),
                ))
            }
        };
        attrs.set(id, value);
    }
    Ok(attrs)
}

/// Serializes `attrs` back into the spec §6 JSON grammar.
pub fn attributes_to_json(attrs: &AttributeVector) -> Result<String, cicada_core::CicadaError> {
    let mut map = serde_json::Map::new();
    for (key, value) in attrs.iter() {
        let json_value = match value {
            AttributeValue::Int(i) => serde_json::Value::from(*i),
            AttributeValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AttributeValue::String(s) => serde_json::Value::String(s.to_string()),
        };
        map.insert(key.text().to_string(), json_value);
    }
    serde_json::to_string(&serde_json::Value::Object(map))
        .map_err(|err| cicada_core::CicadaError::malformed_input("attr-json-write", err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_core::Vocab;

    #[test]
    fn json_round_trip() {
        Vocab::reset();
        let text = r#"{"dependency-head": 3, "dependency-pos": "NN", "weight": 1.5}"#;
        let attrs = parse_attributes_json(text).unwrap();
        assert_eq!(attrs.len(), 3);
        let head = AttributeId::intern("dependency-head");
        assert_eq!(attrs.get(head), Some(&AttributeValue::Int(3)));

        let rendered = attributes_to_json(&attrs).unwrap();
        let reparsed = parse_attributes_json(&rendered).unwrap();
        assert_eq!(reparsed, attrs);
    }

    #[test]
    fn unicode_escape_round_trips() {
        Vocab::reset();
        let text = r#"{"note": "café"}"#;
        let attrs = parse_attributes_json(text).unwrap();
        let note = AttributeId::intern("note");
        assert_eq!(
            attrs.get(note),
            Some(&AttributeValue::String("café".into()))
        );
    }
}
