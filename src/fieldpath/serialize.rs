//! String encoding of paths, used when field sets are persisted.
//!
//! Each element is written as a two-character prefix and a payload:
//! - `f:<name>` for a field name
//! - `k:<json object>` for associative list keys
//! - `v:<json value>` for set items
//! - `i:<number>` for list positions
//!
//! A path is a list of such strings and a set is the sorted list of its paths.

use super::path::{Path, PathElement};
use super::set::Set;
use crate::value::{Field, FieldList, Value};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use thiserror::Error;

/// Error decoding a persisted path element.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathParseError {
    #[error("path element too short: {0:?}")]
    TooShort(String),

    #[error("unknown path element prefix {prefix:?} in {element:?}")]
    UnknownPrefix { prefix: String, element: String },

    #[error("invalid json in path element {element:?}: {message}")]
    InvalidJson { element: String, message: String },

    #[error("invalid list index in {0:?}")]
    InvalidIndex(String),

    #[error("key element {0:?} has no fields")]
    EmptyKey(String),
}

/// Error encoding a path element whose payload has no JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot encode path element {element}: {message}")]
pub struct PathEncodeError {
    pub element: String,
    pub message: String,
}

impl PathElement {
    /// Encodes this element in its persisted form. Non-finite floats have
    /// no JSON form and fail.
    pub fn to_key_string(&self) -> Result<String, PathEncodeError> {
        let encode_err = |message: String| PathEncodeError {
            element: self.to_string(),
            message,
        };
        Ok(match self {
            PathElement::FieldName(name) => format!("f:{}", name),
            PathElement::Key(fields) => {
                if fields.iter().any(|f| !is_finite(&f.value)) {
                    return Err(encode_err("non-finite number".into()));
                }
                let object: BTreeMap<&str, &Value> =
                    fields.iter().map(|f| (f.name.as_str(), &f.value)).collect();
                let json = serde_json::to_string(&object).map_err(|e| encode_err(e.to_string()))?;
                format!("k:{}", json)
            }
            PathElement::Value(v) => {
                if !is_finite(v) {
                    return Err(encode_err("non-finite number".into()));
                }
                let json = serde_json::to_string(v).map_err(|e| encode_err(e.to_string()))?;
                format!("v:{}", json)
            }
            PathElement::Index(i) => format!("i:{}", i),
        })
    }

    /// Decodes an element written by [`PathElement::to_key_string`].
    pub fn from_key_string(s: &str) -> Result<PathElement, PathParseError> {
        let (prefix, payload) = match (s.get(..2), s.get(2..)) {
            (Some(prefix), Some(payload)) => (prefix, payload),
            _ => return Err(PathParseError::TooShort(s.to_string())),
        };
        let invalid_json = |e: serde_json::Error| PathParseError::InvalidJson {
            element: s.to_string(),
            message: e.to_string(),
        };
        match prefix {
            "f:" => Ok(PathElement::FieldName(payload.to_string())),
            "k:" => {
                let object: BTreeMap<String, Value> =
                    serde_json::from_str(payload).map_err(invalid_json)?;
                if object.is_empty() {
                    return Err(PathParseError::EmptyKey(s.to_string()));
                }
                Ok(PathElement::Key(
                    object.into_iter().map(|(n, v)| Field::new(n, v)).collect::<FieldList>(),
                ))
            }
            "v:" => Ok(PathElement::Value(
                serde_json::from_str(payload).map_err(invalid_json)?,
            )),
            "i:" => payload
                .parse()
                .map(PathElement::Index)
                .map_err(|_| PathParseError::InvalidIndex(s.to_string())),
            _ => Err(PathParseError::UnknownPrefix {
                prefix: prefix.to_string(),
                element: s.to_string(),
            }),
        }
    }
}

// serde_json writes NaN and infinities as null, which would not decode back.
fn is_finite(v: &Value) -> bool {
    match v {
        Value::Float(f) => f.is_finite(),
        Value::List(items) => items.iter().all(is_finite),
        Value::Map(fields) => fields.values().all(is_finite),
        _ => true,
    }
}

impl Path {
    pub fn to_key_strings(&self) -> Result<Vec<String>, PathEncodeError> {
        self.iter().map(PathElement::to_key_string).collect()
    }

    pub fn from_key_strings<S: AsRef<str>>(parts: &[S]) -> Result<Path, PathParseError> {
        parts
            .iter()
            .map(|p| PathElement::from_key_string(p.as_ref()))
            .collect()
    }
}

impl Serialize for Path {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_key_strings()
            .map_err(<S::Error as serde::ser::Error>::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Path {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts = Vec::<String>::deserialize(deserializer)?;
        Path::from_key_strings(&parts).map_err(D::Error::custom)
    }
}

impl Serialize for Set {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.paths().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Set {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Vec::<Path>::deserialize(deserializer)?.into_iter().collect())
    }
}
