//! Object tree values.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Map holds the fields of an object node, ordered by name.
pub type Map = BTreeMap<String, Value>;

/// Value is one node of a JSON/YAML object tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Float(_) => 3,
            Value::String(_) => 4,
            Value::List(_) => 5,
            Value::Map(_) => 6,
        }
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns true for null, an empty map and an empty list.
    pub fn is_empty_container(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Map(m) => m.is_empty(),
            Value::List(items) => items.is_empty(),
            _ => false,
        }
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::String(s) => s.hash(state),
            Value::List(items) => items.hash(state),
            Value::Map(m) => m.hash(state),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Field is one named component of an associative list key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Field {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// FieldList is a list of key fields kept sorted by name, so that two lists
/// naming the same keys compare equal regardless of construction order.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldList {
    fields: Vec<Field>,
}

impl FieldList {
    pub fn new(mut fields: Vec<Field>) -> Self {
        fields.sort_by(|a, b| a.name.cmp(&b.name));
        FieldList { fields }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Returns true if every key field matches the corresponding entry of `map`.
    pub fn matches(&self, map: &Map) -> bool {
        self.fields.iter().all(|f| map.get(&f.name) == Some(&f.value))
    }
}

impl FromIterator<Field> for FieldList {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        FieldList::new(iter.into_iter().collect())
    }
}

/// Parses a value from JSON.
pub fn from_json(json: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(json)
}

/// Serializes a value to JSON.
pub fn to_json(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string(value)
}

/// Parses a value from YAML.
pub fn from_yaml(yaml: &str) -> Result<Value, serde_yaml::Error> {
    serde_yaml::from_str(yaml)
}

/// Serializes a value to YAML.
pub fn to_yaml(value: &Value) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_ordering_across_kinds() {
        assert!(Value::Null < Value::Bool(false));
        assert!(Value::Int(10) < Value::Float(0.5));
        assert!(Value::from("a") < Value::from("b"));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
    }

    #[test]
    fn test_field_list_is_sorted() {
        let a = FieldList::new(vec![Field::new("b", 2), Field::new("a", 1)]);
        let b = FieldList::new(vec![Field::new("a", 1), Field::new("b", 2)]);
        assert_eq!(a, b);
        assert_eq!(a.get("b"), Some(&Value::Int(2)));
        assert!(a.iter().next().is_some_and(|f| f.name == "a"));
    }

    #[test]
    fn test_field_list_matches() {
        let key = FieldList::new(vec![Field::new("name", "a")]);
        let mut item = Map::new();
        item.insert("name".into(), "a".into());
        item.insert("value".into(), 1.into());
        assert!(key.matches(&item));

        item.insert("name".into(), "b".into());
        assert!(!key.matches(&item));
    }

    #[test]
    fn test_yaml_parsing() {
        let v = from_yaml("numeric: 1\nstring: s\nbool: true\nratio: 0.5").unwrap();
        let m = v.as_map().unwrap();
        assert_eq!(m.get("numeric"), Some(&Value::Int(1)));
        assert_eq!(m.get("string"), Some(&Value::from("s")));
        assert_eq!(m.get("bool"), Some(&Value::Bool(true)));
        assert_eq!(m.get("ratio"), Some(&Value::Float(0.5)));
    }

    #[test]
    fn test_json_output_is_stable() {
        let v = from_json(r#"{"b": [1, "x"], "a": null}"#).unwrap();
        assert_eq!(to_json(&v).unwrap(), r#"{"a":null,"b":[1,"x"]}"#);
    }
}
