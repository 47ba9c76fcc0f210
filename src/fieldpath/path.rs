//! Path element and path types.

use crate::value::{Field, FieldList, Value};
use std::cmp::Ordering;
use std::fmt;

/// PathElement is one step from a node of an object tree into one of its children.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    /// Named field of a map.
    FieldName(String),
    /// Item of an associative list, identified by its key fields.
    Key(FieldList),
    /// Item of a set-like list, identified by its own value.
    Value(Value),
    /// Item of a list without merge keys, identified by position.
    Index(i32),
}

impl PathElement {
    pub fn field_name(name: impl Into<String>) -> Self {
        PathElement::FieldName(name.into())
    }

    /// Builds a key element from `(name, value)` pairs.
    pub fn key<N, V>(fields: impl IntoIterator<Item = (N, V)>) -> Self
    where
        N: Into<String>,
        V: Into<Value>,
    {
        PathElement::Key(fields.into_iter().map(|(n, v)| Field::new(n, v)).collect())
    }

    pub fn value(v: impl Into<Value>) -> Self {
        PathElement::Value(v.into())
    }

    pub fn index(i: i32) -> Self {
        PathElement::Index(i)
    }

    pub fn as_field_name(&self) -> Option<&str> {
        match self {
            PathElement::FieldName(name) => Some(name),
            _ => None,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            PathElement::FieldName(_) => 0,
            PathElement::Key(_) => 1,
            PathElement::Value(_) => 2,
            PathElement::Index(_) => 3,
        }
    }
}

impl Ord for PathElement {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PathElement::FieldName(a), PathElement::FieldName(b)) => a.cmp(b),
            (PathElement::Key(a), PathElement::Key(b)) => a.cmp(b),
            (PathElement::Value(a), PathElement::Value(b)) => a.cmp(b),
            (PathElement::Index(a), PathElement::Index(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for PathElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for PathElement {
    fn from(name: &str) -> Self {
        PathElement::field_name(name)
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::FieldName(name) => write!(f, ".{}", name),
            PathElement::Key(fields) => {
                write!(f, "[")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}={}", field.name, display_value(&field.value))?;
                }
                write!(f, "]")
            }
            PathElement::Value(v) => write!(f, "[={}]", display_value(v)),
            PathElement::Index(i) => write!(f, "[{}]", i),
        }
    }
}

fn display_value(v: &Value) -> String {
    serde_json::to_string(v).unwrap_or_else(|_| format!("{:?}", v))
}

/// Path is the sequence of elements leading from the root to one node.
/// The empty path names the whole object.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    pub fn new() -> Self {
        Path::default()
    }

    pub fn from_elements(elements: Vec<PathElement>) -> Self {
        Path { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathElement> {
        self.elements.iter()
    }

    pub fn as_slice(&self) -> &[PathElement] {
        &self.elements
    }

    pub fn last(&self) -> Option<&PathElement> {
        self.elements.last()
    }

    pub fn push(&mut self, element: PathElement) {
        self.elements.push(element);
    }

    pub fn pop(&mut self) -> Option<PathElement> {
        self.elements.pop()
    }

    /// Returns a copy of this path extended by `element`.
    pub fn with(&self, element: PathElement) -> Self {
        let mut elements = Vec::with_capacity(self.elements.len() + 1);
        elements.extend(self.elements.iter().cloned());
        elements.push(element);
        Path { elements }
    }

    /// Returns true if `self` is `other` or one of its ancestors.
    pub fn is_prefix_of(&self, other: &Path) -> bool {
        other.elements.starts_with(&self.elements)
    }
}

impl FromIterator<PathElement> for Path {
    fn from_iter<T: IntoIterator<Item = PathElement>>(iter: T) -> Self {
        Path {
            elements: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathElement;
    type IntoIter = std::slice::Iter<'a, PathElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements.is_empty() {
            return write!(f, "<root>");
        }
        for element in &self.elements {
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}

/// Builds a path of field names, e.g. `path(&["spec", "replicas"])`.
pub fn path(names: &[&str]) -> Path {
    names.iter().map(|n| PathElement::field_name(*n)).collect()
}
