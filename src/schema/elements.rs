//! Schema elements: named types and the atoms they are built from.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Schema is a list of named types.
///
/// Names are indexed on the first lookup, so a schema should not be modified
/// once it has been used to resolve types.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeDef>,

    #[serde(skip)]
    index: OnceCell<HashMap<String, usize>>,
}

impl Clone for Schema {
    fn clone(&self) -> Self {
        Schema::new(self.types.clone())
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.types == other.types
    }
}

impl Schema {
    pub fn new(types: Vec<TypeDef>) -> Self {
        Schema {
            types,
            index: OnceCell::new(),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Schema, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn find_named_type(&self, name: &str) -> Option<&TypeDef> {
        let index = self.index.get_or_init(|| {
            self.types
                .iter()
                .enumerate()
                .map(|(i, t)| (t.name.clone(), i))
                .collect()
        });
        index.get(name).map(|&i| &self.types[i])
    }

    /// Resolves a type reference to the atom describing it.
    pub fn resolve<'a>(&'a self, type_ref: &'a TypeRef) -> Option<&'a Atom> {
        match &type_ref.named_type {
            Some(name) => self.find_named_type(name).map(|t| &t.atom),
            None => Some(type_ref.inlined.as_ref()),
        }
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.name.as_str())
    }
}

/// TypeDef is a named type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,

    #[serde(flatten)]
    pub atom: Atom,
}

/// TypeRef either names a type of the schema or declares one inline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "namedType")]
    pub named_type: Option<String>,

    #[serde(flatten)]
    pub inlined: Box<Atom>,
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef {
            named_type: Some(name.into()),
            inlined: Box::default(),
        }
    }

    pub fn inline(atom: Atom) -> Self {
        TypeRef {
            named_type: None,
            inlined: Box::new(atom),
        }
    }
}

/// Atom lists the shapes a value of this type may take. An atom with more
/// than one shape is resolved against the kind of the value at hand.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<Scalar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<List>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<Map>,
}

impl Atom {
    pub fn scalar(scalar: Scalar) -> Self {
        Atom {
            scalar: Some(scalar),
            ..Default::default()
        }
    }

    pub fn list(list: List) -> Self {
        Atom {
            list: Some(list),
            ..Default::default()
        }
    }

    pub fn map(map: Map) -> Self {
        Atom {
            map: Some(map),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    Numeric,
    String,
    Boolean,
    Untyped,
}

/// ElementRelationship describes how the items of a container relate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementRelationship {
    /// List items are identified by their key fields (or by value, without keys).
    Associative,
    /// The container is replaced as a whole and owned as a single leaf.
    Atomic,
    /// Items are independent and owned separately.
    Separable,
}

/// Map describes either a struct (declared fields) or a string-keyed map
/// (element type), or both.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Map {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<StructField>,

    #[serde(default, skip_serializing_if = "Option::is_none", rename = "elementType")]
    pub element_type: Option<TypeRef>,

    /// Defaults to separable.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "elementRelationship"
    )]
    pub element_relationship: Option<ElementRelationship>,
}

impl Map {
    pub fn is_atomic(&self) -> bool {
        self.element_relationship == Some(ElementRelationship::Atomic)
    }

    /// Type of the named field, falling back to the element type.
    pub fn field_type(&self, name: &str) -> Option<&TypeRef> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.type_ref)
            .or(self.element_type.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,

    #[serde(rename = "type")]
    pub type_ref: TypeRef,
}

impl StructField {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        StructField {
            name: name.into(),
            type_ref,
        }
    }
}

/// List describes an ordered list. Lists are atomic unless stated otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    #[serde(rename = "elementType")]
    pub element_type: TypeRef,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "elementRelationship"
    )]
    pub element_relationship: Option<ElementRelationship>,

    /// Key fields of an associative list of maps. Empty for a set of scalars.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

impl List {
    pub fn relationship(&self) -> ElementRelationship {
        self.element_relationship
            .unwrap_or(ElementRelationship::Atomic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEAF_SCHEMA: &str = r#"types:
- name: leafFields
  map:
    fields:
    - name: numeric
      type:
        scalar: numeric
    - name: tags
      type:
        list:
          elementType:
            scalar: string
          elementRelationship: associative
    - name: labels
      type:
        namedType: labels
- name: labels
  map:
    elementType:
      scalar: string
"#;

    #[test]
    fn test_parse_schema() {
        let schema = Schema::from_yaml(LEAF_SCHEMA).unwrap();
        assert_eq!(schema.type_names().collect::<Vec<_>>(), vec!["leafFields", "labels"]);

        let root = TypeRef::named("leafFields");
        let atom = schema.resolve(&root).unwrap();
        let map = atom.map.as_ref().unwrap();
        assert!(!map.is_atomic());

        let numeric = schema.resolve(map.field_type("numeric").unwrap()).unwrap();
        assert_eq!(numeric.scalar, Some(Scalar::Numeric));

        let tags = schema.resolve(map.field_type("tags").unwrap()).unwrap();
        let list = tags.list.as_ref().unwrap();
        assert_eq!(list.relationship(), ElementRelationship::Associative);
        assert!(list.keys.is_empty());

        let labels = schema.resolve(map.field_type("labels").unwrap()).unwrap();
        assert!(labels.map.as_ref().unwrap().field_type("anything").is_some());
        assert!(map.field_type("unknown").is_none());
    }

    #[test]
    fn test_unknown_named_type() {
        let schema = Schema::from_yaml(LEAF_SCHEMA).unwrap();
        assert!(schema.resolve(&TypeRef::named("missing")).is_none());
    }

    #[test]
    fn test_clone_keeps_types() {
        let schema = Schema::from_yaml(LEAF_SCHEMA).unwrap();
        assert!(schema.find_named_type("labels").is_some());
        let copy = schema.clone();
        assert_eq!(copy, schema);
        assert!(copy.find_named_type("labels").is_some());
    }

    #[test]
    fn test_list_defaults_to_atomic() {
        let list = List {
            element_type: TypeRef::inline(Atom::scalar(Scalar::String)),
            ..Default::default()
        };
        assert_eq!(list.relationship(), ElementRelationship::Atomic);
    }
}
