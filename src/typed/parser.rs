//! Parser for creating typed values from YAML schemas and objects.

use super::typed_value::{as_typed, TypedValue};
use super::validation::ValidationErrors;
use crate::schema::{Schema, TypeRef};
use crate::value::Value;
use once_cell::sync::Lazy;
use std::sync::Arc;
use thiserror::Error;

/// Error type for parsing operations.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to parse schema: {0}")]
    Schema(#[source] serde_yaml::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[source] serde_yaml::Error),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("no type found matching: {0}")]
    UnknownType(String),
}

/// Parser holds a schema and hands out typed views of its named types.
#[derive(Debug, Clone)]
pub struct Parser {
    schema: Arc<Schema>,
}

impl Parser {
    /// Creates a new parser from a YAML schema string.
    pub fn new(schema_yaml: &str) -> Result<Parser, ParseError> {
        let schema = Schema::from_yaml(schema_yaml).map_err(ParseError::Schema)?;
        Ok(Parser::from_schema(schema))
    }

    pub fn from_schema(schema: Schema) -> Parser {
        Parser {
            schema: Arc::new(schema),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn type_names(&self) -> Vec<&str> {
        self.schema.type_names().collect()
    }

    /// Returns a ParseableType for the given type name. The name is not
    /// checked; see [`ParseableType::is_valid`].
    pub fn type_by_name(&self, name: &str) -> ParseableType {
        ParseableType {
            schema: Arc::clone(&self.schema),
            type_ref: TypeRef::named(name),
        }
    }

    /// Like [`Parser::type_by_name`], but fails for names the schema lacks.
    pub fn checked_type(&self, name: &str) -> Result<ParseableType, ParseError> {
        let pt = self.type_by_name(name);
        if pt.is_valid() {
            Ok(pt)
        } else {
            Err(ParseError::UnknownType(name.to_string()))
        }
    }
}

/// ParseableType allows for easy production of typed objects.
#[derive(Debug, Clone)]
pub struct ParseableType {
    schema: Arc<Schema>,
    type_ref: TypeRef,
}

impl ParseableType {
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// Returns true if the type is valid in the schema.
    pub fn is_valid(&self) -> bool {
        self.schema.resolve(&self.type_ref).is_some()
    }

    /// Parses a YAML document into a validated TypedValue. Blank input
    /// parses to null.
    pub fn from_yaml(&self, yaml: &str) -> Result<TypedValue, ParseError> {
        let value = if yaml.trim().is_empty() {
            Value::Null
        } else {
            serde_yaml::from_str(yaml).map_err(ParseError::Yaml)?
        };
        self.from_value(value)
    }

    /// Creates a validated TypedValue from a Value.
    pub fn from_value(&self, value: Value) -> Result<TypedValue, ParseError> {
        Ok(as_typed(value, Arc::clone(&self.schema), self.type_ref.clone())?)
    }

    /// A null value of this type.
    pub fn empty(&self) -> TypedValue {
        TypedValue::new(Value::Null, Arc::clone(&self.schema), self.type_ref.clone())
    }
}

const DEDUCED_SCHEMA: &str = r#"types:
- name: __untyped_atomic_
  scalar: untyped
  list:
    elementType:
      namedType: __untyped_atomic_
    elementRelationship: atomic
  map:
    elementType:
      namedType: __untyped_atomic_
    elementRelationship: atomic
- name: __untyped_deduced_
  scalar: untyped
  list:
    elementType:
      namedType: __untyped_atomic_
    elementRelationship: atomic
  map:
    elementType:
      namedType: __untyped_deduced_
    elementRelationship: separable
"#;

static DEDUCED: Lazy<Parser> = Lazy::new(|| match Parser::new(DEDUCED_SCHEMA) {
    Ok(parser) => parser,
    Err(e) => panic!("built-in deduced schema is invalid: {}", e),
});

/// Returns the type used when no schema is known: maps are granular at
/// every level, lists and scalars are leaves.
pub fn deduced_parseable_type() -> ParseableType {
    DEDUCED.type_by_name("__untyped_deduced_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldpath::path;

    const TEST_SCHEMA: &str = r#"types:
- name: stringPair
  map:
    fields:
    - name: key
      type:
        scalar: string
    - name: value
      type:
        scalar: string
"#;

    #[test]
    fn test_parser_new() {
        let parser = Parser::new(TEST_SCHEMA).unwrap();
        assert!(parser.type_names().contains(&"stringPair"));
        assert!(matches!(Parser::new("types: 5"), Err(ParseError::Schema(_))));
    }

    #[test]
    fn test_parseable_type_from_yaml() {
        let parser = Parser::new(TEST_SCHEMA).unwrap();
        let pt = parser.type_by_name("stringPair");

        let tv = pt.from_yaml(r#"{"key": "foo", "value": "bar"}"#).unwrap();
        assert!(tv.value().as_map().is_some());

        assert!(pt.from_yaml("  \n").unwrap().value().is_null());
        assert!(matches!(pt.from_yaml("key: [1]"), Err(ParseError::Validation(_))));
        assert!(matches!(pt.from_yaml("key: [1"), Err(ParseError::Yaml(_))));
    }

    #[test]
    fn test_parseable_type_is_valid() {
        let parser = Parser::new(TEST_SCHEMA).unwrap();
        assert!(parser.type_by_name("stringPair").is_valid());
        assert!(!parser.type_by_name("nonexistent").is_valid());
        assert!(matches!(
            parser.checked_type("nonexistent"),
            Err(ParseError::UnknownType(_))
        ));
    }

    #[test]
    fn test_deduced_parseable_type() {
        let pt = deduced_parseable_type();
        assert!(pt.is_valid());

        let tv = pt
            .from_yaml("a: 1\nb: {c: hello}\nlist: [1, 2]")
            .unwrap();
        let set = tv.to_field_set().unwrap();
        assert!(set.has(&path(&["b", "c"])));
        assert!(set.has(&path(&["list"])));
        assert_eq!(set.len(), 4);
    }
}
