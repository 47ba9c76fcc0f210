//! TypedValue implementation.

use super::comparison::Comparison;
use super::validation::{ValidationError, ValidationErrors};
use crate::fieldpath::{Path, PathElement, Set};
use crate::schema::{Atom, ElementRelationship, List, Map as MapType, Scalar, Schema, TypeRef};
use crate::value::{Field, FieldList, Map, Value};
use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Type given to map fields the schema does not declare. It resolves to an
/// atom with no shape, so such fields are owned as a whole.
static UNTYPED: Lazy<TypeRef> = Lazy::new(TypeRef::default);

/// TypedValue is a Value paired with its schema and type.
#[derive(Debug, Clone)]
pub struct TypedValue {
    value: Value,
    type_ref: TypeRef,
    schema: Arc<Schema>,
}

/// How a node is owned: as a single leaf, or through its children.
#[derive(Clone, Copy)]
enum Shape<'a> {
    Leaf,
    Map(&'a MapType),
    List(&'a List),
}

type Child<'a> = (PathElement, &'a Value, &'a TypeRef);

/// Creates a new TypedValue after validating it conforms to the schema.
pub fn as_typed(
    value: Value,
    schema: Arc<Schema>,
    type_ref: TypeRef,
) -> Result<TypedValue, ValidationErrors> {
    let tv = TypedValue::new(value, schema, type_ref);
    tv.validate()?;
    Ok(tv)
}

/// Creates a new TypedValue without validation.
/// Use this only when validation has already been done.
pub fn as_typed_unvalidated(value: Value, schema: Arc<Schema>, type_ref: TypeRef) -> TypedValue {
    TypedValue::new(value, schema, type_ref)
}

impl TypedValue {
    pub fn new(value: Value, schema: Arc<Schema>, type_ref: TypeRef) -> Self {
        TypedValue {
            value,
            type_ref,
            schema,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Creates an empty TypedValue with the same schema and type.
    pub fn empty(&self) -> TypedValue {
        self.with_value(Value::Null)
    }

    /// Returns a TypedValue of the same type holding `value`.
    pub fn with_value(&self, value: Value) -> TypedValue {
        TypedValue {
            value,
            type_ref: self.type_ref.clone(),
            schema: Arc::clone(&self.schema),
        }
    }

    /// Validates the value against the schema.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        self.validate_value(&self.value, &self.type_ref, &Path::new(), &mut errors);
        errors.into_result()
    }

    fn validate_value(
        &self,
        value: &Value,
        type_ref: &TypeRef,
        path: &Path,
        errors: &mut ValidationErrors,
    ) {
        let atom = match self.schema.resolve(type_ref) {
            Some(atom) => atom,
            None => {
                let name = type_ref.named_type.as_deref().unwrap_or_default();
                errors.push(ValidationError::schema(format!(
                    "no type found matching: {}",
                    name
                )));
                return;
            }
        };

        match value {
            Value::Null => {}
            Value::Map(fields) => match &atom.map {
                Some(map) => self.validate_map(fields, map, path, errors),
                None => errors.push(ValidationError::type_mismatch(
                    path,
                    expected_shapes(atom),
                    value.kind(),
                )),
            },
            Value::List(items) => match &atom.list {
                Some(list) => self.validate_list(items, list, path, errors),
                None => errors.push(ValidationError::type_mismatch(
                    path,
                    expected_shapes(atom),
                    value.kind(),
                )),
            },
            _ => match atom.scalar {
                Some(scalar) => validate_scalar(value, scalar, path, errors),
                None => errors.push(ValidationError::type_mismatch(
                    path,
                    expected_shapes(atom),
                    value.kind(),
                )),
            },
        }
    }

    fn validate_map(
        &self,
        fields: &Map,
        map: &MapType,
        path: &Path,
        errors: &mut ValidationErrors,
    ) {
        for (name, value) in fields {
            match map.field_type(name) {
                Some(field_type) => self.validate_value(
                    value,
                    field_type,
                    &path.with(PathElement::field_name(name.as_str())),
                    errors,
                ),
                None => errors.push(ValidationError::unknown_field(path, name.as_str())),
            }
        }
    }

    fn validate_list(
        &self,
        items: &[Value],
        list: &List,
        path: &Path,
        errors: &mut ValidationErrors,
    ) {
        let mut seen = BTreeSet::new();
        for (i, item) in items.iter().enumerate() {
            let element = match list_item_element(item, list, i, path) {
                Ok(element) => element,
                Err(e) => {
                    errors.push(e);
                    PathElement::index(i as i32)
                }
            };
            if !seen.insert(element.clone()) {
                errors.push(ValidationError::duplicate(path, &element));
                continue;
            }
            self.validate_value(item, &list.element_type, &path.with(element), errors);
        }
    }

    /// Returns every path of the value the schema makes ownable: each
    /// granular container and each leaf. The root itself is not included.
    pub fn to_field_set(&self) -> Result<Set, ValidationErrors> {
        let mut set = Set::new();
        let mut errors = ValidationErrors::new();
        self.collect_field_set(&self.value, &self.type_ref, &Path::new(), &mut set, &mut errors);
        errors.into_result()?;
        Ok(set)
    }

    fn collect_field_set(
        &self,
        value: &Value,
        type_ref: &TypeRef,
        path: &Path,
        set: &mut Set,
        errors: &mut ValidationErrors,
    ) {
        if !path.is_empty() {
            set.insert(path);
        }
        let shape = self.shape_of(type_ref, value);
        for (element, child, child_type) in self.children(value, &shape, path, errors) {
            self.collect_field_set(child, child_type, &path.with(element), set, errors);
        }
    }

    /// Compares this TypedValue with another.
    ///
    /// Modified paths are leaves. An added subtree is reported with all of
    /// its paths, a removed one only at its top. A root that changes from
    /// one leaf value to another is reported as the root path. A container
    /// replaced by a value of another shape is modified, and its old
    /// children are removed while the new ones are added.
    pub fn compare(&self, rhs: &TypedValue) -> Result<Comparison, ValidationErrors> {
        if self.type_ref != rhs.type_ref {
            return Err(ValidationError::schema("expected objects of the same type").into());
        }

        let mut comparison = Comparison::new();
        let mut errors = ValidationErrors::new();
        self.compare_values(
            &self.value,
            &rhs.value,
            &self.type_ref,
            &Path::new(),
            &mut comparison,
            &mut errors,
        );
        errors.into_result()?;
        Ok(comparison)
    }

    fn compare_values(
        &self,
        lhs: &Value,
        rhs: &Value,
        type_ref: &TypeRef,
        path: &Path,
        comparison: &mut Comparison,
        errors: &mut ValidationErrors,
    ) {
        let mut lhs_shape = self.shape_of(type_ref, lhs);
        let mut rhs_shape = self.shape_of(type_ref, rhs);
        // A null side is an empty container of the other side's shape.
        if lhs.is_null() {
            lhs_shape = rhs_shape;
        } else if rhs.is_null() {
            rhs_shape = lhs_shape;
        }

        match (&lhs_shape, &rhs_shape) {
            (Shape::Map(_), Shape::Map(_)) | (Shape::List(_), Shape::List(_)) => {}
            _ => {
                if lhs != rhs {
                    comparison.modified.insert(path);
                    // A container replaced by another shape loses its
                    // children and gains the new side's.
                    for (element, _, _) in self.children(lhs, &lhs_shape, path, errors) {
                        comparison.removed.insert(&path.with(element));
                    }
                    for (element, child, child_type) in self.children(rhs, &rhs_shape, path, errors) {
                        self.collect_field_set(
                            child,
                            child_type,
                            &path.with(element),
                            &mut comparison.added,
                            errors,
                        );
                    }
                }
                return;
            }
        }

        let lhs_children: BTreeMap<_, _> = self
            .children(lhs, &lhs_shape, path, errors)
            .into_iter()
            .map(|(element, value, _)| (element, value))
            .collect();
        let rhs_children = self.children(rhs, &rhs_shape, path, errors);

        let mut present = BTreeSet::new();
        for (element, rhs_child, child_type) in rhs_children {
            let child_path = path.with(element.clone());
            match lhs_children.get(&element) {
                Some(lhs_child) => self.compare_values(
                    lhs_child,
                    rhs_child,
                    child_type,
                    &child_path,
                    comparison,
                    errors,
                ),
                None => self.collect_field_set(
                    rhs_child,
                    child_type,
                    &child_path,
                    &mut comparison.added,
                    errors,
                ),
            }
            present.insert(element);
        }
        for element in lhs_children.keys() {
            if !present.contains(element) {
                comparison.removed.insert(&path.with(element.clone()));
            }
        }
    }

    /// Returns a copy of the value without the given paths and everything
    /// beneath them. If the set holds the root path, the result is null.
    pub fn remove_items(&self, items: &Set) -> TypedValue {
        let root = Path::new();
        if items.has(&root) {
            return self.empty();
        }
        let value = self.remove_items_from_value(&self.value, &self.type_ref, &root, items);
        self.with_value(value)
    }

    fn remove_items_from_value(
        &self,
        value: &Value,
        type_ref: &TypeRef,
        path: &Path,
        items: &Set,
    ) -> Value {
        if !items.has_prefix(path) {
            return value.clone();
        }

        let shape = self.shape_of(type_ref, value);
        let mut scratch = ValidationErrors::new();
        let kept = self
            .children(value, &shape, path, &mut scratch)
            .into_iter()
            .filter_map(|(element, child, child_type)| {
                let child_path = path.with(element.clone());
                if items.has(&child_path) {
                    None
                } else {
                    let child = self.remove_items_from_value(child, child_type, &child_path, items);
                    Some((element, child))
                }
            });

        match (shape, value) {
            (Shape::Map(_), Value::Map(_)) => Value::Map(
                kept.filter_map(|(element, child)| match element {
                    PathElement::FieldName(name) => Some((name, child)),
                    _ => None,
                })
                .collect(),
            ),
            (Shape::List(_), Value::List(_)) => {
                Value::List(kept.map(|(_, child)| child).collect())
            }
            _ => value.clone(),
        }
    }

    /// Merges another TypedValue into this one.
    ///
    /// Where both sides hold a value, the right one wins. Granular maps are
    /// merged field by field, associative lists item by item (new items are
    /// appended), separable lists position by position. Atomic containers
    /// and scalars are replaced. A null on the right keeps the left value.
    pub fn merge(&self, rhs: &TypedValue) -> Result<TypedValue, ValidationErrors> {
        if self.type_ref != rhs.type_ref {
            return Err(ValidationError::schema("expected objects of the same type").into());
        }
        let value = self.merge_values(&self.value, &rhs.value, &self.type_ref);
        Ok(self.with_value(value))
    }

    fn merge_values(&self, lhs: &Value, rhs: &Value, type_ref: &TypeRef) -> Value {
        if rhs.is_null() {
            return lhs.clone();
        }

        match (self.shape_of(type_ref, rhs), lhs, rhs) {
            (Shape::Map(map), Value::Map(lhs_fields), Value::Map(rhs_fields)) => {
                self.merge_maps(lhs_fields, rhs_fields, map)
            }
            (Shape::List(list), Value::List(lhs_items), Value::List(rhs_items)) => {
                self.merge_lists(lhs_items, rhs_items, list)
            }
            _ => rhs.clone(),
        }
    }

    fn merge_maps(&self, lhs: &Map, rhs: &Map, map: &MapType) -> Value {
        let mut result = lhs.clone();
        for (name, rhs_value) in rhs {
            let field_type = map.field_type(name).unwrap_or(&UNTYPED);
            let merged = match lhs.get(name) {
                Some(lhs_value) => self.merge_values(lhs_value, rhs_value, field_type),
                None => rhs_value.clone(),
            };
            result.insert(name.clone(), merged);
        }
        Value::Map(result)
    }

    fn merge_lists(&self, lhs: &[Value], rhs: &[Value], list: &List) -> Value {
        let element_type = &list.element_type;
        match list.relationship() {
            ElementRelationship::Associative => {
                let root = Path::new();
                let mut result = lhs.to_vec();
                let mut positions = BTreeMap::new();
                for (i, item) in lhs.iter().enumerate() {
                    if let Ok(element) = list_item_element(item, list, i, &root) {
                        positions.entry(element).or_insert(i);
                    }
                }
                for (i, item) in rhs.iter().enumerate() {
                    match list_item_element(item, list, i, &root) {
                        Ok(element) => match positions.get(&element) {
                            Some(&at) => {
                                let merged = self.merge_values(&result[at], item, element_type);
                                result[at] = merged;
                            }
                            None => {
                                positions.insert(element, result.len());
                                result.push(item.clone());
                            }
                        },
                        Err(_) => result.push(item.clone()),
                    }
                }
                Value::List(result)
            }
            ElementRelationship::Separable => {
                let len = lhs.len().max(rhs.len());
                let result = (0..len)
                    .filter_map(|i| match (lhs.get(i), rhs.get(i)) {
                        (Some(l), Some(r)) => Some(self.merge_values(l, r, element_type)),
                        (Some(l), None) => Some(l.clone()),
                        (None, Some(r)) => Some(r.clone()),
                        (None, None) => None,
                    })
                    .collect();
                Value::List(result)
            }
            ElementRelationship::Atomic => Value::List(rhs.to_vec()),
        }
    }

    /// Decides how `value` is owned under `type_ref`. An atom that allows
    /// several shapes is resolved by the kind of the value.
    fn shape_of<'a>(&'a self, type_ref: &'a TypeRef, value: &Value) -> Shape<'a> {
        let atom = match self.schema.resolve(type_ref) {
            Some(atom) => atom,
            None => return Shape::Leaf,
        };
        let map = atom.map.as_ref().filter(|m| !m.is_atomic());
        let list = atom
            .list
            .as_ref()
            .filter(|l| l.relationship() != ElementRelationship::Atomic);

        match value {
            Value::Map(_) => map.map(Shape::Map).unwrap_or(Shape::Leaf),
            Value::List(_) => list.map(Shape::List).unwrap_or(Shape::Leaf),
            Value::Null if atom.scalar.is_none() => map
                .map(Shape::Map)
                .or_else(|| list.map(Shape::List))
                .unwrap_or(Shape::Leaf),
            _ => Shape::Leaf,
        }
    }

    /// Lists the children of a granular container with their path elements.
    /// List items whose element cannot be computed fall back to their index.
    fn children<'a>(
        &'a self,
        value: &'a Value,
        shape: &Shape<'a>,
        path: &Path,
        errors: &mut ValidationErrors,
    ) -> Vec<Child<'a>> {
        match (*shape, value) {
            (Shape::Map(map), Value::Map(fields)) => fields
                .iter()
                .map(|(name, child)| {
                    let child_type = map.field_type(name).unwrap_or(&UNTYPED);
                    (PathElement::field_name(name.as_str()), child, child_type)
                })
                .collect(),
            (Shape::List(list), Value::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let element = list_item_element(item, list, i, path).unwrap_or_else(|e| {
                        errors.push(e);
                        PathElement::index(i as i32)
                    });
                    (element, item, &list.element_type)
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Computes the path element identifying one item of a list.
fn list_item_element(
    item: &Value,
    list: &List,
    index: usize,
    path: &Path,
) -> Result<PathElement, ValidationError> {
    if list.relationship() != ElementRelationship::Associative {
        return Ok(PathElement::index(index as i32));
    }
    if list.keys.is_empty() {
        return Ok(PathElement::Value(item.clone()));
    }

    let map = item
        .as_map()
        .ok_or_else(|| ValidationError::type_mismatch(path, "map", item.kind()))?;
    let mut fields = Vec::with_capacity(list.keys.len());
    for key in &list.keys {
        match map.get(key) {
            Some(v) => fields.push(Field::new(key.as_str(), v.clone())),
            None => return Err(ValidationError::missing_key(path, key.as_str())),
        }
    }
    Ok(PathElement::Key(FieldList::new(fields)))
}

fn validate_scalar(value: &Value, scalar: Scalar, path: &Path, errors: &mut ValidationErrors) {
    let valid = match scalar {
        Scalar::Numeric => matches!(value, Value::Int(_) | Value::Float(_)),
        Scalar::String => matches!(value, Value::String(_)),
        Scalar::Boolean => matches!(value, Value::Bool(_)),
        Scalar::Untyped => !matches!(value, Value::Map(_) | Value::List(_)),
    };
    if !valid {
        let expected = match scalar {
            Scalar::Numeric => "numeric",
            Scalar::String => "string",
            Scalar::Boolean => "boolean",
            Scalar::Untyped => "scalar",
        };
        errors.push(ValidationError::type_mismatch(path, expected, value.kind()));
        return;
    }
    // NaN and infinities cannot be persisted in field paths.
    if let Value::Float(f) = value {
        if !f.is_finite() {
            errors.push(ValidationError::non_finite(path, *f));
        }
    }
}

fn expected_shapes(atom: &Atom) -> String {
    let mut shapes = Vec::new();
    if atom.map.is_some() {
        shapes.push("map");
    }
    if atom.list.is_some() {
        shapes.push("list");
    }
    if atom.scalar.is_some() {
        shapes.push("scalar");
    }
    if shapes.is_empty() {
        return "nothing".to_string();
    }
    shapes.join(" or ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldpath::path;
    use crate::value::from_yaml;
    use pretty_assertions::assert_eq;

    const SCHEMA: &str = r#"types:
- name: deployment
  map:
    fields:
    - name: name
      type:
        scalar: string
    - name: replicas
      type:
        scalar: numeric
    - name: labels
      type:
        map:
          elementType:
            scalar: string
    - name: selector
      type:
        map:
          elementType:
            scalar: string
          elementRelationship: atomic
    - name: tags
      type:
        list:
          elementType:
            scalar: string
          elementRelationship: associative
    - name: args
      type:
        list:
          elementType:
            scalar: string
    - name: steps
      type:
        list:
          elementType:
            scalar: string
          elementRelationship: separable
    - name: ports
      type:
        list:
          elementType:
            namedType: port
          elementRelationship: associative
          keys:
          - name
- name: port
  map:
    fields:
    - name: name
      type:
        scalar: string
    - name: port
      type:
        scalar: numeric
"#;

    fn typed(yaml: &str) -> TypedValue {
        let schema = Arc::new(Schema::from_yaml(SCHEMA).unwrap());
        TypedValue::new(from_yaml(yaml).unwrap(), schema, TypeRef::named("deployment"))
    }

    fn port(name: &str) -> PathElement {
        PathElement::key([("name", name)])
    }

    #[test]
    fn test_to_field_set_includes_containers() {
        let tv = typed(
            r#"
name: web
labels:
  app: web
selector:
  app: web
tags: [blue]
ports:
- name: http
  port: 80
"#,
        );
        let set = tv.to_field_set().unwrap();

        let expected: Set = [
            path(&["name"]),
            path(&["labels"]),
            path(&["labels", "app"]),
            path(&["selector"]),
            path(&["tags"]),
            path(&["tags"]).with(PathElement::value("blue")),
            path(&["ports"]),
            path(&["ports"]).with(port("http")),
            path(&["ports"]).with(port("http")).with("name".into()),
            path(&["ports"]).with(port("http")).with("port".into()),
        ]
        .into_iter()
        .collect();
        assert_eq!(set, expected);
        assert!(!set.has(&Path::new()));
    }

    #[test]
    fn test_atomic_list_is_a_leaf() {
        let tv = typed("args: [a, b]\nsteps: [x, y]");
        let set = tv.to_field_set().unwrap();
        assert!(set.has(&path(&["args"])));
        assert!(!set.has_prefix(&path(&["args"]).with(PathElement::index(0))));
        assert!(set.has(&path(&["steps"]).with(PathElement::index(1))));
    }

    #[test]
    fn test_compare() {
        let lhs = typed("name: web\nreplicas: 1\nlabels: {app: web}");
        let rhs = typed("name: web\nreplicas: 3\nports: [{name: http, port: 80}]");
        let c = lhs.compare(&rhs).unwrap();

        assert_eq!(c.modified.paths(), vec![path(&["replicas"])]);
        assert_eq!(c.removed.paths(), vec![path(&["labels"])]);
        assert!(c.added.has(&path(&["ports"])));
        assert!(c.added.has(&path(&["ports"]).with(port("http"))));
        assert!(c.added.has(&path(&["ports"]).with(port("http")).with("port".into())));
    }

    #[test]
    fn test_compare_same() {
        let lhs = typed("name: web\ntags: [a, b]");
        let rhs = typed("name: web\ntags: [b, a]");
        assert!(lhs.compare(&rhs).unwrap().is_same());
    }

    #[test]
    fn test_compare_atomic_map_modified_as_whole() {
        let lhs = typed("selector: {app: web}");
        let rhs = typed("selector: {app: api}");
        let c = lhs.compare(&rhs).unwrap();
        assert_eq!(c.modified.paths(), vec![path(&["selector"])]);
    }

    #[test]
    fn test_compare_container_replaced_by_scalar() {
        let pt = crate::typed::deduced_parseable_type();
        let map = pt.from_yaml("a: {b: 1, c: 2}").unwrap();
        let scalar = pt.from_yaml("a: 5").unwrap();

        let c = map.compare(&scalar).unwrap();
        assert_eq!(c.modified.paths(), vec![path(&["a"])]);
        assert_eq!(c.removed.paths(), vec![path(&["a", "b"]), path(&["a", "c"])]);
        assert!(c.added.is_empty());

        let c = scalar.compare(&map).unwrap();
        assert_eq!(c.modified.paths(), vec![path(&["a"])]);
        assert_eq!(c.added.paths(), vec![path(&["a", "b"]), path(&["a", "c"])]);
        assert!(c.removed.is_empty());
    }

    #[test]
    fn test_compare_type_mismatch() {
        let schema = Arc::new(Schema::from_yaml(SCHEMA).unwrap());
        let lhs = typed("name: web");
        let rhs = TypedValue::new(from_yaml("name: 1").unwrap(), schema, TypeRef::named("port"));
        assert!(lhs.compare(&rhs).is_err());
    }

    #[test]
    fn test_merge() {
        let lhs = typed(
            r#"
name: web
labels: {app: web}
selector: {app: web, tier: front}
tags: [a]
ports: [{name: http, port: 80}]
"#,
        );
        let rhs = typed(
            r#"
labels: {env: prod}
selector: {app: api}
tags: [b, a]
ports: [{name: http, port: 8080}, {name: grpc, port: 9090}]
"#,
        );
        let merged = lhs.merge(&rhs).unwrap();
        let expected = from_yaml(
            r#"
name: web
labels: {app: web, env: prod}
selector: {app: api}
tags: [a, b]
ports: [{name: http, port: 8080}, {name: grpc, port: 9090}]
"#,
        )
        .unwrap();
        assert_eq!(merged.value(), &expected);
    }

    #[test]
    fn test_merge_null_rhs_keeps_lhs() {
        let lhs = typed("name: web");
        let merged = lhs.merge(&lhs.empty()).unwrap();
        assert_eq!(merged.value(), lhs.value());
    }

    #[test]
    fn test_merge_separable_list_by_position() {
        let lhs = typed("steps: [a, b, c]");
        let rhs = typed("steps: [x]");
        let merged = lhs.merge(&rhs).unwrap();
        assert_eq!(merged.value(), &from_yaml("steps: [x, b, c]").unwrap());
    }

    #[test]
    fn test_remove_items() {
        let tv = typed(
            r#"
name: web
labels: {app: web, env: prod}
tags: [a, b]
ports: [{name: http, port: 80}, {name: grpc, port: 9090}]
"#,
        );
        let items: Set = [
            path(&["name"]),
            path(&["labels", "env"]),
            path(&["tags"]).with(PathElement::value("a")),
            path(&["ports"]).with(port("grpc")),
        ]
        .into_iter()
        .collect();
        let removed = tv.remove_items(&items);
        let expected = from_yaml(
            r#"
labels: {app: web}
tags: [b]
ports: [{name: http, port: 80}]
"#,
        )
        .unwrap();
        assert_eq!(removed.value(), &expected);
    }

    #[test]
    fn test_remove_root() {
        let tv = typed("name: web");
        let items: Set = [Path::new()].into_iter().collect();
        assert!(tv.remove_items(&items).value().is_null());
    }

    #[test]
    fn test_validate() {
        assert!(typed("name: web\nreplicas: 2").validate().is_ok());

        let errors = typed("name: 1\nbogus: x").validate().unwrap_err();
        assert_eq!(errors.len(), 2);

        let errors = typed("ports: [{port: 80}]").validate().unwrap_err();
        assert_eq!(
            errors.to_string(),
            ".ports: associative list item is missing key name"
        );

        let errors = typed("tags: [a, a]").validate().unwrap_err();
        assert_eq!(errors.to_string(), r#".tags: duplicate entry [="a"]"#);

        let errors = typed("replicas: .nan").validate().unwrap_err();
        assert_eq!(errors.to_string(), ".replicas: non-finite number NaN");
        assert!(typed("replicas: 1.5").validate().is_ok());
    }

    #[test]
    fn test_validate_unknown_type() {
        let schema = Arc::new(Schema::from_yaml(SCHEMA).unwrap());
        let errors = as_typed(Value::from("x"), schema, TypeRef::named("missing")).unwrap_err();
        assert_eq!(errors.to_string(), "no type found matching: missing");
    }
}
