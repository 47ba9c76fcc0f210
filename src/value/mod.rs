//! Value module - In-memory representation of YAML/JSON objects.

mod value;

pub use value::*;
