//! Typed module - Operations on Values with specific schemas.
//!
//! This module provides validation, field sets, comparison, merging and
//! removal for object trees interpreted through a schema.

mod comparison;
mod parser;
mod typed_value;
mod validation;

pub use comparison::*;
pub use parser::*;
pub use typed_value::*;
pub use validation::*;
