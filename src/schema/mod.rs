//! Schema module - the type model that typed values are checked against.
//!
//! A schema says, for every node of an object, whether it is a scalar, a map
//! or a list, and how the items of containers relate to each other. That
//! relationship decides the granularity at which fields are owned.

mod elements;

pub use elements::*;
