//! # Managed Merge
//!
//! Structured merges of YAML/JSON objects written by several managers, with
//! per-field ownership tracking and conflict detection.
//!
//! Every merge takes the live object, the table of which manager owns which
//! fields, and an incoming object from one manager. It returns a new object
//! and a new ownership table, or the conflicts that stopped an apply. Inputs
//! are never modified.
//!
//! ## Modules
//!
//! - [`value`] - In-memory representation of YAML/JSON objects
//! - [`fieldpath`] - Field paths, field sets and the per-manager ownership table
//! - [`schema`] - Type schema deciding how finely fields are owned
//! - [`typed`] - Operations on Values with specific schemas (validation, comparison, merging)
//! - [`merge`] - Update, apply and force-apply across managers
//! - [`scenario`] - Replays of operation sequences with expected outcomes

pub mod fieldpath;
pub mod merge;
pub mod scenario;
pub mod schema;
pub mod typed;
pub mod value;

pub use fieldpath::{
    APIVersion, ManagedFields, Path, PathElement, Set as FieldPathSet, VersionedSet,
};
pub use merge::{
    Conflict, Conflicts, MergeError, Merged, Operation, Updater, UpdaterBuilder,
};
pub use schema::Schema;
pub use typed::{Comparison, ParseableType, TypedValue};
pub use value::Value;
