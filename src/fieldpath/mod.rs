//! Field path module - Represents and manages field paths in nested structures.
//!
//! This module tracks which manager owns which fields.

mod path;
mod serialize;
mod set;

pub use path::*;
pub use serialize::*;
pub use set::*;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// APIVersion is the schema version a field set was computed against.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct APIVersion(String);

impl APIVersion {
    pub fn new(version: impl Into<String>) -> Self {
        APIVersion(version.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for APIVersion {
    fn from(s: &str) -> Self {
        APIVersion(s.to_string())
    }
}

impl From<String> for APIVersion {
    fn from(s: String) -> Self {
        APIVersion(s)
    }
}

impl fmt::Display for APIVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// VersionedSet is the set of fields one manager owns, as computed at
/// `api_version`. `applied` distinguishes ownership taken by an apply from
/// ownership taken by a plain update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "VersionedSetRepr", from = "VersionedSetRepr")]
pub struct VersionedSet {
    set: Arc<Set>,
    api_version: APIVersion,
    applied: bool,
}

impl VersionedSet {
    pub fn new(set: Set, api_version: impl Into<APIVersion>, applied: bool) -> Self {
        VersionedSet {
            set: Arc::new(set),
            api_version: api_version.into(),
            applied,
        }
    }

    pub fn set(&self) -> &Set {
        &self.set
    }

    pub fn api_version(&self) -> &APIVersion {
        &self.api_version
    }

    pub fn applied(&self) -> bool {
        self.applied
    }

    /// Returns the same entry with its fields replaced.
    pub fn with_set(&self, set: Set) -> VersionedSet {
        VersionedSet {
            set: Arc::new(set),
            api_version: self.api_version.clone(),
            applied: self.applied,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionedSetRepr {
    fields: Set,
    api_version: APIVersion,
    applied: bool,
}

impl From<VersionedSet> for VersionedSetRepr {
    fn from(vs: VersionedSet) -> Self {
        VersionedSetRepr {
            fields: Set::clone(&vs.set),
            api_version: vs.api_version,
            applied: vs.applied,
        }
    }
}

impl From<VersionedSetRepr> for VersionedSet {
    fn from(repr: VersionedSetRepr) -> Self {
        VersionedSet::new(repr.fields, repr.api_version, repr.applied)
    }
}

/// ManagedFields maps each manager to the fields it owns.
///
/// It is a persistent value: [`ManagedFields::set`] and
/// [`ManagedFields::remove`] return new snapshots and leave `self` untouched.
/// Entries with an empty field set are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedFields {
    managers: Arc<BTreeMap<String, VersionedSet>>,
}

impl ManagedFields {
    pub fn new() -> Self {
        ManagedFields::default()
    }

    pub fn len(&self) -> usize {
        self.managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.is_empty()
    }

    pub fn get(&self, manager: &str) -> Option<&VersionedSet> {
        self.managers.get(manager)
    }

    pub fn contains(&self, manager: &str) -> bool {
        self.managers.contains_key(manager)
    }

    /// Managers and their entries, ordered by manager name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &VersionedSet)> {
        self.managers.iter().map(|(m, vs)| (m.as_str(), vs))
    }

    pub fn managers(&self) -> impl Iterator<Item = &str> {
        self.managers.keys().map(String::as_str)
    }

    /// Returns a snapshot where `manager`'s entry is replaced by `vs`, or
    /// removed if `vs` owns nothing.
    pub fn set(&self, manager: impl Into<String>, vs: VersionedSet) -> ManagedFields {
        let mut next = self.clone();
        next.insert_mut(manager, vs);
        next
    }

    /// Returns a snapshot without `manager`'s entry.
    pub fn remove(&self, manager: &str) -> ManagedFields {
        let mut next = self.clone();
        next.remove_mut(manager);
        next
    }

    /// In-place variant of [`ManagedFields::set`]. Other clones of this value
    /// are unaffected.
    pub fn insert_mut(&mut self, manager: impl Into<String>, vs: VersionedSet) {
        let manager = manager.into();
        if vs.set().is_empty() {
            self.remove_mut(&manager);
        } else {
            Arc::make_mut(&mut self.managers).insert(manager, vs);
        }
    }

    /// In-place variant of [`ManagedFields::remove`].
    pub fn remove_mut(&mut self, manager: &str) -> Option<VersionedSet> {
        if !self.managers.contains_key(manager) {
            return None;
        }
        Arc::make_mut(&mut self.managers).remove(manager)
    }

    /// Returns the per-manager symmetric difference between two snapshots.
    ///
    /// A manager whose version differs between the two is reported with its
    /// entry from `other`. Managers whose difference is empty are omitted.
    pub fn difference(&self, other: &ManagedFields) -> ManagedFields {
        let mut diff = ManagedFields::new();
        for (manager, left) in self.iter() {
            match other.get(manager) {
                None => diff.insert_mut(manager, left.clone()),
                Some(right) if left.api_version != right.api_version => {
                    diff.insert_mut(manager, right.clone())
                }
                Some(right) => {
                    let changed = left
                        .set()
                        .subtract(right.set())
                        .union(&right.set().subtract(left.set()));
                    diff.insert_mut(
                        manager,
                        VersionedSet::new(changed, right.api_version.clone(), right.applied),
                    );
                }
            }
        }
        for (manager, right) in other.iter() {
            if !self.contains(manager) {
                diff.insert_mut(manager, right.clone());
            }
        }
        diff
    }
}

impl FromIterator<(String, VersionedSet)> for ManagedFields {
    fn from_iter<T: IntoIterator<Item = (String, VersionedSet)>>(iter: T) -> Self {
        let mut managed = ManagedFields::new();
        for (manager, vs) in iter {
            managed.insert_mut(manager, vs);
        }
        managed
    }
}

impl Serialize for ManagedFields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (*self.managers).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ManagedFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(BTreeMap::<String, VersionedSet>::deserialize(deserializer)?
            .into_iter()
            .collect())
    }
}

impl fmt::Display for ManagedFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (manager, vs) in self.iter() {
            writeln!(f, "{}:", manager)?;
            writeln!(f, "- Applied: {}", vs.applied)?;
            writeln!(f, "- APIVersion: {}", vs.api_version)?;
            for p in vs.set().paths() {
                writeln!(f, "  {}", p)?;
            }
        }
        Ok(())
    }
}
