//! Conflict types and conflict detection.

use crate::fieldpath::{ManagedFields, Path, Set};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Conflict is a field another manager owns that an apply would change.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Error)]
#[error("conflict with \"{manager}\": {path}")]
pub struct Conflict {
    /// The manager that owns the conflicting field.
    pub manager: String,
    /// The path to the conflicting field.
    pub path: Path,
}

impl Conflict {
    pub fn new(manager: impl Into<String>, path: Path) -> Self {
        Conflict {
            manager: manager.into(),
            path,
        }
    }
}

/// Conflicts is every conflict found by one apply, ordered by manager and
/// then by path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conflicts {
    conflicts: Vec<Conflict>,
}

impl Conflicts {
    pub fn new() -> Self {
        Conflicts::default()
    }

    pub fn add(&mut self, conflict: Conflict) {
        self.conflicts.push(conflict);
    }

    pub fn is_empty(&self) -> bool {
        self.conflicts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conflicts.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter()
    }

    /// All conflicting paths, regardless of manager.
    pub fn to_set(&self) -> Set {
        self.conflicts.iter().map(|c| &c.path).collect()
    }

    /// Conflicting paths grouped by the manager that owns them.
    pub fn by_manager(&self) -> BTreeMap<String, Set> {
        let mut grouped: BTreeMap<String, Set> = BTreeMap::new();
        for conflict in &self.conflicts {
            grouped
                .entry(conflict.manager.clone())
                .or_default()
                .insert(&conflict.path);
        }
        grouped
    }
}

impl FromIterator<Conflict> for Conflicts {
    fn from_iter<T: IntoIterator<Item = Conflict>>(iter: T) -> Self {
        let mut conflicts: Vec<Conflict> = iter.into_iter().collect();
        conflicts.sort();
        conflicts.dedup();
        Conflicts { conflicts }
    }
}

impl IntoIterator for Conflicts {
    type Item = Conflict;
    type IntoIter = std::vec::IntoIter<Conflict>;

    fn into_iter(self) -> Self::IntoIter {
        self.conflicts.into_iter()
    }
}

impl fmt::Display for Conflicts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, conflict) in self.conflicts.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", conflict)?;
        }
        Ok(())
    }
}

impl std::error::Error for Conflicts {}

/// Reports, for every manager other than `acting`, the owned paths that
/// appear in `changed` or lie beneath a path that does.
pub fn detect_conflicts(changed: &Set, managers: &ManagedFields, acting: &str) -> Conflicts {
    managers
        .iter()
        .filter(|(manager, _)| *manager != acting)
        .flat_map(|(manager, vs)| {
            let owned = vs.set();
            owned
                .subtract(&owned.difference(changed))
                .paths()
                .into_iter()
                .map(move |path| Conflict::new(manager, path))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldpath::{path, VersionedSet};
    use pretty_assertions::assert_eq;

    fn fields(names: &[&str]) -> Set {
        names.iter().map(|n| path(&[*n])).collect()
    }

    #[test]
    fn test_conflict_display() {
        let conflict = Conflict::new("controller", path(&["string"]));
        assert_eq!(conflict.to_string(), r#"conflict with "controller": .string"#);
    }

    #[test]
    fn test_conflicts_are_sorted() {
        let conflicts: Conflicts = vec![
            Conflict::new("m2", path(&["a"])),
            Conflict::new("m1", path(&["b"])),
            Conflict::new("m1", path(&["a"])),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            conflicts.to_string(),
            "conflict with \"m1\": .a\nconflict with \"m1\": .b\nconflict with \"m2\": .a"
        );
        assert_eq!(conflicts.by_manager()["m1"], fields(&["a", "b"]));
        assert_eq!(conflicts.to_set(), fields(&["a", "b"]));
    }

    #[test]
    fn test_detect_conflicts_skips_acting_manager() {
        let managers = ManagedFields::new()
            .set("applier", VersionedSet::new(fields(&["a", "b"]), "v1", true))
            .set("controller", VersionedSet::new(fields(&["b", "c"]), "v2", false));

        let conflicts = detect_conflicts(&fields(&["a", "b"]), &managers, "applier");
        assert_eq!(
            conflicts.iter().cloned().collect::<Vec<_>>(),
            vec![Conflict::new("controller", path(&["b"]))]
        );

        assert!(detect_conflicts(&Set::new(), &managers, "applier").is_empty());
    }

    #[test]
    fn test_detect_conflicts_beneath_changed_path() {
        let owned: Set = [path(&["a", "b"]), path(&["z"])].into_iter().collect();
        let managers = ManagedFields::new().set("b", VersionedSet::new(owned, "v1", false));

        let conflicts = detect_conflicts(&fields(&["a"]), &managers, "applier");
        assert_eq!(
            conflicts.iter().cloned().collect::<Vec<_>>(),
            vec![Conflict::new("b", path(&["a", "b"]))]
        );
    }

    #[test]
    fn test_conflicts_serde() {
        let conflicts: Conflicts = vec![Conflict::new("m1", path(&["a"]))].into_iter().collect();
        let json = serde_json::to_value(&conflicts).unwrap();
        assert_eq!(json, serde_json::json!([{"manager": "m1", "path": ["f:a"]}]));
    }
}
