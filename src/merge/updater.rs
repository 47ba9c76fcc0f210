//! Updater for merge operations.

use super::conflict::{detect_conflicts, Conflicts};
use crate::fieldpath::{APIVersion, ManagedFields, Set, VersionedSet};
use crate::typed::{Comparison, TypedValue, ValidationErrors};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Operation selects how an incoming object is merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// Unconditional write; takes every path it changes.
    Update,
    /// Declaration of intent; fails on conflicts with other managers.
    Apply,
    /// Apply that takes conflicting paths away from their owners.
    ForceApply,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Update => "update",
            Operation::Apply => "apply",
            Operation::ForceApply => "force-apply",
        })
    }
}

/// MergeError is returned when a merge is refused.
#[derive(Debug, Clone, Error)]
pub enum MergeError {
    #[error("apply failed with conflicts:\n{0}")]
    Conflicts(Conflicts),

    #[error("validation error: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Merged is the outcome of a successful merge: the new object and the new
/// ownership table. Both must be stored together.
#[derive(Debug, Clone)]
pub struct Merged {
    pub object: TypedValue,
    pub managers: ManagedFields,
}

/// UpdaterBuilder is a builder for creating an Updater.
#[derive(Debug, Clone, Default)]
pub struct UpdaterBuilder {
    ignored_fields: HashMap<APIVersion, Set>,
}

impl UpdaterBuilder {
    pub fn new() -> Self {
        UpdaterBuilder::default()
    }

    /// Fields that are never owned at `version`. Paths beneath them are
    /// ignored too.
    pub fn ignored_fields(mut self, version: impl Into<APIVersion>, fields: Set) -> Self {
        self.ignored_fields.insert(version.into(), fields);
        self
    }

    pub fn build(self) -> Updater {
        Updater {
            ignored_fields: self.ignored_fields,
        }
    }
}

/// Updater merges objects written by several managers and keeps track of
/// which manager owns which fields.
///
/// It holds configuration only. Every call is a function of its arguments;
/// the live object and managed fields passed in are never modified.
#[derive(Debug, Clone, Default)]
pub struct Updater {
    ignored_fields: HashMap<APIVersion, Set>,
}

impl Updater {
    pub fn builder() -> UpdaterBuilder {
        UpdaterBuilder::new()
    }

    /// Runs `operation` for `manager`.
    pub fn merge(
        &self,
        operation: Operation,
        live: &TypedValue,
        managers: &ManagedFields,
        incoming: &TypedValue,
        manager: &str,
        version: &APIVersion,
    ) -> Result<Merged, MergeError> {
        match operation {
            Operation::Update => self.update(live, managers, incoming, manager, version),
            Operation::Apply => self.apply(live, managers, incoming, manager, version),
            Operation::ForceApply => self.force_apply(live, managers, incoming, manager, version),
        }
    }

    /// Update writes `new_obj` over the live object.
    ///
    /// The manager takes every path whose value it set or changed, and those
    /// paths are removed from every other manager. Paths the manager already
    /// owned stay owned while they exist.
    pub fn update(
        &self,
        live: &TypedValue,
        managers: &ManagedFields,
        new_obj: &TypedValue,
        manager: &str,
        version: &APIVersion,
    ) -> Result<Merged, MergeError> {
        let merged = live.merge(new_obj)?;
        let compare = self.compare(live, &merged, version)?;
        let touched = compare.changed();

        let previous = match managers.get(manager) {
            Some(vs) => vs.set().intersection(&merged.to_field_set()?),
            None => Set::new(),
        };
        let owned = self.exclude_ignored(version, previous.union(&touched));

        let mut next = managers.clone();
        release(&mut next, manager, &touched);
        next.insert_mut(manager, VersionedSet::new(owned, version.clone(), false));

        debug!(
            manager,
            version = %version,
            operation = %Operation::Update,
            touched = touched.len(),
            managers = next.len(),
            "merged"
        );
        Ok(Merged {
            object: merged,
            managers: next,
        })
    }

    /// Apply merges the configuration `config` into the live object.
    ///
    /// The manager's owned set becomes exactly the fields of `config`. Fields
    /// it owned before and no longer declares are removed from the object
    /// unless another manager owns them. If the change touches a field owned
    /// by another manager, nothing is merged and the conflicts are returned.
    pub fn apply(
        &self,
        live: &TypedValue,
        managers: &ManagedFields,
        config: &TypedValue,
        manager: &str,
        version: &APIVersion,
    ) -> Result<Merged, MergeError> {
        self.apply_internal(live, managers, config, manager, version, false)
    }

    /// ForceApply is Apply that takes conflicting fields away from their
    /// owners instead of failing.
    pub fn force_apply(
        &self,
        live: &TypedValue,
        managers: &ManagedFields,
        config: &TypedValue,
        manager: &str,
        version: &APIVersion,
    ) -> Result<Merged, MergeError> {
        self.apply_internal(live, managers, config, manager, version, true)
    }

    fn apply_internal(
        &self,
        live: &TypedValue,
        managers: &ManagedFields,
        config: &TypedValue,
        manager: &str,
        version: &APIVersion,
        force: bool,
    ) -> Result<Merged, MergeError> {
        let operation = if force {
            Operation::ForceApply
        } else {
            Operation::Apply
        };
        let declared = config.to_field_set()?;
        let config_set = self.exclude_ignored(version, declared.clone());

        let mut merged = live.merge(config)?;
        if let Some(previous) = managers.get(manager) {
            // An empty configuration withdraws ownership only. Ignored fields
            // still count as declared here.
            if !declared.is_empty() {
                let dangling = dangling_fields(managers, manager, &previous.set().subtract(&declared));
                if !dangling.is_empty() {
                    debug!(manager, dangling = dangling.len(), "removing fields no longer applied");
                    merged = merged.remove_items(&dangling);
                }
            }
        }

        let compare = self.compare(live, &merged, version)?;
        let changed = compare.changed();
        let conflicts = detect_conflicts(&changed, managers, manager);
        if !conflicts.is_empty() && !force {
            info!(
                manager,
                version = %version,
                conflicts = conflicts.len(),
                "apply rejected"
            );
            return Err(MergeError::Conflicts(conflicts));
        }

        let mut next = managers.clone();
        for (owner, paths) in conflicts.by_manager() {
            let updated = next
                .get(&owner)
                .map(|vs| vs.with_set(vs.set().difference(&paths)));
            if let Some(vs) = updated {
                next.insert_mut(owner, vs);
            }
        }
        next.insert_mut(manager, VersionedSet::new(config_set, version.clone(), true));

        debug!(
            manager,
            version = %version,
            operation = %operation,
            changed = changed.len(),
            removed = compare.removed.len(),
            taken = conflicts.len(),
            managers = next.len(),
            "merged"
        );
        Ok(Merged {
            object: merged,
            managers: next,
        })
    }

    fn compare(
        &self,
        live: &TypedValue,
        merged: &TypedValue,
        version: &APIVersion,
    ) -> Result<Comparison, ValidationErrors> {
        let mut compare = live.compare(merged)?;
        if let Some(ignored) = self.ignored_fields.get(version) {
            compare.exclude_fields(ignored);
        }
        Ok(compare)
    }

    fn exclude_ignored(&self, version: &APIVersion, set: Set) -> Set {
        match self.ignored_fields.get(version) {
            Some(ignored) => set.difference(ignored),
            None => set,
        }
    }
}

/// Removes `paths`, and everything beneath them, from every manager but
/// `acting`. Managers left with nothing are dropped.
fn release(managers: &mut ManagedFields, acting: &str, paths: &Set) {
    if paths.is_empty() {
        return;
    }
    let updated: Vec<(String, VersionedSet)> = managers
        .iter()
        .filter(|(manager, _)| *manager != acting)
        .filter_map(|(manager, vs)| {
            let remaining = vs.set().difference(paths);
            if &remaining == vs.set() {
                None
            } else {
                Some((manager.to_string(), vs.with_set(remaining)))
            }
        })
        .collect();
    for (manager, vs) in updated {
        managers.insert_mut(manager, vs);
    }
}

/// Of the fields `acting` stopped declaring, those nobody else owns, either
/// directly or through a field beneath them.
fn dangling_fields(managers: &ManagedFields, acting: &str, released: &Set) -> Set {
    let mut dangling = Set::new();
    released.iterate(|path| {
        let owned_elsewhere = managers
            .iter()
            .any(|(manager, vs)| manager != acting && vs.set().has_prefix(path));
        if !owned_elsewhere {
            dangling.insert(path);
        }
    });
    dangling
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldpath::path;
    use crate::typed::deduced_parseable_type;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::ForceApply.to_string(), "force-apply");
        let op: Operation = serde_yaml::from_str("force-apply").unwrap();
        assert_eq!(op, Operation::ForceApply);
    }

    #[test]
    fn test_update_simple() {
        let pt = deduced_parseable_type();
        let live = pt.from_yaml("a: '1'").unwrap();
        let new_obj = pt.from_yaml("a: '2'\nb: '3'").unwrap();

        let updater = Updater::builder().build();
        let merged = updater
            .update(&live, &ManagedFields::new(), &new_obj, "manager1", &"v1".into())
            .unwrap();

        let owned = merged.managers.get("manager1").unwrap();
        assert!(owned.set().has(&path(&["a"])));
        assert!(owned.set().has(&path(&["b"])));
        assert!(!owned.applied());
    }

    #[test]
    fn test_apply_simple() {
        let pt = deduced_parseable_type();
        let live = pt.from_yaml("a: '1'").unwrap();
        let config = pt.from_yaml("b: '2'").unwrap();

        let updater = Updater::builder().build();
        let merged = updater
            .apply(&live, &ManagedFields::new(), &config, "manager1", &"v1".into())
            .unwrap();

        let object = merged.object.value().as_map().unwrap();
        assert!(object.contains_key("a"));
        assert!(object.contains_key("b"));
        assert!(merged.managers.get("manager1").unwrap().applied());
    }

    #[test]
    fn test_ignored_fields_are_never_owned() {
        let pt = deduced_parseable_type();
        let config = pt.from_yaml("spec: {a: 1}\nstatus: {phase: up}").unwrap();
        let ignored: Set = [path(&["status"])].into_iter().collect();

        let updater = Updater::builder().ignored_fields("v1", ignored).build();
        let merged = updater
            .apply(&pt.empty(), &ManagedFields::new(), &config, "m", &"v1".into())
            .unwrap();

        let owned = merged.managers.get("m").unwrap().set();
        assert!(owned.has(&path(&["spec", "a"])));
        assert!(!owned.has_prefix(&path(&["status"])));

        let merged = updater
            .apply(&pt.empty(), &ManagedFields::new(), &config, "m", &"v2".into())
            .unwrap();
        assert!(merged.managers.get("m").unwrap().set().has(&path(&["status", "phase"])));
    }

    #[test]
    fn test_ignored_fields_count_as_declared_on_reapply() {
        let pt = deduced_parseable_type();
        let config = pt.from_yaml("spec: {a: 1}\nstatus: {phase: up}").unwrap();
        let ignored: Set = [path(&["status"])].into_iter().collect();
        let updater = Updater::builder().ignored_fields("v1", ignored).build();

        let first = updater
            .apply(&pt.empty(), &ManagedFields::new(), &config, "m", &"v2".into())
            .unwrap();
        assert!(first.managers.get("m").unwrap().set().has(&path(&["status", "phase"])));

        let second = updater
            .apply(&first.object, &first.managers, &config, "m", &"v1".into())
            .unwrap();
        assert_eq!(second.object.value(), config.value());

        let owned = second.managers.get("m").unwrap().set();
        assert!(owned.has(&path(&["spec", "a"])));
        assert!(!owned.has_prefix(&path(&["status"])));
    }

    #[test]
    fn test_merge_dispatches_on_operation() {
        let pt = deduced_parseable_type();
        let live = pt.from_yaml("a: 1").unwrap();
        let updater = Updater::default();
        let version = APIVersion::new("v1");

        let managers = updater
            .update(&pt.empty(), &ManagedFields::new(), &live, "writer", &version)
            .unwrap()
            .managers;

        let config = pt.from_yaml("a: 2").unwrap();
        let err = updater
            .merge(Operation::Apply, &live, &managers, &config, "applier", &version)
            .unwrap_err();
        assert!(matches!(err, MergeError::Conflicts(ref c) if c.len() == 1));

        let forced = updater
            .merge(Operation::ForceApply, &live, &managers, &config, "applier", &version)
            .unwrap();
        assert!(!forced.managers.contains("writer"));
    }
}
