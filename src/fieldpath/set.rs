//! Field sets: trees of paths used to record ownership.

use super::path::{Path, PathElement};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Set is an unordered set of paths stored as a prefix tree.
///
/// Each level keeps the elements that end a path at that level (`members`) and
/// the subtrees of longer paths (`children`). A path may be both a member and
/// the prefix of other members, which is how a container and its fields are
/// owned together. Empty subtrees are never stored, so structural equality is
/// set equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Set {
    members: BTreeSet<PathElement>,
    children: BTreeMap<PathElement, Set>,
    /// True if the empty path (the whole value) is in the set.
    root: bool,
}

impl Set {
    pub fn new() -> Self {
        Set::default()
    }

    pub fn is_empty(&self) -> bool {
        !self.root && self.members.is_empty() && self.children.is_empty()
    }

    /// Number of paths in the set.
    pub fn len(&self) -> usize {
        usize::from(self.root)
            + self.members.len()
            + self.children.values().map(Set::len).sum::<usize>()
    }

    pub fn insert(&mut self, path: &Path) {
        match path.as_slice() {
            [] => self.root = true,
            elements => self.insert_elements(elements),
        }
    }

    fn insert_elements(&mut self, elements: &[PathElement]) {
        match elements {
            [] => {}
            [last] => {
                self.members.insert(last.clone());
            }
            [first, rest @ ..] => self
                .children
                .entry(first.clone())
                .or_default()
                .insert_elements(rest),
        }
    }

    /// Returns true if exactly `path` is in the set.
    pub fn has(&self, path: &Path) -> bool {
        let Some((last, parents)) = path.as_slice().split_last() else {
            return self.root;
        };
        self.node(parents)
            .is_some_and(|node| node.members.contains(last))
    }

    /// Returns true if `path` or one of its ancestors is in the set.
    pub fn contains(&self, path: &Path) -> bool {
        if self.root {
            return true;
        }
        let mut node = self;
        for element in path.iter() {
            if node.members.contains(element) {
                return true;
            }
            match node.children.get(element) {
                Some(child) => node = child,
                None => return false,
            }
        }
        false
    }

    /// Returns true if `path` or one of its descendants is in the set.
    pub fn has_prefix(&self, path: &Path) -> bool {
        let Some((last, parents)) = path.as_slice().split_last() else {
            return !self.is_empty();
        };
        self.node(parents).is_some_and(|node| {
            node.members.contains(last) || node.children.contains_key(last)
        })
    }

    fn node(&self, elements: &[PathElement]) -> Option<&Set> {
        elements
            .iter()
            .try_fold(self, |node, element| node.children.get(element))
    }

    pub fn union(&self, other: &Set) -> Set {
        let mut result = self.clone();
        result.union_with(other);
        result
    }

    fn union_with(&mut self, other: &Set) {
        self.root |= other.root;
        self.members.extend(other.members.iter().cloned());
        for (element, other_child) in &other.children {
            match self.children.get_mut(element) {
                Some(child) => child.union_with(other_child),
                None => {
                    self.children.insert(element.clone(), other_child.clone());
                }
            }
        }
    }

    /// Paths present in both sets.
    pub fn intersection(&self, other: &Set) -> Set {
        let members = self
            .members
            .intersection(&other.members)
            .cloned()
            .collect();
        let children = self
            .children
            .iter()
            .filter_map(|(element, child)| {
                let common = child.intersection(other.children.get(element)?);
                (!common.is_empty()).then(|| (element.clone(), common))
            })
            .collect();
        Set {
            members,
            children,
            root: self.root && other.root,
        }
    }

    /// Paths of `self` not covered by `other`: a path is dropped if it, or
    /// any of its ancestors, is in `other`.
    pub fn difference(&self, other: &Set) -> Set {
        if other.root {
            return Set::new();
        }
        let members = self
            .members
            .difference(&other.members)
            .cloned()
            .collect();
        let mut children = BTreeMap::new();
        for (element, child) in &self.children {
            if other.members.contains(element) {
                continue;
            }
            let remaining = match other.children.get(element) {
                Some(other_child) => child.difference(other_child),
                None => child.clone(),
            };
            if !remaining.is_empty() {
                children.insert(element.clone(), remaining);
            }
        }
        Set {
            members,
            children,
            root: self.root,
        }
    }

    /// Paths of `self` that are not themselves in `other`. Unlike
    /// [`Set::difference`], membership of an ancestor in `other` does not
    /// remove a path.
    pub fn subtract(&self, other: &Set) -> Set {
        let members = self
            .members
            .difference(&other.members)
            .cloned()
            .collect();
        let mut children = BTreeMap::new();
        for (element, child) in &self.children {
            let remaining = match other.children.get(element) {
                Some(other_child) => child.subtract(other_child),
                None => child.clone(),
            };
            if !remaining.is_empty() {
                children.insert(element.clone(), remaining);
            }
        }
        Set {
            members,
            children,
            root: self.root && !other.root,
        }
    }

    /// Paths that have no descendant in the set.
    pub fn leaves(&self) -> Set {
        let members = self
            .members
            .iter()
            .filter(|m| !self.children.contains_key(*m))
            .cloned()
            .collect();
        let children = self
            .children
            .iter()
            .map(|(element, child)| (element.clone(), child.leaves()))
            .collect();
        Set {
            members,
            children,
            root: self.root && self.members.is_empty() && self.children.is_empty(),
        }
    }

    /// Calls `f` for every path, parents before their descendants.
    pub fn iterate<F>(&self, mut f: F)
    where
        F: FnMut(&Path),
    {
        let mut current = Path::new();
        if self.root {
            f(&current);
        }
        self.walk(&mut current, &mut f);
    }

    fn walk<F>(&self, current: &mut Path, f: &mut F)
    where
        F: FnMut(&Path),
    {
        for member in &self.members {
            current.push(member.clone());
            f(current);
            current.pop();
        }
        for (element, child) in &self.children {
            current.push(element.clone());
            child.walk(current, f);
            current.pop();
        }
    }

    /// All paths in ascending order.
    pub fn paths(&self) -> Vec<Path> {
        let mut paths = Vec::with_capacity(self.len());
        self.iterate(|p| paths.push(p.clone()));
        paths.sort();
        paths
    }
}

impl FromIterator<Path> for Set {
    fn from_iter<T: IntoIterator<Item = Path>>(iter: T) -> Self {
        let mut set = Set::new();
        for path in iter {
            set.insert(&path);
        }
        set
    }
}

impl<'a> FromIterator<&'a Path> for Set {
    fn from_iter<T: IntoIterator<Item = &'a Path>>(iter: T) -> Self {
        let mut set = Set::new();
        for path in iter {
            set.insert(path);
        }
        set
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, path) in self.paths().iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fieldpath::path;
    use proptest::prelude::*;

    fn set_of(paths: &[&[&str]]) -> Set {
        paths.iter().map(|p| path(p)).collect()
    }

    #[test]
    fn test_insert_and_has() {
        let mut set = Set::new();
        assert!(set.is_empty());

        set.insert(&path(&["metadata", "name"]));
        assert!(set.has(&path(&["metadata", "name"])));
        assert!(!set.has(&path(&["metadata"])));
        assert!(!set.has(&Path::new()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_container_and_child_membership() {
        let set = set_of(&[&["spec"], &["spec", "replicas"]]);
        assert!(set.has(&path(&["spec"])));
        assert!(set.has(&path(&["spec", "replicas"])));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_contains_checks_ancestors() {
        let set = set_of(&[&["spec"], &["status", "phase"]]);
        assert!(set.contains(&path(&["spec"])));
        assert!(set.contains(&path(&["spec", "template", "image"])));
        assert!(set.contains(&path(&["status", "phase"])));
        assert!(!set.contains(&path(&["status"])));
        assert!(!set.contains(&path(&["status", "reason"])));

        let mut whole = Set::new();
        whole.insert(&Path::new());
        assert!(whole.contains(&path(&["anything"])));
    }

    #[test]
    fn test_has_prefix() {
        let set = set_of(&[&["spec", "replicas"]]);
        assert!(set.has_prefix(&path(&["spec"])));
        assert!(set.has_prefix(&path(&["spec", "replicas"])));
        assert!(!set.has_prefix(&path(&["spec", "replicas", "x"])));
        assert!(!set.has_prefix(&path(&["status"])));
        assert!(set.has_prefix(&Path::new()));
        assert!(!Set::new().has_prefix(&Path::new()));
    }

    #[test]
    fn test_union_and_intersection() {
        let a = set_of(&[&["a", "x"], &["b"]]);
        let b = set_of(&[&["a", "y"], &["b"]]);

        let union = a.union(&b);
        assert_eq!(union, set_of(&[&["a", "x"], &["a", "y"], &["b"]]));

        let common = a.intersection(&b);
        assert_eq!(common, set_of(&[&["b"]]));
    }

    #[test]
    fn test_difference_covers_descendants() {
        let owned = set_of(&[&["spec"], &["spec", "a"], &["spec", "b"], &["status"]]);
        let touched = set_of(&[&["spec"]]);

        assert_eq!(owned.difference(&touched), set_of(&[&["status"]]));
        assert_eq!(
            owned.subtract(&touched),
            set_of(&[&["spec", "a"], &["spec", "b"], &["status"]])
        );
    }

    #[test]
    fn test_difference_leaves_parent_of_removed_child() {
        let owned = set_of(&[&["spec"], &["spec", "a"]]);
        let touched = set_of(&[&["spec", "a"]]);
        assert_eq!(owned.difference(&touched), set_of(&[&["spec"]]));
    }

    #[test]
    fn test_leaves() {
        let set = set_of(&[&["spec"], &["spec", "a"], &["spec", "b", "c"], &["status"]]);
        assert_eq!(
            set.leaves(),
            set_of(&[&["spec", "a"], &["spec", "b", "c"], &["status"]])
        );
    }

    #[test]
    fn test_paths_are_sorted() {
        let set = set_of(&[&["b"], &["a", "z"], &["a"]]);
        assert_eq!(set.paths(), vec![path(&["a"]), path(&["a", "z"]), path(&["b"])]);
        assert_eq!(set.to_string(), ".a\n.a.z\n.b");
    }

    fn arb_path() -> impl Strategy<Value = Path> {
        prop::collection::vec(
            prop_oneof![
                prop::sample::select(vec!["a", "b", "c"]).prop_map(PathElement::field_name),
                (0..3i32).prop_map(PathElement::index),
            ],
            1..4,
        )
        .prop_map(Path::from_elements)
    }

    fn arb_set() -> impl Strategy<Value = Set> {
        prop::collection::vec(arb_path(), 0..8).prop_map(|paths| paths.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_union_is_commutative(a in arb_set(), b in arb_set()) {
            prop_assert_eq!(a.union(&b), b.union(&a));
        }

        #[test]
        fn prop_union_is_associative(a in arb_set(), b in arb_set(), c in arb_set()) {
            prop_assert_eq!(a.union(&b).union(&c), a.union(&b.union(&c)));
        }

        #[test]
        fn prop_difference_with_self_is_empty(a in arb_set()) {
            prop_assert!(a.difference(&a).is_empty());
            prop_assert!(a.subtract(&a).is_empty());
        }

        #[test]
        fn prop_contains_members_and_descendants(a in arb_set(), suffix in arb_path()) {
            for p in a.paths() {
                prop_assert!(a.contains(&p));
                let mut deeper = p.clone();
                for element in suffix.iter() {
                    deeper.push(element.clone());
                }
                prop_assert!(a.contains(&deeper));
            }
        }

        #[test]
        fn prop_intersection_is_subset(a in arb_set(), b in arb_set()) {
            let common = a.intersection(&b);
            for p in common.paths() {
                prop_assert!(a.has(&p) && b.has(&p));
            }
        }

        #[test]
        fn prop_len_matches_paths(a in arb_set()) {
            prop_assert_eq!(a.len(), a.paths().len());
        }
    }
}
