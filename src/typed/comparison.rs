//! Comparison result types.

use crate::fieldpath::Set;
use std::fmt;

/// Comparison is the structural difference between two typed values.
///
/// No path appears in more than one of the three sets. If all three are
/// empty, the values were equal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Paths present on the left only, reported at the top of each removed subtree.
    pub removed: Set,
    /// Leaves present on both sides with different values.
    pub modified: Set,
    /// Paths present on the right only, including every path beneath them.
    pub added: Set,
}

impl Comparison {
    pub fn new() -> Self {
        Comparison::default()
    }

    pub fn is_same(&self) -> bool {
        self.removed.is_empty() && self.modified.is_empty() && self.added.is_empty()
    }

    /// Paths whose value was set or changed on the right.
    pub fn changed(&self) -> Set {
        self.modified.union(&self.added)
    }

    /// Drops `fields`, and everything beneath them, from all three sets.
    pub fn exclude_fields(&mut self, fields: &Set) {
        self.removed = self.removed.difference(fields);
        self.modified = self.modified.difference(fields);
        self.added = self.added.difference(fields);
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            ("Modified", &self.modified),
            ("Added", &self.added),
            ("Removed", &self.removed),
        ];
        let mut first = true;
        for (title, set) in sections {
            if set.is_empty() {
                continue;
            }
            if !first {
                writeln!(f)?;
            }
            first = false;
            write!(f, "- {} Fields:", title)?;
            for p in set.paths() {
                write!(f, "\n  {}", p)?;
            }
        }
        Ok(())
    }
}
