//! Scenario module - replays a sequence of merge operations.
//!
//! A scenario is a YAML document listing operations by several managers
//! against one object, with the conflicts each apply is expected to report
//! and, optionally, the object and managed fields expected at the end:
//!
//! ```yaml
//! ops:
//! - op: apply
//!   manager: default
//!   apiVersion: v1
//!   object: |
//!     numeric: 1
//! - op: update
//!   manager: controller
//!   apiVersion: v1
//!   object: |
//!     numeric: 2
//! - op: apply
//!   manager: default
//!   apiVersion: v1
//!   object: |
//!     numeric: 3
//!   conflicts:
//!   - manager: controller
//!     path: ["f:numeric"]
//! expectedObject: |
//!   numeric: 2
//! ```

use crate::fieldpath::{APIVersion, ManagedFields};
use crate::merge::{Conflict, Conflicts, MergeError, Merged, Operation, Updater};
use crate::typed::{ParseError, ParseableType, TypedValue};
use crate::value::to_yaml;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// ScenarioError reports the first step of a scenario that did not go as
/// expected.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("failed to parse scenario: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("initial object: {0}")]
    Object(#[source] ParseError),

    #[error("op {index}: {source}")]
    Parse {
        index: usize,
        #[source]
        source: ParseError,
    },

    #[error("op {index}: {source}")]
    Merge {
        index: usize,
        #[source]
        source: MergeError,
    },

    #[error("op {index}: expected conflicts:\n{expected}\nbut got:\n{actual}")]
    UnexpectedConflicts {
        index: usize,
        expected: Conflicts,
        actual: Conflicts,
    },

    #[error("op {index}: expected conflicts but the apply succeeded:\n{expected}")]
    MissingConflicts { index: usize, expected: Conflicts },

    #[error("final object differs:\nexpected:\n{expected}\nactual:\n{actual}")]
    ObjectMismatch { expected: String, actual: String },

    #[error("final managed fields differ:\nexpected:\n{expected}\nactual:\n{actual}")]
    ManagedMismatch { expected: String, actual: String },
}

/// Step is one operation of a scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Step {
    Apply {
        manager: String,
        #[serde(rename = "apiVersion")]
        api_version: APIVersion,
        object: String,
        /// Set when the apply must fail with exactly these conflicts.
        #[serde(default)]
        conflicts: Option<Vec<Conflict>>,
    },
    ForceApply {
        manager: String,
        #[serde(rename = "apiVersion")]
        api_version: APIVersion,
        object: String,
    },
    Update {
        manager: String,
        #[serde(rename = "apiVersion")]
        api_version: APIVersion,
        object: String,
    },
}

impl Step {
    pub fn operation(&self) -> Operation {
        match self {
            Step::Apply { .. } => Operation::Apply,
            Step::ForceApply { .. } => Operation::ForceApply,
            Step::Update { .. } => Operation::Update,
        }
    }

    pub fn manager(&self) -> &str {
        match self {
            Step::Apply { manager, .. }
            | Step::ForceApply { manager, .. }
            | Step::Update { manager, .. } => manager,
        }
    }

    pub fn api_version(&self) -> &APIVersion {
        match self {
            Step::Apply { api_version, .. }
            | Step::ForceApply { api_version, .. }
            | Step::Update { api_version, .. } => api_version,
        }
    }

    pub fn object(&self) -> &str {
        match self {
            Step::Apply { object, .. }
            | Step::ForceApply { object, .. }
            | Step::Update { object, .. } => object,
        }
    }

    fn expected_conflicts(&self) -> Option<Conflicts> {
        match self {
            Step::Apply {
                conflicts: Some(conflicts),
                ..
            } => Some(conflicts.iter().cloned().collect()),
            _ => None,
        }
    }
}

/// Scenario is an initial state, the steps to run against it and the
/// expected outcome.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Initial live object as YAML; empty means null.
    #[serde(default)]
    pub object: String,

    #[serde(default)]
    pub managed: ManagedFields,

    #[serde(default)]
    pub ops: Vec<Step>,

    #[serde(default)]
    pub expected_object: Option<String>,

    #[serde(default)]
    pub expected_managed: Option<ManagedFields>,
}

/// State is the live object and its managed fields between two steps.
#[derive(Debug, Clone)]
pub struct State {
    pub object: TypedValue,
    pub managers: ManagedFields,
}

impl From<Merged> for State {
    fn from(merged: Merged) -> Self {
        State {
            object: merged.object,
            managers: merged.managers,
        }
    }
}

impl State {
    pub fn new(object: TypedValue, managers: ManagedFields) -> Self {
        State { object, managers }
    }

    /// Runs one step. An apply that fails with exactly the expected
    /// conflicts leaves the state as it was.
    pub fn step(
        &self,
        updater: &Updater,
        pt: &ParseableType,
        index: usize,
        step: &Step,
    ) -> Result<State, ScenarioError> {
        let incoming = pt
            .from_yaml(step.object())
            .map_err(|source| ScenarioError::Parse { index, source })?;

        debug!(index, operation = %step.operation(), manager = step.manager(), "running step");
        let result = updater.merge(
            step.operation(),
            &self.object,
            &self.managers,
            &incoming,
            step.manager(),
            step.api_version(),
        );

        match (result, step.expected_conflicts()) {
            (Ok(merged), None) => Ok(merged.into()),
            (Ok(_), Some(expected)) => Err(ScenarioError::MissingConflicts { index, expected }),
            (Err(MergeError::Conflicts(actual)), Some(expected)) if actual == expected => {
                Ok(self.clone())
            }
            (Err(MergeError::Conflicts(actual)), expected) => {
                Err(ScenarioError::UnexpectedConflicts {
                    index,
                    expected: expected.unwrap_or_default(),
                    actual,
                })
            }
            (Err(source), _) => Err(ScenarioError::Merge { index, source }),
        }
    }
}

impl Scenario {
    pub fn from_yaml(yaml: &str) -> Result<Scenario, ScenarioError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Replays the scenario with a default updater.
    pub fn run(&self, pt: &ParseableType) -> Result<State, ScenarioError> {
        self.run_with(&Updater::default(), pt)
    }

    /// Replays every step, then checks the expected object and managed
    /// fields if the scenario states them.
    pub fn run_with(&self, updater: &Updater, pt: &ParseableType) -> Result<State, ScenarioError> {
        let object = pt.from_yaml(&self.object).map_err(ScenarioError::Object)?;
        let mut state = State::new(object, self.managed.clone());

        for (index, step) in self.ops.iter().enumerate() {
            state = state.step(updater, pt, index, step)?;
        }

        if let Some(expected) = &self.expected_object {
            let expected = pt.from_yaml(expected).map_err(ScenarioError::Object)?;
            if expected.value() != state.object.value() {
                return Err(ScenarioError::ObjectMismatch {
                    expected: to_yaml(expected.value())?,
                    actual: to_yaml(state.object.value())?,
                });
            }
        }

        if let Some(expected) = &self.expected_managed {
            if expected != &state.managers {
                return Err(ScenarioError::ManagedMismatch {
                    expected: serde_yaml::to_string(expected)?,
                    actual: serde_yaml::to_string(&state.managers)?,
                });
            }
        }

        Ok(state)
    }
}
