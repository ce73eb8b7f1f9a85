#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Error and outcome types shared across the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arrangement::Area;

/// Broken arrangement invariants. These indicate a bug in the caller or in
/// the engine, never a learner mistake.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ArrangementError {
    /// The same block id was found more than once across the areas.
    #[error("Block `{0}` appears more than once across the arrangement areas.")]
    DuplicateBlock(String),
    /// Line records that belong to the problem are not reachable from any area.
    #[error("Lines {0:?} are no longer reachable from any arrangement area.")]
    LostLines(Vec<usize>),
    /// Line records are reachable that the problem never defined, or are
    /// reachable twice.
    #[error("Lines {0:?} are reachable but were not expected (or are reachable twice).")]
    UnexpectedLines(Vec<usize>),
    /// Two members of the same paired group sit in the solution area.
    #[error("Group {0} has more than one member in the solution area.")]
    GroupConflict(usize),
}

/// Failures while reading a problem file.
#[derive(Debug, Error)]
pub enum ProblemError {
    /// The problem file could not be read.
    #[error("Could not read problem file `{path}`: {source}")]
    Io {
        /// Path that was being read.
        path:   String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The problem file is not valid JSON for a problem.
    #[error("Problem file `{path}` is not a valid problem description: {source}")]
    Json {
        /// Path that was being read.
        path:   String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
    /// A snapshot does not describe a consistent arrangement.
    #[error("Snapshot is inconsistent: {0}")]
    InconsistentSnapshot(#[from] ArrangementError),
}

/// Why an operation was not applied. These are recoverable, expected
/// conditions and are reported as values.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotApplied {
    /// The combiner needs more solution lines than remain.
    #[error("Cannot simplify further: only {0} solution lines remain.")]
    CannotSimplifyFurther(usize),
    /// No adjacent pair of solution lines can be merged.
    #[error("No adjacent solution lines can be merged.")]
    NoMergeCandidate,
    /// A block id is not known to the arrangement.
    #[error("Block `{0}` does not exist.")]
    UnknownBlock(String),
    /// A block exists but not in the area it was expected in.
    #[error("Block `{id}` is not in the {area} area.")]
    NotInArea {
        /// The block id.
        id:   String,
        /// The area the caller named.
        area: Area,
    },
    /// Combining needs at least two resolvable blocks.
    #[error("Combining needs at least two blocks, but only {0} could be found.")]
    TooFewBlocks(usize),
    /// The block is not combined, so it cannot be split.
    #[error("Block `{0}` is not a combined block.")]
    NotCombined(String),
    /// The block was combined by the problem definition itself.
    #[error("Block `{0}` was combined by the problem itself and cannot be split.")]
    Indivisible(String),
    /// Indentation is provided by the problem and cannot be edited.
    #[error("Indentation is provided for this problem and cannot be changed.")]
    IndentationLocked,
    /// Help was requested before enough incorrect attempts.
    #[error("Help is available after {threshold} incorrect attempts ({incorrect} so far).")]
    NotEligible {
        /// Incorrect attempts so far.
        incorrect: u32,
        /// Attempts needed.
        threshold: u32,
    },
    /// Every adaptation has already been exhausted.
    #[error("No further simplification is available for this problem.")]
    NoAdaptationAvailable,
}

/// Result of an operation that may legitimately be refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome<T> {
    /// The operation took effect.
    Applied(T),
    /// The operation was refused; nothing changed.
    NotApplied(NotApplied),
}

impl<T> Outcome<T> {
    /// Returns true if the operation took effect.
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    /// Returns the applied value, if any.
    pub fn applied(self) -> Option<T> {
        match self {
            Outcome::Applied(value) => Some(value),
            Outcome::NotApplied(_) => None,
        }
    }

    /// Returns the refusal reason, if any.
    pub fn reason(&self) -> Option<&NotApplied> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::NotApplied(reason) => Some(reason),
        }
    }

    /// Maps the applied value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Applied(value) => Outcome::Applied(f(value)),
            Outcome::NotApplied(reason) => Outcome::NotApplied(reason),
        }
    }
}

impl<T> From<NotApplied> for Outcome<T> {
    fn from(reason: NotApplied) -> Self {
        Outcome::NotApplied(reason)
    }
}
