//! # parsons
//!
//! An adaptive arrangement and validation engine for Parsons problems: a
//! learner orders shuffled lines of code into a program, and the engine pairs
//! near-duplicate distractors, tracks where every block lives, checks the
//! answer line by line, and simplifies the problem when the learner keeps
//! getting it wrong.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Adaptive controller: attempt counters and the help state machine
pub mod adaptive;
/// Blocks, arrangement areas and the operations that move blocks around
pub mod arrangement;
/// Merging adjacent solution lines into combined blocks
pub mod combiner;
/// Per-problem options and engine-wide tunables
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Error types and the `Outcome` of operations that may be refused
pub mod error;
/// Problem generation from plain source code
pub mod generator;
/// Indentation levels and indentation hints
pub mod indentation;
/// Pairing correct lines with their near-duplicate distractors
pub mod pairing;
/// Parsing line-tagged problem definitions
pub mod parser;
/// Problem files on disk
pub mod problem;
/// A learner's session with one problem
pub mod session;
/// Near-duplicate detection between lines of code
pub mod similarity;
/// Structural checking of a learner's arrangement
pub mod validator;

pub use adaptive::{Adaptation, AdaptiveController, AdaptiveState, HelpPhase};
pub use arrangement::{ArrangementStore, Area, Block};
pub use config::{EngineConfig, ProblemOptions};
pub use error::{ArrangementError, NotApplied, Outcome, ProblemError};
pub use parser::{LineRecord, LineRole, ProblemDefinition};
pub use session::{Session, SessionSnapshot};
pub use validator::ValidationReport;
