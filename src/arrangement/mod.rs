#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The mutable model of the three arrangement areas.

/// The draggable block type.
pub mod block;
/// The arrangement store and its operations.
pub mod store;

use std::fmt::Display;

use serde::{Deserialize, Serialize};

pub use block::Block;
pub use store::{ArrangementStore, BatchMove, CombineResult, MoveOutcome, SplitResult};

/// One of the three places a block can live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Area {
    /// Unplaced blocks waiting to be used.
    Pool,
    /// The learner's current answer, in order.
    Solution,
    /// Blocks the learner set aside.
    Trash,
}

impl Area {
    /// All areas, in display order.
    pub const ALL: [Area; 3] = [Area::Pool, Area::Solution, Area::Trash];
}

impl Display for Area {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Area::Pool => "pool",
            Area::Solution => "solution",
            Area::Trash => "trash",
        };
        write!(f, "{name}")
    }
}
