#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::collections::{BTreeMap, HashSet};

use itertools::Itertools;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use super::{Area, Block};
use crate::{
    error::{ArrangementError, NotApplied, Outcome},
    indentation::indent_level,
    parser::ProblemDefinition,
};

/// A single relocated block and the block it pushed out of the solution, if
/// any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// The block that was moved, as it now is.
    pub relocated: Block,
    /// A same-group block evicted from the solution into the trash.
    pub evicted:   Option<Block>,
}

/// Result of moving several blocks at once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMove {
    /// Blocks that were moved, in their new order.
    pub moved:   Vec<Block>,
    /// Blocks evicted from the solution by group conflicts.
    pub evicted: Vec<Block>,
    /// Ids that could not be found in the source area and were left alone.
    pub skipped: Vec<String>,
}

/// Result of combining blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombineResult {
    /// The new combined block.
    pub combined: Block,
    /// A same-group block evicted from the solution, if the combined block
    /// landed there.
    pub evicted:  Option<Block>,
    /// Ids that could not be resolved and were left out.
    pub skipped:  Vec<String>,
}

/// Result of splitting a combined block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitResult {
    /// The restored blocks, in order.
    pub blocks:  Vec<Block>,
    /// Blocks evicted from the solution by group conflicts.
    pub evicted: Vec<Block>,
}

/// The three block collections and the operations that move blocks between
/// them.
///
/// Every operation conserves the set of line records reachable from the
/// areas and leaves at most one member of each paired group in the solution.
/// Refusals are reported through [`Outcome::NotApplied`]; a broken invariant
/// panics in debug builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrangementStore {
    /// Unplaced blocks.
    pool:               Vec<Block>,
    /// The learner's answer, in order.
    solution:           Vec<Block>,
    /// Blocks set aside.
    trash:              Vec<Block>,
    /// Whitespace characters per indentation level.
    indent_unit:        usize,
    /// Whether indentation is provided and cannot be edited.
    indentation_locked: bool,
    /// Sorted line indices every arrangement must account for.
    universe:           Vec<usize>,
}

impl ArrangementStore {
    /// Builds the initial arrangement for `definition`, shuffling blocks with
    /// `seed`.
    ///
    /// With the discard workflow every block starts in the pool. Without it
    /// correct lines start in the solution and distractors in the trash.
    pub fn from_definition(definition: &ProblemDefinition, seed: u64) -> Self {
        let unit = definition.indent_unit();
        let locked = definition.indentation_provided;

        let mut blocks: Vec<Block> = definition
            .visible_lines()
            .into_iter()
            .map(|record| {
                let indentation = if locked { record.indent_level } else { 0 };
                Block::from_record(record, indentation, unit)
            })
            .collect();
        blocks.shuffle(&mut StdRng::seed_from_u64(seed));

        let universe = blocks
            .iter()
            .flat_map(|b| b.lines.iter().copied())
            .sorted()
            .collect();

        let (pool, solution, trash) = if definition.options.discard_workflow {
            (blocks, Vec::new(), Vec::new())
        } else {
            let (distractors, correct): (Vec<Block>, Vec<Block>) =
                blocks.into_iter().partition(|b| b.is_distractor);
            (Vec::new(), correct, distractors)
        };

        tracing::debug!(
            "Arranged {} blocks (pool {}, solution {}, trash {})",
            pool.len() + solution.len() + trash.len(),
            pool.len(),
            solution.len(),
            trash.len()
        );

        Self {
            pool,
            solution,
            trash,
            indent_unit: unit,
            indentation_locked: locked,
            universe,
        }
    }

    /// Returns the blocks of one area.
    pub fn area(&self, area: Area) -> &[Block] {
        match area {
            Area::Pool => &self.pool,
            Area::Solution => &self.solution,
            Area::Trash => &self.trash,
        }
    }

    /// Mutable access to one area.
    fn area_mut(&mut self, area: Area) -> &mut Vec<Block> {
        match area {
            Area::Pool => &mut self.pool,
            Area::Solution => &mut self.solution,
            Area::Trash => &mut self.trash,
        }
    }

    /// Returns the pool.
    pub fn pool(&self) -> &[Block] {
        &self.pool
    }

    /// Returns the solution area.
    pub fn solution(&self) -> &[Block] {
        &self.solution
    }

    /// Returns the trash.
    pub fn trash(&self) -> &[Block] {
        &self.trash
    }

    /// Returns the indentation unit.
    pub fn indent_unit(&self) -> usize {
        self.indent_unit
    }

    /// Returns true if indentation is provided and locked.
    pub fn indentation_locked(&self) -> bool {
        self.indentation_locked
    }

    /// Iterates over every block in every area.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        Area::ALL.into_iter().flat_map(|area| self.area(area).iter())
    }

    /// Finds the area and position of a block.
    pub fn locate(&self, id: &str) -> Option<(Area, usize)> {
        Area::ALL.into_iter().find_map(|area| {
            self.area(area)
                .iter()
                .position(|b| b.id == id)
                .map(|pos| (area, pos))
        })
    }

    /// Looks a block up by id.
    pub fn get(&self, id: &str) -> Option<&Block> {
        self.locate(id).map(|(area, pos)| &self.area(area)[pos])
    }

    /// Renders the solution area to program lines.
    pub fn solution_lines(&self) -> Vec<String> {
        self.solution
            .iter()
            .flat_map(|b| b.render(self.indent_unit))
            .collect()
    }

    /// Explains why `id` could not be found in `area`.
    fn missing(&self, id: &str, area: Area) -> NotApplied {
        if self.locate(id).is_some() {
            NotApplied::NotInArea {
                id: id.to_string(),
                area,
            }
        } else {
            NotApplied::UnknownBlock(id.to_string())
        }
    }

    /// Moves one block, inserting it at `insert_index` (clamped) or at the
    /// end. Placing a grouped block into the solution evicts any other member
    /// of its group into the trash.
    pub fn move_block(
        &mut self,
        id: &str,
        from: Area,
        to: Area,
        insert_index: Option<usize>,
    ) -> Outcome<MoveOutcome> {
        let Some(pos) = self.area(from).iter().position(|b| b.id == id) else {
            return self.missing(id, from).into();
        };

        let block = self.area_mut(from).remove(pos);
        let target = self.area_mut(to);
        let index = insert_index.unwrap_or(target.len()).min(target.len());
        target.insert(index, block.clone());

        let evicted = if to == Area::Solution {
            self.resolve_group_conflict(id).pop()
        } else {
            None
        };

        tracing::debug!("Moved {id} from {from} to {to} at {index}");
        self.debug_check();
        Outcome::Applied(MoveOutcome {
            relocated: block,
            evicted,
        })
    }

    /// Moves several blocks from one area to another. All removals happen
    /// before any insertion; the moved blocks keep their relative order from
    /// the source area and are appended to the target. Group conflicts are
    /// resolved once per moved block, in input order.
    ///
    /// Ids not found in `from` are skipped and reported; the rest still move.
    pub fn move_many(&mut self, ids: &[&str], from: Area, to: Area) -> Outcome<BatchMove> {
        let mut wanted = HashSet::new();
        let mut skipped = Vec::new();
        for id in ids {
            if self.area(from).iter().any(|b| b.id == *id) {
                wanted.insert(id.to_string());
            } else if !wanted.contains(*id) {
                skipped.push(id.to_string());
            }
        }

        if wanted.is_empty() {
            return match ids.first() {
                Some(id) => self.missing(id, from).into(),
                None => NotApplied::TooFewBlocks(0).into(),
            };
        }

        let (moved, kept): (Vec<Block>, Vec<Block>) = std::mem::take(self.area_mut(from))
            .into_iter()
            .partition(|b| wanted.contains(&b.id));
        *self.area_mut(from) = kept;
        self.area_mut(to).extend(moved.iter().cloned());

        let mut evicted = Vec::new();
        if to == Area::Solution {
            for id in ids.iter().filter(|id| wanted.contains(**id)).unique() {
                evicted.extend(self.resolve_group_conflict(id));
            }
        }

        if !skipped.is_empty() {
            tracing::debug!("Batch move skipped unknown ids {skipped:?}");
        }
        self.debug_check();
        Outcome::Applied(BatchMove {
            moved,
            evicted,
            skipped,
        })
    }

    /// Evicts every other member of `id`'s group from the solution into the
    /// trash, next to same-group blocks already there.
    fn resolve_group_conflict(&mut self, id: &str) -> Vec<Block> {
        let Some(group) = self
            .solution
            .iter()
            .find(|b| b.id == id)
            .and_then(|b| b.group_id)
        else {
            return Vec::new();
        };

        let (evicted, kept): (Vec<Block>, Vec<Block>) = std::mem::take(&mut self.solution)
            .into_iter()
            .partition(|b| b.id != id && b.group_id == Some(group));
        self.solution = kept;

        for block in &evicted {
            let insert_at = self
                .trash
                .iter()
                .rposition(|b| b.group_id == Some(group))
                .map_or(self.trash.len(), |p| p + 1);
            self.trash.insert(insert_at, block.clone());
            tracing::debug!("Evicted {} from the solution (group {group})", block.id);
        }
        evicted
    }

    /// Merges the blocks named by `ids` into one combined block placed in
    /// `target`.
    ///
    /// The combined block takes the minimum indentation of its inputs, writes
    /// each input's lines at that input's own indentation, and inherits its
    /// position and group from the input with the lowest original index.
    /// Unresolvable ids are skipped and reported; fewer than two resolvable
    /// ids is a refusal.
    pub fn combine(&mut self, ids: &[&str], target: Area) -> Outcome<CombineResult> {
        let mut seen = HashSet::new();
        let mut skipped = Vec::new();
        let mut members: Vec<(Area, Block)> = Vec::new();
        for id in ids {
            if !seen.insert(*id) {
                continue;
            }
            match self.locate(id) {
                Some((area, pos)) => members.push((area, self.area(area)[pos].clone())),
                None => skipped.push(id.to_string()),
            }
        }

        if members.len() < 2 {
            return NotApplied::TooFewBlocks(members.len()).into();
        }

        let Some((anchor_area, anchor)) = members
            .iter()
            .min_by_key(|(_, b)| b.original_index)
            .map(|(area, b)| (*area, b.clone()))
        else {
            return NotApplied::TooFewBlocks(0).into();
        };

        let member_ids: HashSet<String> = members.iter().map(|(_, b)| b.id.clone()).collect();
        let position = if anchor_area == target {
            self.area(target)
                .iter()
                .take_while(|b| b.id != anchor.id)
                .filter(|b| !member_ids.contains(&b.id))
                .count()
        } else {
            self.area(target)
                .iter()
                .filter(|b| !member_ids.contains(&b.id))
                .count()
        };

        let parts: Vec<Block> = members.into_iter().map(|(_, b)| b).collect();
        let combined = self.merge_parts(parts, &anchor);

        for area in Area::ALL {
            self.area_mut(area)
                .retain(|b| !member_ids.contains(&b.id));
        }
        self.area_mut(target).insert(position, combined.clone());

        let evicted = if target == Area::Solution {
            self.resolve_group_conflict(&combined.id).pop()
        } else {
            None
        };

        tracing::debug!("Combined {} into {target}", combined.id);
        self.debug_check();
        Outcome::Applied(CombineResult {
            combined,
            evicted,
            skipped,
        })
    }

    /// Builds the combined block for `parts`, taking group and original index
    /// from `anchor`.
    fn merge_parts(&self, parts: Vec<Block>, anchor: &Block) -> Block {
        let unit = self.indent_unit;
        let indentation = parts.iter().map(|b| b.indentation).min().unwrap_or(0);
        let sub_lines: Vec<String> = parts.iter().flat_map(|b| b.render(unit)).collect();
        let lines: Vec<usize> = parts.iter().flat_map(|b| b.lines.iter().copied()).collect();

        Block {
            id: format!("block-{}", lines.iter().join("+")),
            display_text: sub_lines.iter().map(|s| s.trim()).join("\n"),
            indentation,
            anchor_indent: indentation,
            expected_indent: parts
                .iter()
                .map(|b| b.expected_indent)
                .min()
                .unwrap_or(0),
            is_distractor: parts.iter().any(|b| b.is_distractor),
            group_id: anchor.group_id,
            group_color: anchor.group_color.clone(),
            is_combined: true,
            sub_lines,
            original_index: anchor.original_index,
            lines,
            parts,
        }
    }

    /// Splits a learner-combined block back into the blocks it was made of,
    /// in place. Each restored block takes the indentation written into its
    /// stored sub-line, shifted by however far the combined block has been
    /// re-indented since.
    pub fn split(&mut self, id: &str) -> Outcome<SplitResult> {
        let Some((area, pos)) = self.locate(id) else {
            return NotApplied::UnknownBlock(id.to_string()).into();
        };

        let block = &self.area(area)[pos];
        if !block.is_combined {
            return NotApplied::NotCombined(id.to_string()).into();
        }
        if block.parts.is_empty() {
            return NotApplied::Indivisible(id.to_string()).into();
        }

        let combined = self.area_mut(area).remove(pos);
        let unit = self.indent_unit;
        let shift = |level: usize| {
            (level + combined.indentation).saturating_sub(combined.anchor_indent)
        };

        let mut offset = 0;
        let mut restored = Vec::with_capacity(combined.parts.len());
        for mut part in combined.parts {
            part.indentation = if part.is_combined {
                shift(part.indentation)
            } else {
                shift(indent_level(&combined.sub_lines[offset], unit))
            };
            offset += part.line_count();
            restored.push(part);
        }

        let target = self.area_mut(area);
        for (i, part) in restored.iter().enumerate() {
            target.insert(pos + i, part.clone());
        }

        let mut evicted = Vec::new();
        if area == Area::Solution {
            for part in &restored {
                evicted.extend(self.resolve_group_conflict(&part.id));
            }
        }

        tracing::debug!("Split {id} into {} blocks", restored.len());
        self.debug_check();
        Outcome::Applied(SplitResult {
            blocks: restored,
            evicted,
        })
    }

    /// Sets a block's indentation. Refused when indentation is provided.
    pub fn set_indentation(&mut self, id: &str, level: usize) -> Outcome<Block> {
        if self.indentation_locked {
            return NotApplied::IndentationLocked.into();
        }
        let Some((area, pos)) = self.locate(id) else {
            return NotApplied::UnknownBlock(id.to_string()).into();
        };

        let block = &mut self.area_mut(area)[pos];
        block.indentation = level;
        Outcome::Applied(block.clone())
    }

    /// Checks that block ids are unique, that exactly the expected line
    /// records are reachable, and that no group has two members in the
    /// solution.
    pub fn check_invariants(&self) -> Result<(), ArrangementError> {
        let mut ids = HashSet::new();
        for block in self.blocks() {
            if !ids.insert(block.id.as_str()) {
                return Err(ArrangementError::DuplicateBlock(block.id.clone()));
            }
        }

        let reachable: Vec<usize> = self
            .blocks()
            .flat_map(|b| b.lines.iter().copied())
            .sorted()
            .collect();
        if reachable != self.universe {
            let present: HashSet<usize> = reachable.iter().copied().collect();
            let missing: Vec<usize> = self
                .universe
                .iter()
                .copied()
                .filter(|l| !present.contains(l))
                .collect();
            if !missing.is_empty() {
                return Err(ArrangementError::LostLines(missing));
            }
            let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
            for line in &reachable {
                *counts.entry(*line).or_default() += 1;
            }
            let expected: HashSet<usize> = self.universe.iter().copied().collect();
            let extra = counts
                .into_iter()
                .filter(|(line, count)| *count > 1 || !expected.contains(line))
                .map(|(line, _)| line)
                .collect();
            return Err(ArrangementError::UnexpectedLines(extra));
        }

        let mut groups = HashSet::new();
        for group in self.solution.iter().filter_map(|b| b.group_id) {
            if !groups.insert(group) {
                return Err(ArrangementError::GroupConflict(group));
            }
        }

        Ok(())
    }

    /// Fails loudly in debug builds if an operation broke an invariant.
    fn debug_check(&self) {
        if cfg!(debug_assertions)
            && let Err(e) = self.check_invariants()
        {
            panic!("arrangement invariant violated: {e}");
        }
    }
}
