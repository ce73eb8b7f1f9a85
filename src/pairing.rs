#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Groups each correct line with its near-duplicate distractors.

use serde::{Deserialize, Serialize};

use crate::{
    constants::GROUP_COLORS,
    parser::{LineRole, ProblemDefinition},
    similarity::related,
};

/// A correct line and the distractors that look like it. Only one member of
/// a group may be placed in the solution at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairGroup {
    /// Group number, in order of the correct line.
    pub id:          usize,
    /// Display colour of the group.
    pub color:       String,
    /// Index of the correct line.
    pub correct:     usize,
    /// Indices of the paired distractors.
    pub distractors: Vec<usize>,
}

impl PairGroup {
    /// Returns every member index, correct line first.
    pub fn members(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::once(self.correct).chain(self.distractors.iter().copied())
    }
}

/// Returns the palette colour for a group index.
pub fn group_color(group_index: usize) -> &'static str {
    GROUP_COLORS[group_index % GROUP_COLORS.len()]
}

/// Finds paired groups in `definition`, writing group ids into its line
/// records and re-tagging grouped distractors as [`LineRole::Paired`].
///
/// A distractor joins the group of the first correct line (in definition
/// order) it is related to and is never considered for a later one. A paired
/// line that already carries a group stays with the correct line holding
/// that group, even if that line has since been merged with others. Groups
/// are renumbered in order of their correct line on every run.
pub fn identify_pairs(definition: &mut ProblemDefinition) -> Vec<PairGroup> {
    let partners = current_partners(definition);
    for line in &mut definition.lines {
        line.group = None;
    }

    let mut claimed: Vec<bool> = partners.iter().map(Option::is_some).collect();
    let mut groups = Vec::new();

    for correct in 0..definition.lines.len() {
        if definition.lines[correct].role != LineRole::Plain {
            continue;
        }

        let text = definition.lines[correct].display_text();
        let matches: Vec<usize> = definition
            .lines
            .iter()
            .enumerate()
            .filter(|(i, line)| {
                partners[*i] == Some(correct)
                    || (!claimed[*i]
                        && line.role.is_distractor()
                        && related(&text, &line.display_text()))
            })
            .map(|(i, _)| i)
            .collect();

        if matches.is_empty() {
            continue;
        }

        let id = groups.len();
        definition.lines[correct].group = Some(id);
        for &i in &matches {
            claimed[i] = true;
            definition.lines[i].group = Some(id);
            definition.lines[i].role = LineRole::Paired;
        }

        tracing::debug!(
            "Group {id}: line {correct} paired with distractors {matches:?}"
        );
        groups.push(PairGroup {
            id,
            color: group_color(id).to_string(),
            correct,
            distractors: matches,
        });
    }

    groups
}

/// For each line, the correct line it is already grouped with: a paired line
/// whose group is held by a correct line. Paired lines without a group (as
/// read from definition text) have no partner yet.
fn current_partners(definition: &ProblemDefinition) -> Vec<Option<usize>> {
    definition
        .lines
        .iter()
        .map(|line| {
            let group = line.group.filter(|_| line.role == LineRole::Paired)?;
            definition
                .lines
                .iter()
                .position(|l| l.role == LineRole::Plain && l.group == Some(group))
        })
        .collect()
}
