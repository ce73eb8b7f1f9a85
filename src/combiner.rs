#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Merges adjacent solution lines into combined blocks to shrink the number
//! of pieces a learner has to order.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    config::EngineConfig,
    constants::CONTROL_KEYWORDS,
    error::{NotApplied, Outcome},
    parser::{LineRecord, LineRole, ProblemDefinition},
};

/// One merge performed by the combiner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Merge {
    /// Text of the first line, trimmed.
    pub first:  String,
    /// Text of the second line, trimmed.
    pub second: String,
    /// Score the pair was selected with.
    pub score:  i32,
}

/// Result of a successful combine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combined {
    /// The regenerated definition. A merged line keeps the group of the
    /// line it absorbed; re-run pairing to renumber.
    pub definition: ProblemDefinition,
    /// The merges, in the order they were made.
    pub merges:     Vec<Merge>,
}

/// Returns true if `line` opens a control structure: a keyword followed by
/// whitespace or `:`.
pub fn is_control_header(line: &str) -> bool {
    let line = line.trim_start();
    CONTROL_KEYWORDS.iter().any(|kw| {
        line.strip_prefix(kw)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_whitespace() || c == ':')
    })
}

/// Scores merging `next` into `current`. Returns `None` when the pair cannot
/// be merged because `next` is less indented than `current`.
pub fn score_pair(current: &LineRecord, next: &LineRecord, short_line_limit: usize) -> Option<i32> {
    if next.indent_level < current.indent_level {
        return None;
    }

    let nests = next.indent_level > current.indent_level;
    let mut score = 0;
    if next.indent_level == current.indent_level {
        score += 3;
    }
    if nests {
        score += 2;
    }
    let length = current.display_text().chars().count() + next.display_text().chars().count();
    if length < short_line_limit {
        score += 1;
    }
    let last_of_current = current
        .sub_lines
        .last()
        .map(String::as_str)
        .unwrap_or(&current.raw_text);
    if nests && is_control_header(last_of_current) {
        score -= 1;
    }

    Some(score)
}

/// Performs up to `times` merges of adjacent solution lines, stopping early
/// once fewer than `config.min_combinable_lines` solution lines remain.
///
/// Distractors are never merged and do not break adjacency: two solution
/// lines are adjacent when no other solution line sits between them. Two
/// lines that each anchor a paired group are never merged, since a block
/// belongs to at most one group.
pub fn combine_blocks(
    definition: &ProblemDefinition,
    times: usize,
    config: &EngineConfig,
) -> Outcome<Combined> {
    let solution_count = definition.solution_lines().count();
    if solution_count < config.min_combinable_lines {
        tracing::debug!("Refusing to combine: only {solution_count} solution lines");
        return NotApplied::CannotSimplifyFurther(solution_count).into();
    }

    let unit = definition.indent_unit();
    let mut records = definition.lines.clone();
    let mut merges = Vec::new();

    while merges.len() < times
        && records.iter().filter(|r| r.role == LineRole::Plain).count()
            >= config.min_combinable_lines
    {
        let best = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.role == LineRole::Plain)
            .tuple_windows()
            .filter(|((_, current), (_, next))| current.group.is_none() || next.group.is_none())
            .filter_map(|((i, current), (j, next))| {
                score_pair(current, next, config.short_line_limit).map(|score| (i, j, score))
            })
            .fold(None, |best: Option<(usize, usize, i32)>, candidate| match best {
                Some(b) if b.2 >= candidate.2 => Some(b),
                _ => Some(candidate),
            });

        let Some((i, j, score)) = best else {
            break;
        };

        let lines: Vec<(usize, String)> = records[i]
            .absolute_lines(unit)
            .into_iter()
            .chain(records[j].absolute_lines(unit))
            .collect();
        let Some(mut merged) = LineRecord::from_absolute_lines(i, &lines, LineRole::Plain, unit)
        else {
            break;
        };
        merged.group = records[i].group.or(records[j].group);

        tracing::debug!("Combining lines {i} and {j} (score {score})");
        merges.push(Merge {
            first: records[i].display_text(),
            second: records[j].display_text(),
            score,
        });
        records[i] = merged;
        records.remove(j);
    }

    if merges.is_empty() {
        return NotApplied::NoMergeCandidate.into();
    }

    Outcome::Applied(Combined {
        definition: ProblemDefinition::from_records(
            records,
            definition.options.clone(),
            definition.indentation_provided,
        ),
        merges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ProblemOptions, pairing::identify_pairs};

    fn definition(source: &str) -> ProblemDefinition {
        ProblemDefinition::parse(source, ProblemOptions::default())
    }

    #[test]
    fn recognises_control_headers() {
        assert!(is_control_header("if x:"));
        assert!(is_control_header("    else:"));
        assert!(is_control_header("try:"));
        assert!(!is_control_header("iffy = 1"));
        assert!(!is_control_header("format(x)"));
    }

    #[test]
    fn prefers_equal_indentation_over_header_and_body() {
        let def = definition("def f(xs):\n    total = 0\n    for x in xs:\n        total += x\n    return total");
        let combined = combine_blocks(&def, 1, &EngineConfig::default())
            .applied()
            .expect("five lines combine");

        assert_eq!(combined.merges.len(), 1);
        assert_eq!(combined.merges[0].first, "total = 0");
        assert_eq!(combined.merges[0].second, "for x in xs:");
        assert_eq!(combined.merges[0].score, 4);
        assert_eq!(combined.definition.solution_lines().count(), 4);
        assert_eq!(combined.definition.expected_lines(), def.expected_lines());
    }

    #[test]
    fn refuses_when_three_or_fewer_lines() {
        let def = definition("a = 1\nb = 2\nprint(a + b)\nc = 3 #distractor");
        let outcome = combine_blocks(&def, 1, &EngineConfig::default());
        assert_eq!(outcome.reason(), Some(&NotApplied::CannotSimplifyFurther(3)));
    }

    #[test]
    fn stops_once_fewer_than_four_lines_remain() {
        let def = definition("a = 1\nb = 2\nc = 3\nd = 4\ne = 5");
        let combined = combine_blocks(&def, 10, &EngineConfig::default())
            .applied()
            .expect("combines");

        assert_eq!(combined.merges.len(), 2);
        assert_eq!(combined.definition.solution_lines().count(), 3);
        assert_eq!(combined.definition.expected_lines(), def.expected_lines());
    }

    #[test]
    fn distractors_are_skipped_but_kept() {
        let def = definition("a = 1\nz = 9 #distractor\nb = 2\nc = 3\nd = 4");
        let combined = combine_blocks(&def, 1, &EngineConfig::default())
            .applied()
            .expect("combines");

        let first = &combined.definition.lines[0];
        assert!(first.is_combined);
        assert_eq!(first.display_text(), "a = 1\nb = 2");
        assert_eq!(combined.definition.distractor_lines().count(), 1);
        assert_eq!(combined.definition.lines[1].index, 1);
    }

    #[test]
    fn never_merges_into_a_dedent() {
        let def = definition("        a\n    b\nc\nd");
        let outcome = combine_blocks(&def, 1, &EngineConfig::default());
        // Only (c, d) has a non-negative step.
        let combined = outcome.applied().expect("one pair is mergeable");
        assert_eq!(combined.merges[0].first, "c");
    }

    #[test]
    fn two_group_anchors_are_never_merged() {
        let mut def = definition("a = 1\nb = 2\nc = 3\nd = 4\na = 9 #distractor\nb = 9 #distractor");
        let groups = identify_pairs(&mut def);
        assert_eq!(groups.len(), 2);

        let combined = combine_blocks(&def, 1, &EngineConfig::default())
            .applied()
            .expect("combines");
        assert_eq!(combined.merges[0].first, "b = 2");
        assert_eq!(combined.merges[0].second, "c = 3");

        let merged = &combined.definition.lines[1];
        assert!(merged.is_combined);
        assert_eq!(merged.group, def.lines[1].group);
    }
}
