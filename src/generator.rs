#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Builds a problem definition, distractors included, from plain source code.

use std::collections::HashSet;

use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{
    combiner::is_control_header,
    config::ProblemOptions,
    constants::{DISTRACTOR_TAG, MAX_GENERATED_DISTRACTORS, OPERATOR_SWAPS, VARIABLE_RENAMES},
    parser::ProblemDefinition,
};

/// Returns true for characters that can appear in an identifier.
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Replaces every occurrence of `word` in `line` that is not part of a
/// longer identifier.
fn replace_word(line: &str, word: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;

    for (start, _) in line.match_indices(word) {
        if start < last {
            continue;
        }
        let end = start + word.len();
        let before = line[..start].chars().next_back();
        let after = line[end..].chars().next();
        if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
            continue;
        }
        out.push_str(&line[last..start]);
        out.push_str(replacement);
        last = end;
    }

    out.push_str(&line[last..]);
    out
}

/// A header without its trailing colon.
fn missing_colon(line: &str) -> Option<String> {
    if is_control_header(line) {
        line.strip_suffix(':').map(|rest| rest.trim_end().to_string())
    } else {
        None
    }
}

/// Lines with one identifier swapped for a plausible wrong one.
fn renamed_variables(line: &str) -> Vec<String> {
    VARIABLE_RENAMES
        .iter()
        .flat_map(|(name, replacements)| {
            replacements.iter().map(move |r| replace_word(line, name, r))
        })
        .filter(|candidate| candidate != line)
        .collect()
}

/// Lines with one operator swapped for another.
fn swapped_operators(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (op, replacements) in OPERATOR_SWAPS {
        let wordy = op.starts_with(|c: char| c.is_alphabetic());
        for replacement in replacements {
            let candidate = if wordy {
                replace_word(line, op, replacement)
            } else {
                line.replace(op, replacement)
            };
            if candidate != line {
                out.push(candidate);
            }
        }
    }
    out
}

/// Lines with one integer literal nudged up or down by one.
fn off_by_one(line: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = line.char_indices().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (start, c) = chars[i];
        let bounded = i == 0 || !is_word_char(chars[i - 1].1);
        if !c.is_ascii_digit() || !bounded {
            i += 1;
            continue;
        }

        let mut j = i;
        while j < chars.len() && chars[j].1.is_ascii_digit() {
            j += 1;
        }
        let end = chars.get(j).map_or(line.len(), |(pos, _)| *pos);
        let bounded_after = chars.get(j).is_none_or(|(_, c)| !is_word_char(*c));

        if bounded_after && let Ok(value) = line[start..end].parse::<i128>() {
            for nudged in [value + 1, value - 1] {
                out.push(format!("{}{}{}", &line[..start], nudged, &line[end..]));
            }
        }
        i = j;
    }
    out
}

/// The line with the first argument of its first call removed.
fn dropped_argument(line: &str) -> Option<String> {
    let open = line
        .char_indices()
        .find(|(pos, c)| *c == '(' && line[..*pos].chars().next_back().is_some_and(is_word_char))
        .map(|(pos, _)| pos)?;
    let close = open + 1 + line[open + 1..].find(')')?;

    let args: Vec<&str> = line[open + 1..close].split(',').collect();
    if args.first().is_none_or(|a| a.trim().is_empty()) {
        return None;
    }

    let rest = args[1..].iter().map(|a| a.trim()).collect::<Vec<_>>().join(", ");
    Some(format!("{}{}{}", &line[..=open], rest, &line[close..]))
}

/// Every distractor candidate for one trimmed line, in strategy order.
fn candidates(line: &str) -> Vec<String> {
    let mut out = Vec::new();
    out.extend(missing_colon(line));
    out.extend(renamed_variables(line));
    out.extend(swapped_operators(line));
    out.extend(off_by_one(line));
    out.extend(dropped_argument(line));
    out
}

/// Derives distractor lines for `lines`, keeping each source line's leading
/// whitespace. Candidates are de-duplicated, never equal a correct line,
/// shuffled with `seed`, and capped at `min(lines + 2, 10)`.
pub fn generate_distractors(lines: &[&str], seed: u64) -> Vec<String> {
    let correct: HashSet<&str> = lines.iter().map(|l| l.trim()).collect();
    let mut seen = HashSet::new();
    let mut distractors = Vec::new();

    for line in lines {
        let trimmed = line.trim();
        let indent = &line[..line.len() - line.trim_start().len()];
        for candidate in candidates(trimmed) {
            let candidate = candidate.trim().to_string();
            if candidate.is_empty() || correct.contains(candidate.as_str()) {
                continue;
            }
            if seen.insert(candidate.clone()) {
                distractors.push(format!("{indent}{candidate}"));
            }
        }
    }

    distractors.shuffle(&mut StdRng::seed_from_u64(seed));
    distractors.truncate((lines.len() + 2).min(MAX_GENERATED_DISTRACTORS));
    distractors
}

/// Builds a problem from plain source code. Blank lines and full-line
/// comments are dropped; generated distractors are appended and
/// `max_wrong_lines` is set to their count.
pub fn generate_problem(source: &str, seed: u64) -> ProblemDefinition {
    let lines: Vec<&str> = source
        .lines()
        .filter(|l| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .collect();
    let distractors = generate_distractors(&lines, seed);

    tracing::info!(
        "Generated {} distractors for {} source lines",
        distractors.len(),
        lines.len()
    );

    let text = lines
        .iter()
        .map(|l| l.to_string())
        .chain(distractors.iter().map(|d| format!("{d} {DISTRACTOR_TAG}")))
        .collect::<Vec<_>>()
        .join("\n");
    let options = ProblemOptions::builder()
        .max_wrong_lines(distractors.len())
        .build();
    ProblemDefinition::parse(&text, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LineRole;

    #[test]
    fn replace_word_respects_identifier_boundaries() {
        assert_eq!(replace_word("x = max(x, xs)", "x", "y"), "y = max(y, xs)");
        assert_eq!(replace_word("for i in items:", "in", "not in"), "for i not in items:");
    }

    #[test]
    fn strategies_produce_expected_candidates() {
        assert_eq!(missing_colon("for i in range(3):"), Some("for i in range(3)".into()));
        assert_eq!(missing_colon("total = 1"), None);
        assert!(swapped_operators("if a == b:").contains(&"if a != b:".to_string()));
        assert_eq!(off_by_one("xs[10] = x2"), vec!["xs[11] = x2", "xs[9] = x2"]);
        assert_eq!(dropped_argument("print(a, b)"), Some("print(b)".into()));
        assert_eq!(dropped_argument("run()"), None);
    }

    #[test]
    fn distractors_are_capped_unique_and_never_correct() {
        let lines = ["for i in range(10):", "    print(i)"];
        let distractors = generate_distractors(&lines, 5);

        assert!(distractors.len() <= lines.len() + 2);
        let unique: HashSet<&String> = distractors.iter().collect();
        assert_eq!(unique.len(), distractors.len());
        for d in &distractors {
            assert!(!lines.iter().any(|l| l.trim() == d.trim()));
        }
        assert_eq!(distractors, generate_distractors(&lines, 5));
    }

    #[test]
    fn generated_problem_tags_distractors_and_sets_budget() {
        let def = generate_problem("# sum values\ncount = 0\n\nfor x in data:\n    count += x\n", 1);
        let correct: Vec<String> = def.solution_lines().map(|l| l.raw_text.clone()).collect();
        assert_eq!(correct, vec!["count = 0", "for x in data:", "    count += x"]);

        let distractors = def.distractor_lines().count();
        assert!(distractors > 0 && distractors <= 5);
        assert_eq!(def.options.max_wrong_lines, Some(distractors));
        assert!(def.distractor_lines().all(|l| l.role == LineRole::Distractor));
    }
}
