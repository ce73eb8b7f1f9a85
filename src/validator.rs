#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Structural check of the learner's arrangement against the expected
//! program. Nothing is executed.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

use crate::{
    arrangement::Block,
    indentation::{IndentationHint, diff, indent_level},
    parser::ProblemDefinition,
};

/// Outcome of comparing one line position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineResult {
    /// Zero-based line position.
    pub index:          usize,
    /// The learner's line at this position, if any.
    pub rendered:       Option<String>,
    /// The expected line at this position, if any.
    pub expected:       Option<String>,
    /// Whether the trimmed text matches.
    pub text_matches:   bool,
    /// Whether the indentation level matches.
    pub indent_matches: bool,
}

impl LineResult {
    /// Whether the line is fully correct.
    pub fn is_match(&self) -> bool {
        self.text_matches && self.indent_matches
    }
}

/// A learner line found somewhere in the expected program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineMatch {
    /// Position in the learner's program.
    pub user_pos:     usize,
    /// First position in the expected program with the same text.
    pub expected_pos: usize,
    /// The trimmed text.
    pub content:      String,
}

/// A matched line that appears earlier than the line before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderIssue {
    /// Position in the learner's program.
    pub user_pos:     usize,
    /// Position the line has in the expected program.
    pub expected_pos: usize,
}

/// Content-level comparison ignoring indentation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    /// Learner lines that occur in the expected program.
    pub matching_lines:       Vec<LineMatch>,
    /// Expected lines the learner has not placed.
    pub missing_lines:        Vec<String>,
    /// Learner lines that are not in the expected program.
    pub extra_lines:          Vec<String>,
    /// Lines placed before a line that should come first.
    pub order_issues:         Vec<OrderIssue>,
    /// First position whose text differs from the expected text.
    pub first_error_position: Option<usize>,
}

/// A programming concept recognised by keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Concept {
    /// Function definitions and returns.
    Functions,
    /// `for` / `while` loops.
    Loops,
    /// `if` / `else` / `elif`.
    Conditionals,
    /// Assignment.
    Variables,
    /// Printing.
    Output,
    /// Reading input.
    Input,
    /// List literals and list operations.
    Lists,
    /// String literals and formatting.
    Strings,
}

impl Concept {
    /// Every concept, with the keywords that indicate it.
    const KEYWORDS: [(Concept, &'static [&'static str]); 8] = [
        (Concept::Functions, &["def ", "return"]),
        (Concept::Loops, &["for ", "while "]),
        (Concept::Conditionals, &["if ", "else", "elif"]),
        (Concept::Variables, &["="]),
        (Concept::Output, &["print("]),
        (Concept::Input, &["input("]),
        (Concept::Lists, &["[", "]", ".append", ".extend"]),
        (Concept::Strings, &["'", "\"", ".format", "f'"]),
    ];
}

/// Concepts of the expected program, split by whether the learner's
/// arrangement uses them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptReport {
    /// Concepts the learner's program uses.
    pub present: Vec<Concept>,
    /// Concepts the learner's program lacks.
    pub missing: Vec<Concept>,
}

/// Verdict on the learner's arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    /// Every line matches in text and indentation, and the lengths agree.
    pub is_correct:      bool,
    /// `1.0` when correct, otherwise the fraction of matching positions.
    pub score:           f64,
    /// One hint per indentation mismatch.
    pub hints:           Vec<IndentationHint>,
    /// Per-position results.
    pub line_results:    Vec<LineResult>,
    /// Human-readable summary of each indentation problem.
    pub specific_issues: Vec<String>,
    /// Content-level comparison.
    pub comparison:      ComparisonReport,
    /// Concept coverage.
    pub concepts:        ConceptReport,
    /// Line diff of expected versus learner program.
    pub diff:            String,
    /// The learner's program as rendered.
    pub rendered:        Vec<String>,
    /// The expected program.
    pub expected:        Vec<String>,
}

/// Renders blocks to program lines at their current indentation.
pub fn render_blocks(blocks: &[Block], indent_unit: usize) -> Vec<String> {
    blocks.iter().flat_map(|b| b.render(indent_unit)).collect()
}

/// Validates the blocks of a solution area against `definition`. Safe to call
/// at any time; it has no side effects.
pub fn validate(solution: &[Block], definition: &ProblemDefinition) -> ValidationReport {
    let unit = definition.indent_unit();
    validate_lines(&render_blocks(solution, unit), &definition.expected_lines(), unit)
}

/// Validates already-rendered program lines.
pub fn validate_lines(rendered: &[String], expected: &[String], indent_unit: usize) -> ValidationReport {
    let positions = rendered.len().max(expected.len());
    let line_results: Vec<LineResult> = (0..positions)
        .map(|index| {
            let r = rendered.get(index);
            let e = expected.get(index);
            let (text_matches, indent_matches) = match (r, e) {
                (Some(r), Some(e)) => (
                    r.trim() == e.trim(),
                    indent_level(r, indent_unit) == indent_level(e, indent_unit),
                ),
                _ => (false, false),
            };
            LineResult {
                index,
                rendered: r.cloned(),
                expected: e.cloned(),
                text_matches,
                indent_matches,
            }
        })
        .collect();

    let matching = line_results.iter().filter(|l| l.is_match()).count();
    let is_correct = rendered.len() == expected.len() && matching == positions;
    let score = if is_correct || positions == 0 {
        1.0
    } else {
        matching as f64 / positions as f64
    };

    let hints = diff(rendered, expected, indent_unit);
    let specific_issues = hints
        .iter()
        .map(|h| {
            format!(
                "Line {}: indentation should be {} level(s), not {} level(s)",
                h.line_index + 1,
                h.expected_indent,
                h.current_indent
            )
        })
        .collect();

    tracing::debug!("Validated {} lines: correct={is_correct}, score={score:.2}", rendered.len());
    ValidationReport {
        is_correct,
        score,
        hints,
        line_results,
        specific_issues,
        comparison: compare_detailed(rendered, expected),
        concepts: analyze_concepts(rendered, expected),
        diff: format_diff(&expected.join("\n"), &rendered.join("\n")),
        rendered: rendered.to_vec(),
        expected: expected.to_vec(),
    }
}

/// Compares the learner's lines with the expected lines by content alone.
pub fn compare_detailed<U, E>(user: &[U], expected: &[E]) -> ComparisonReport
where
    U: AsRef<str>,
    E: AsRef<str>,
{
    let user: Vec<&str> = user.iter().map(|l| l.as_ref().trim()).collect();
    let expected: Vec<&str> = expected.iter().map(|l| l.as_ref().trim()).collect();

    let matching_lines: Vec<LineMatch> = user
        .iter()
        .enumerate()
        .filter_map(|(user_pos, content)| {
            expected
                .iter()
                .position(|e| e == content)
                .map(|expected_pos| LineMatch {
                    user_pos,
                    expected_pos,
                    content: content.to_string(),
                })
        })
        .collect();

    let missing_lines = expected
        .iter()
        .filter(|e| !user.contains(e))
        .unique()
        .map(|s| s.to_string())
        .collect();
    let extra_lines = user
        .iter()
        .filter(|u| !expected.contains(u))
        .unique()
        .map(|s| s.to_string())
        .collect();

    let order_issues = matching_lines
        .iter()
        .tuple_windows()
        .filter(|(prev, next)| next.expected_pos < prev.expected_pos)
        .map(|(_, next)| OrderIssue {
            user_pos:     next.user_pos,
            expected_pos: next.expected_pos,
        })
        .collect();

    let first_error_position = user
        .iter()
        .zip(&expected)
        .position(|(u, e)| u != e)
        .or_else(|| (user.len() != expected.len()).then(|| user.len().min(expected.len())));

    ComparisonReport {
        matching_lines,
        missing_lines,
        extra_lines,
        order_issues,
        first_error_position,
    }
}

/// Finds which concepts of the expected program the learner's program uses.
pub fn analyze_concepts<U, E>(user: &[U], expected: &[E]) -> ConceptReport
where
    U: AsRef<str>,
    E: AsRef<str>,
{
    let user_text = user
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase();
    let expected_text = expected
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase();

    let mut report = ConceptReport::default();
    for (concept, keywords) in Concept::KEYWORDS {
        if !keywords.iter().any(|k| expected_text.contains(k)) {
            continue;
        }
        if keywords.iter().any(|k| user_text.contains(k)) {
            report.present.push(concept);
        } else {
            report.missing.push(concept);
        }
    }
    report
}

/// Formats a line diff between expected and actual programs.
fn format_diff(expected: &str, actual: &str) -> String {
    let diff = TextDiff::from_lines(expected, actual);
    let mut output = String::new();

    for change in diff.iter_all_changes() {
        let prefix = match change.tag() {
            ChangeTag::Delete => "-",
            ChangeTag::Insert => "+",
            ChangeTag::Equal => " ",
        };
        output.push_str(&format!("{} {}", prefix, change));
        if change.missing_newline() {
            output.push('\n');
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn exact_program_is_correct() {
        let expected = lines(&["def f():", "    return 1"]);
        let report = validate_lines(&expected, &expected, 4);
        assert!(report.is_correct);
        assert_eq!(report.score, 1.0);
        assert!(report.hints.is_empty());
        assert!(report.comparison.first_error_position.is_none());
    }

    #[test]
    fn wrong_indentation_gets_partial_credit_and_a_hint() {
        let report = validate_lines(&lines(&["if x:", "y=1"]), &lines(&["if x:", "    y=1"]), 4);
        assert!(!report.is_correct);
        assert_eq!(report.score, 0.5);
        assert_eq!(report.hints.len(), 1);
        assert_eq!(
            report.specific_issues,
            vec!["Line 2: indentation should be 1 level(s), not 0 level(s)".to_string()]
        );
        // Content still matches line for line.
        assert!(report.comparison.first_error_position.is_none());
    }

    #[test]
    fn length_mismatch_is_never_correct() {
        let expected = lines(&["a", "b", "c"]);
        let report = validate_lines(&lines(&["a", "b"]), &expected, 4);
        assert!(!report.is_correct);
        assert!((report.score - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.comparison.missing_lines, vec!["c".to_string()]);
        assert_eq!(report.comparison.first_error_position, Some(2));
    }

    #[test]
    fn detects_order_issues_and_extra_lines() {
        let report = compare_detailed(&["b = 2", "a = 1", "z = 0"], &["a = 1", "b = 2"]);
        assert_eq!(report.matching_lines.len(), 2);
        assert_eq!(report.order_issues, vec![OrderIssue {
            user_pos:     1,
            expected_pos: 0,
        }]);
        assert_eq!(report.extra_lines, vec!["z = 0".to_string()]);
        assert_eq!(report.first_error_position, Some(0));
    }

    #[test]
    fn concepts_only_cover_the_expected_program() {
        let report = analyze_concepts(&["x = 1"], &["for i in xs:", "    x = i"]);
        assert_eq!(report.present, vec![Concept::Variables]);
        assert_eq!(report.missing, vec![Concept::Loops]);
    }

    #[test]
    fn diff_marks_changed_lines() {
        let report = validate_lines(&lines(&["a", "c"]), &lines(&["a", "b"]), 4);
        assert!(report.diff.contains("- b"));
        assert!(report.diff.contains("+ c"));
        assert!(report.diff.contains("  a"));
    }
}
