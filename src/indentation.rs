#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Line-by-line indentation comparison against the expected program.

use serde::{Deserialize, Serialize};

/// A single indentation mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndentationHint {
    /// Zero-based position of the line in the learner's program.
    pub line_index:      usize,
    /// Indentation level the line currently has.
    pub current_indent:  usize,
    /// Indentation level the line should have.
    pub expected_indent: usize,
    /// Human-readable hint.
    pub message:         String,
}

/// Width of the leading whitespace of `line`, with a tab counting as one
/// full indentation unit.
pub fn leading_width(line: &str, indent_unit: usize) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { indent_unit } else { 1 })
        .sum()
}

/// `floor(leading whitespace width / indent_unit)`.
pub fn indent_level(line: &str, indent_unit: usize) -> usize {
    leading_width(line, indent_unit) / indent_unit.max(1)
}

/// Compares `current` against `expected` position by position, up to the
/// shorter of the two, and returns one hint per indentation mismatch.
pub fn diff<C, E>(current: &[C], expected: &[E], indent_unit: usize) -> Vec<IndentationHint>
where
    C: AsRef<str>,
    E: AsRef<str>,
{
    current
        .iter()
        .zip(expected)
        .enumerate()
        .filter_map(|(line_index, (cur, exp))| {
            let cur = cur.as_ref();
            let current_indent = indent_level(cur, indent_unit);
            let expected_indent = indent_level(exp.as_ref(), indent_unit);

            (current_indent != expected_indent).then(|| IndentationHint {
                line_index,
                current_indent,
                expected_indent,
                message: hint_message(line_index, cur.trim(), current_indent, expected_indent),
            })
        })
        .collect()
}

/// Builds the message for one mismatch.
fn hint_message(line_index: usize, content: &str, current: usize, expected: usize) -> String {
    let (distance, direction) = if expected > current {
        (expected - current, "more")
    } else {
        (current - expected, "less")
    };
    let plural = if distance == 1 { "" } else { "s" };

    let mut message = format!(
        "Line {} \"{content}\" should be indented {direction} ({distance} level{plural}).",
        line_index + 1
    );
    if let Some(context) = context_hint(content) {
        message.push(' ');
        message.push_str(context);
    }
    message
}

/// Extra advice keyed off the first word of the trimmed line.
fn context_hint(content: &str) -> Option<&'static str> {
    let first_word = content
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default();

    match first_word {
        "if" | "for" | "while" => Some("Control structures define new blocks."),
        "else" | "elif" => Some("It should align with the matching `if`."),
        "return" => Some("A `return` is usually inside a function."),
        _ => None,
    }
}
