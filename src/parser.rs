#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Parses a line-tagged problem definition into typed line records.

use serde::{Deserialize, Serialize};

use crate::{
    config::ProblemOptions,
    constants::{BLOCK_SEPARATOR, DISTRACTOR_TAG, PAIRED_TAG},
    indentation::indent_level,
};

/// What a line is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineRole {
    /// Part of the expected solution.
    Plain,
    /// A wrong line that is not grouped with any correct line.
    Distractor,
    /// A wrong line grouped with a near-identical correct line.
    Paired,
}

impl LineRole {
    /// Returns true for the roles that never belong in the solution.
    pub fn is_distractor(self) -> bool {
        !matches!(self, LineRole::Plain)
    }
}

/// One non-blank line of a problem definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRecord {
    /// Position among the non-blank lines of the definition.
    pub index:        usize,
    /// The line with tags removed, leading whitespace kept.
    pub raw_text:     String,
    /// Indentation level of the line (of its first sub-line if combined).
    pub indent_level: usize,
    /// What the line is for.
    pub role:         LineRole,
    /// Whether the line holds several sub-lines joined by the block separator.
    pub is_combined:  bool,
    /// The sub-lines of a combined line, verbatim. The first keeps the line's
    /// own leading whitespace, later ones carry indentation relative to it.
    pub sub_lines:    Vec<String>,
    /// Paired group this line belongs to, assigned by pairing.
    pub group:        Option<usize>,
}

impl LineRecord {
    /// Parses a single non-blank line. Never fails: a malformed separator
    /// leaves the line as plain text.
    pub fn parse(index: usize, line: &str, indent_unit: usize) -> Self {
        let (body, role) = strip_tags(line);
        let indent_level = indent_level(&body, indent_unit);

        let sub_lines = split_sub_lines(&body);
        let is_combined = sub_lines.len() > 1;

        Self {
            index,
            raw_text: body,
            indent_level,
            role,
            is_combined,
            sub_lines: if is_combined { sub_lines } else { Vec::new() },
            group: None,
        }
    }

    /// Returns the trimmed text shown to the learner. Combined lines show
    /// their sub-lines joined by newlines.
    pub fn display_text(&self) -> String {
        if self.is_combined {
            self.sub_lines
                .iter()
                .map(|s| s.trim())
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            self.raw_text.trim().to_string()
        }
    }

    /// Returns the trimmed text of the first sub-line (or the line itself).
    pub fn head_text(&self) -> &str {
        self.sub_lines.first().unwrap_or(&self.raw_text).trim()
    }

    /// Returns `(absolute indent level, trimmed text)` for each physical line
    /// this record expands to.
    pub fn absolute_lines(&self, indent_unit: usize) -> Vec<(usize, String)> {
        if !self.is_combined {
            return vec![(self.indent_level, self.raw_text.trim().to_string())];
        }

        self.sub_lines
            .iter()
            .enumerate()
            .map(|(i, sub)| {
                let level = if i == 0 {
                    self.indent_level
                } else {
                    self.indent_level + indent_level(sub, indent_unit)
                };
                (level, sub.trim().to_string())
            })
            .collect()
    }

    /// Builds a record from absolute `(indent level, text)` lines, writing
    /// later sub-lines relative to the first. Returns `None` if a later line
    /// is less indented than the first, which the separator format cannot
    /// express.
    pub fn from_absolute_lines(
        index: usize,
        lines: &[(usize, String)],
        role: LineRole,
        indent_unit: usize,
    ) -> Option<Self> {
        let (first_level, first_text) = lines.first()?;
        let pad = |level: usize| " ".repeat(level * indent_unit);

        let mut sub_lines = vec![format!("{}{}", pad(*first_level), first_text)];
        for (level, text) in &lines[1..] {
            let relative = level.checked_sub(*first_level)?;
            sub_lines.push(format!("{}{}", pad(relative), text));
        }

        let is_combined = sub_lines.len() > 1;
        Some(Self {
            index,
            raw_text: sub_lines.join(BLOCK_SEPARATOR),
            indent_level: *first_level,
            role,
            is_combined,
            sub_lines: if is_combined { sub_lines } else { Vec::new() },
            group: None,
        })
    }

    /// Renders the record back to definition syntax, tag included.
    pub fn to_source(&self) -> String {
        match self.role {
            LineRole::Plain => self.raw_text.clone(),
            LineRole::Distractor => format!("{} {DISTRACTOR_TAG}", self.raw_text),
            LineRole::Paired => format!("{} {PAIRED_TAG}", self.raw_text),
        }
    }
}

/// Strips trailing `#distractor` / `#paired` tags and works out the role.
fn strip_tags(line: &str) -> (String, LineRole) {
    let mut body = line.trim_end();
    let mut role = LineRole::Plain;

    loop {
        if let Some(rest) = body.strip_suffix(PAIRED_TAG) {
            role = LineRole::Paired;
            body = rest.trim_end();
        } else if let Some(rest) = body.strip_suffix(DISTRACTOR_TAG) {
            if role == LineRole::Plain {
                role = LineRole::Distractor;
            }
            body = rest.trim_end();
        } else {
            break;
        }
    }

    (body.to_string(), role)
}

/// Splits a line on the block separator. A separator that leaves an empty
/// piece is treated as literal text.
fn split_sub_lines(body: &str) -> Vec<String> {
    if !body.contains(BLOCK_SEPARATOR) {
        return vec![body.to_string()];
    }

    let pieces: Vec<&str> = body.split(BLOCK_SEPARATOR).collect();
    if pieces.iter().any(|p| p.trim().is_empty()) {
        tracing::debug!("Treating malformed combined line as plain text: {body:?}");
        return vec![body.to_string()];
    }

    pieces.into_iter().map(str::to_string).collect()
}

/// A parsed problem: ordered line records plus the options they were parsed
/// with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDefinition {
    /// Non-blank lines, in definition order.
    pub lines:                Vec<LineRecord>,
    /// Options the problem was loaded with.
    pub options:              ProblemOptions,
    /// Whether indentation has been revealed to the learner.
    pub indentation_provided: bool,
}

impl ProblemDefinition {
    /// Parses a raw definition, skipping blank lines.
    pub fn parse(source: &str, options: ProblemOptions) -> Self {
        let unit = options.indent_unit();
        let lines = source
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(index, line)| LineRecord::parse(index, line, unit))
            .collect();

        Self {
            lines,
            indentation_provided: !options.allow_manual_indent,
            options,
        }
    }

    /// Rebuilds a definition from records, renumbering them in order. Group
    /// assignments are kept so that pairing can hold paired lines to their
    /// groups.
    pub fn from_records(
        records: impl IntoIterator<Item = LineRecord>,
        options: ProblemOptions,
        indentation_provided: bool,
    ) -> Self {
        let lines = records
            .into_iter()
            .enumerate()
            .map(|(index, mut record)| {
                record.index = index;
                record
            })
            .collect();

        Self {
            lines,
            options,
            indentation_provided,
        }
    }

    /// Returns the indentation unit of this problem.
    pub fn indent_unit(&self) -> usize {
        self.options.indent_unit()
    }

    /// Renders the definition back to its tagged text form.
    pub fn to_source(&self) -> String {
        self.lines
            .iter()
            .map(LineRecord::to_source)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Iterates over the lines that belong in the solution.
    pub fn solution_lines(&self) -> impl Iterator<Item = &LineRecord> {
        self.lines.iter().filter(|l| l.role == LineRole::Plain)
    }

    /// Iterates over distractor lines, paired or not.
    pub fn distractor_lines(&self) -> impl Iterator<Item = &LineRecord> {
        self.lines.iter().filter(|l| l.role.is_distractor())
    }

    /// Returns the expected program, one string per physical line, rendered
    /// with this problem's indentation unit.
    pub fn expected_lines(&self) -> Vec<String> {
        let unit = self.indent_unit();
        self.solution_lines()
            .flat_map(|l| l.absolute_lines(unit))
            .map(|(level, text)| format!("{}{}", " ".repeat(level * unit), text))
            .collect()
    }

    /// Returns the line records that become blocks, honouring
    /// `max_wrong_lines`.
    pub fn visible_lines(&self) -> Vec<&LineRecord> {
        let mut budget = self.options.max_wrong_lines.unwrap_or(usize::MAX);
        self.lines
            .iter()
            .filter(|l| {
                if !l.role.is_distractor() {
                    return true;
                }
                if budget == 0 {
                    return false;
                }
                budget -= 1;
                true
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ProblemDefinition {
        ProblemDefinition::parse(source, ProblemOptions::default())
    }

    #[test]
    fn skips_blank_lines_and_reads_indentation() {
        let def = parse("def f(x):\n\n    return x\n   \n");
        assert_eq!(def.lines.len(), 2);
        assert_eq!(def.lines[0].indent_level, 0);
        assert_eq!(def.lines[1].indent_level, 1);
        assert_eq!(def.lines[1].index, 1);
        assert_eq!(def.lines[1].display_text(), "return x");
    }

    #[test]
    fn tags_are_stripped_and_set_roles() {
        let def = parse("a = 1\nb = 2 #distractor\n    c = 3 #paired");
        assert_eq!(def.lines[0].role, LineRole::Plain);
        assert_eq!(def.lines[1].role, LineRole::Distractor);
        assert_eq!(def.lines[1].raw_text, "b = 2");
        assert_eq!(def.lines[2].role, LineRole::Paired);
        assert_eq!(def.lines[2].raw_text, "    c = 3");
    }

    #[test]
    fn combined_line_takes_indentation_from_first_sub_line() {
        let def = parse("    for i in xs:\\n    print(i)");
        let line = &def.lines[0];
        assert!(line.is_combined);
        assert_eq!(line.indent_level, 1);
        assert_eq!(line.sub_lines.len(), 2);
        assert_eq!(
            line.absolute_lines(4),
            vec![(1, "for i in xs:".to_string()), (2, "print(i)".to_string())]
        );
        assert_eq!(def.expected_lines(), vec!["    for i in xs:", "        print(i)"]);
    }

    #[test]
    fn malformed_separator_degrades_to_plain_text() {
        let def = parse("print('a')\\n");
        let line = &def.lines[0];
        assert!(!line.is_combined);
        assert_eq!(line.display_text(), "print('a')\\n");
    }

    #[test]
    fn absolute_lines_round_trip_through_records() {
        let lines = vec![(1, "if x:".to_string()), (2, "y = 1".to_string())];
        let record =
            LineRecord::from_absolute_lines(3, &lines, LineRole::Plain, 4).expect("expressible");
        assert_eq!(record.raw_text, "    if x:\\n    y = 1");
        assert_eq!(record.absolute_lines(4), lines);

        let dedent = vec![(2, "y = 1".to_string()), (1, "z = 2".to_string())];
        assert!(LineRecord::from_absolute_lines(0, &dedent, LineRole::Plain, 4).is_none());
    }

    #[test]
    fn max_wrong_lines_limits_visible_distractors() {
        let options = ProblemOptions::builder().max_wrong_lines(1).build();
        let def = ProblemDefinition::parse("a\nb #distractor\nc #distractor\nd", options);
        let visible: Vec<_> = def.visible_lines().iter().map(|l| l.index).collect();
        assert_eq!(visible, vec![0, 1, 3]);
    }

    #[test]
    fn to_source_keeps_tags() {
        let source = "a = 1\nb = 2 #distractor\na = 2 #paired";
        assert_eq!(parse(source).to_source(), source);
    }
}
