#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use serde::{Deserialize, Serialize};

use crate::{
    indentation::indent_level,
    pairing::group_color,
    parser::LineRecord,
};

/// The unit a learner drags around: one or more source lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Stable, opaque identifier, unique across all areas.
    pub(crate) id:              String,
    /// Trimmed text shown to the learner; sub-lines joined by newlines.
    pub(crate) display_text:    String,
    /// Current indentation level.
    pub(crate) indentation:     usize,
    /// Indentation level the block's sub-lines were recorded against.
    pub(crate) anchor_indent:   usize,
    /// Indentation level the block has in the expected program.
    pub(crate) expected_indent: usize,
    /// Whether the block contains a line that does not belong in the solution.
    pub(crate) is_distractor:   bool,
    /// Paired group shared with near-duplicate lines.
    pub(crate) group_id:        Option<usize>,
    /// Display colour of the group.
    pub(crate) group_color:     Option<String>,
    /// Whether the block holds several lines.
    pub(crate) is_combined:     bool,
    /// Sub-lines with their absolute indentation written out as spaces.
    pub(crate) sub_lines:       Vec<String>,
    /// Lowest line index among the lines this block holds.
    pub(crate) original_index:  usize,
    /// Line record indices this block holds.
    pub(crate) lines:           Vec<usize>,
    /// Blocks merged into this one by the learner, in sub-line order. Empty
    /// for blocks that came straight from the problem definition.
    pub(crate) parts:           Vec<Block>,
}

impl Block {
    /// Builds the block for one line record.
    ///
    /// * `indentation`: the starting indentation (0 for learner-controlled
    ///   indentation, the expected level when indentation is provided).
    pub fn from_record(record: &LineRecord, indentation: usize, indent_unit: usize) -> Self {
        let sub_lines = if record.is_combined {
            record
                .absolute_lines(indent_unit)
                .into_iter()
                .map(|(level, text)| format!("{}{}", " ".repeat(level * indent_unit), text))
                .collect()
        } else {
            Vec::new()
        };

        Self {
            id: format!("block-{}", record.index),
            display_text: record.display_text(),
            indentation,
            anchor_indent: record.indent_level,
            expected_indent: record.indent_level,
            is_distractor: record.role.is_distractor(),
            group_id: record.group,
            group_color: record.group.map(|g| group_color(g).to_string()),
            is_combined: record.is_combined,
            sub_lines,
            original_index: record.index,
            lines: vec![record.index],
            parts: Vec::new(),
        }
    }

    /// Returns the block id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the text shown to the learner.
    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    /// Returns the current indentation level.
    pub fn indentation(&self) -> usize {
        self.indentation
    }

    /// Returns the expected indentation level.
    pub fn expected_indent(&self) -> usize {
        self.expected_indent
    }

    /// Returns true if the block holds a distractor line.
    pub fn is_distractor(&self) -> bool {
        self.is_distractor
    }

    /// Returns the paired group id, if any.
    pub fn group_id(&self) -> Option<usize> {
        self.group_id
    }

    /// Returns the group colour, if any.
    pub fn group_color(&self) -> Option<&str> {
        self.group_color.as_deref()
    }

    /// Returns true for combined blocks.
    pub fn is_combined(&self) -> bool {
        self.is_combined
    }

    /// Returns the stored sub-lines.
    pub fn sub_lines(&self) -> &[String] {
        &self.sub_lines
    }

    /// Returns the lowest line index held by this block.
    pub fn original_index(&self) -> usize {
        self.original_index
    }

    /// Returns the line record indices held by this block.
    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    /// Returns true if the block was merged by the learner and can be split.
    pub fn is_splittable(&self) -> bool {
        !self.parts.is_empty()
    }

    /// Renders the block at its current indentation, one string per physical
    /// line. Sub-lines keep their offset from the anchor indentation.
    pub fn render(&self, indent_unit: usize) -> Vec<String> {
        if !self.is_combined {
            return vec![format!(
                "{}{}",
                " ".repeat(self.indentation * indent_unit),
                self.display_text
            )];
        }

        self.sub_lines
            .iter()
            .map(|sub| {
                let level = (indent_level(sub, indent_unit) + self.indentation)
                    .saturating_sub(self.anchor_indent);
                format!("{}{}", " ".repeat(level * indent_unit), sub.trim())
            })
            .collect()
    }

    /// Number of physical lines the block renders to.
    pub fn line_count(&self) -> usize {
        if self.is_combined { self.sub_lines.len() } else { 1 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LineRole;

    #[test]
    fn combined_record_renders_relative_to_current_indentation() {
        let record = LineRecord::parse(2, "    for x in xs:\\n    print(x)", 4);
        let mut block = Block::from_record(&record, 1, 4);
        assert_eq!(block.id(), "block-2");
        assert_eq!(block.render(4), vec!["    for x in xs:", "        print(x)"]);

        block.indentation = 0;
        assert_eq!(block.render(4), vec!["for x in xs:", "    print(x)"]);
        assert_eq!(block.line_count(), 2);
        assert!(!block.is_splittable());
    }

    #[test]
    fn distractor_record_is_flagged() {
        let mut record = LineRecord::parse(0, "x = 2 #paired", 4);
        record.group = Some(3);
        let block = Block::from_record(&record, 0, 4);
        assert_eq!(record.role, LineRole::Paired);
        assert!(block.is_distractor());
        assert_eq!(block.group_id(), Some(3));
        assert_eq!(block.group_color(), Some(group_color(3)));
    }
}
