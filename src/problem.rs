#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Problem files: JSON documents carrying a tagged definition and its
//! options.

use std::path::Path;

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::{config::ProblemOptions, error::ProblemError, parser::ProblemDefinition};

/// The part of a problem file the engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct ParsonsSettings {
    /// The line-tagged definition text.
    pub initial: String,
    /// Options for this problem.
    #[serde(default)]
    #[builder(default)]
    pub options: ProblemOptions,
}

/// A problem as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemFile {
    /// Identifier of the problem.
    #[builder(into)]
    pub id:               String,
    /// Title shown to the learner.
    #[serde(default)]
    #[builder(into, default)]
    pub title:            String,
    /// Task description.
    #[serde(default)]
    #[builder(into, default)]
    pub description:      String,
    /// Free-form difficulty label.
    #[serde(default)]
    pub difficulty:       Option<String>,
    /// Topic tags.
    #[serde(default)]
    #[builder(default)]
    pub tags:             Vec<String>,
    /// Definition and options.
    pub parsons_settings: ParsonsSettings,
}

impl ProblemFile {
    /// Reads and parses a problem file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProblemError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let raw = std::fs::read_to_string(path).map_err(|source| ProblemError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&raw).map_err(|source| ProblemError::Json {
            path: display,
            source,
        })
    }

    /// Parses a problem from JSON text.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Parses the definition text with the file's options.
    pub fn definition(&self) -> ProblemDefinition {
        ProblemDefinition::parse(
            &self.parsons_settings.initial,
            self.parsons_settings.options.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_problem_with_legacy_options() {
        let raw = r#"{
            "id": "p1",
            "title": "Sum",
            "tags": ["loops"],
            "parsonsSettings": {
                "initial": "total = 0\nfor x in xs:\n    total += x\ntotal = 1 #distractor",
                "options": { "can_indent": true, "max_wrong_lines": 1, "sortableId": "sortable" }
            }
        }"#;
        let problem = ProblemFile::from_json(raw).expect("valid problem");
        assert_eq!(problem.id, "p1");
        assert!(problem.description.is_empty());
        assert_eq!(problem.parsons_settings.options.max_wrong_lines, Some(1));

        let def = problem.definition();
        assert_eq!(def.lines.len(), 4);
        assert_eq!(def.distractor_lines().count(), 1);
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = ProblemFile::load("does/not/exist.json").expect_err("missing file");
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
