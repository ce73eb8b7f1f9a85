#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::{Arc, Mutex, OnceLock};

use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_COMBINE_PER_ADAPTATION, DEFAULT_HELP_THRESHOLD, DEFAULT_INDENT_UNIT,
    MIN_COMBINABLE_LINES, SHORT_LINE_LIMIT,
};

/// Per-problem options travelling with the problem definition.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProblemOptions {
    /// Whitespace characters per indentation level.
    #[builder(default = DEFAULT_INDENT_UNIT)]
    pub indent_unit:         usize,
    /// Whether the learner sets indentation. When false, indentation is
    /// provided and locked.
    #[builder(default = true)]
    #[serde(alias = "can_indent")]
    pub allow_manual_indent: bool,
    /// Maximum number of distractor lines shown; `None` shows all of them.
    #[serde(alias = "max_wrong_lines")]
    pub max_wrong_lines:     Option<usize>,
    /// Whether blocks start in the pool and may be discarded, rather than
    /// starting in the solution area for reordering only.
    #[builder(default = true)]
    pub discard_workflow:    bool,
    /// Seed for the initial shuffle; `None` picks one at load time.
    pub shuffle_seed:        Option<u64>,
}

impl Default for ProblemOptions {
    fn default() -> Self {
        Self {
            indent_unit:         DEFAULT_INDENT_UNIT,
            allow_manual_indent: true,
            max_wrong_lines:     None,
            discard_workflow:    true,
            shuffle_seed:        None,
        }
    }
}

impl ProblemOptions {
    /// Returns the indentation unit, never less than one character.
    pub fn indent_unit(&self) -> usize {
        self.indent_unit.max(1)
    }
}

/// Tunables for the adaptive controller and the block combiner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Incorrect attempts after which help becomes available.
    #[builder(default = DEFAULT_HELP_THRESHOLD)]
    pub help_threshold:         u32,
    /// Adjacent-line merges performed per "combine blocks" adaptation.
    #[builder(default = DEFAULT_COMBINE_PER_ADAPTATION)]
    pub combine_per_adaptation: usize,
    /// Combining stops once fewer solution lines than this remain.
    #[builder(default = MIN_COMBINABLE_LINES)]
    pub min_combinable_lines:   usize,
    /// Merged lines shorter than this score a bonus.
    #[builder(default = SHORT_LINE_LIMIT)]
    pub short_line_limit:       usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            help_threshold:         DEFAULT_HELP_THRESHOLD,
            combine_per_adaptation: DEFAULT_COMBINE_PER_ADAPTATION,
            min_combinable_lines:   MIN_COMBINABLE_LINES,
            short_line_limit:       SHORT_LINE_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Construct a configuration from `PARSONS_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            help_threshold:         read_env_or("PARSONS_HELP_THRESHOLD", defaults.help_threshold),
            combine_per_adaptation: read_env_or(
                "PARSONS_COMBINE_PER_ADAPTATION",
                defaults.combine_per_adaptation,
            )
            .max(1),
            min_combinable_lines:   read_env_or(
                "PARSONS_MIN_COMBINABLE_LINES",
                defaults.min_combinable_lines,
            ),
            short_line_limit:       read_env_or(
                "PARSONS_SHORT_LINE_LIMIT",
                defaults.short_line_limit,
            ),
        }
    }
}

/// Reads and parses an environment variable, returning `default` when the
/// variable is missing or malformed.
fn read_env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring malformed {name}={raw:?}; using default");
                default
            }
        },
        Err(_) => default,
    }
}

/// Global storage for the lazily constructed configuration.
static CONFIG_SLOT: OnceLock<Mutex<Option<Arc<EngineConfig>>>> = OnceLock::new();

/// Returns the mutex guarding the global configuration slot.
fn slot() -> &'static Mutex<Option<Arc<EngineConfig>>> {
    CONFIG_SLOT.get_or_init(|| Mutex::new(None))
}

/// Returns the active configuration, reading the environment on first use.
pub fn get() -> EngineConfig {
    let mut guard = slot().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(cfg) = guard.as_ref() {
        return **cfg;
    }

    let cfg = Arc::new(EngineConfig::from_env());
    *guard = Some(Arc::clone(&cfg));
    *cfg
}

/// Replaces the global configuration, e.g. after parsing CLI flags.
pub fn set(config: EngineConfig) {
    let mut guard = slot().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(Arc::new(config));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_deserialize_from_legacy_keys() {
        let options: ProblemOptions =
            serde_json::from_str(r#"{"can_indent": false, "max_wrong_lines": 3, "x_indent": 50}"#)
                .expect("parse options");

        assert!(!options.allow_manual_indent);
        assert_eq!(options.max_wrong_lines, Some(3));
        assert_eq!(options.indent_unit, DEFAULT_INDENT_UNIT);
        assert!(options.discard_workflow);
    }

    #[test]
    fn builder_defaults_match_default_impl() {
        assert_eq!(ProblemOptions::builder().build(), ProblemOptions::default());
        assert_eq!(EngineConfig::builder().build(), EngineConfig::default());
    }

    #[test]
    fn zero_indent_unit_is_clamped() {
        let options = ProblemOptions::builder().indent_unit(0).build();
        assert_eq!(options.indent_unit(), 1);
    }

    #[test]
    fn set_replaces_the_global_config() {
        let custom = EngineConfig::builder().min_combinable_lines(2).build();
        set(custom);
        assert_eq!(get(), custom);
    }
}
