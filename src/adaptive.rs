#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Tracks attempts and simplifies the problem when a learner keeps failing.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    combiner::combine_blocks,
    config::EngineConfig,
    error::{NotApplied, Outcome},
    pairing::identify_pairs,
    parser::{LineRole, ProblemDefinition},
};

/// Attempt and adaptation counters. They only grow, except on an explicit
/// reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdaptiveState {
    /// Every reported attempt.
    pub attempts:                u32,
    /// Reported attempts that were wrong.
    pub incorrect_attempts:      u32,
    /// Line merges performed by adaptations.
    pub combined_blocks_applied: u32,
    /// Distractor lines removed by adaptations.
    pub distractors_removed:     u32,
}

/// Where the learner stands with respect to help.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HelpPhase {
    /// Not enough incorrect attempts yet.
    Idle,
    /// Help may be requested.
    EligibleForHelp,
    /// At least one adaptation has been applied since the last reset.
    HelpApplied,
}

/// One kind of simplification, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Adaptation {
    /// Merge adjacent solution lines into combined blocks.
    CombineBlocks,
    /// Drop every remaining distractor line.
    RemoveDistractors,
    /// Provide indentation and snap every block to its expected level.
    RevealIndentation,
}

impl Adaptation {
    /// Adaptations in the order they are tried.
    pub const PRIORITY: [Adaptation; 3] = [
        Adaptation::CombineBlocks,
        Adaptation::RemoveDistractors,
        Adaptation::RevealIndentation,
    ];

    /// Whether this adaptation can do anything for `definition`.
    pub fn is_applicable(self, definition: &ProblemDefinition, config: &EngineConfig) -> bool {
        match self {
            Adaptation::CombineBlocks => {
                definition
                    .solution_lines()
                    .filter(|l| !l.is_combined)
                    .count()
                    >= config.min_combinable_lines
            }
            Adaptation::RemoveDistractors => definition
                .visible_lines()
                .into_iter()
                .any(|l| l.role.is_distractor()),
            Adaptation::RevealIndentation => !definition.indentation_provided,
        }
    }
}

impl Display for Adaptation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Adaptation::CombineBlocks => "combine blocks",
            Adaptation::RemoveDistractors => "remove distractors",
            Adaptation::RevealIndentation => "reveal indentation",
        };
        write!(f, "{text}")
    }
}

/// Returns the first applicable adaptation in priority order.
pub fn choose_adaptation(
    definition: &ProblemDefinition,
    config: &EngineConfig,
) -> Option<Adaptation> {
    Adaptation::PRIORITY
        .into_iter()
        .find(|a| a.is_applicable(definition, config))
}

/// An adaptation that took effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedAdaptation {
    /// Which adaptation was applied.
    pub kind:       Adaptation,
    /// The regenerated problem definition, re-paired.
    pub definition: ProblemDefinition,
    /// Line merges (for combine) or removed distractors (for removal).
    pub changed:    usize,
}

/// Applies one adaptation to `definition`, returning the regenerated
/// definition.
pub fn apply_adaptation(
    kind: Adaptation,
    definition: &ProblemDefinition,
    config: &EngineConfig,
) -> Outcome<AppliedAdaptation> {
    if !kind.is_applicable(definition, config) {
        return NotApplied::NoAdaptationAvailable.into();
    }

    let (mut regenerated, changed) = match kind {
        Adaptation::CombineBlocks => {
            match combine_blocks(definition, config.combine_per_adaptation, config) {
                Outcome::Applied(combined) => (combined.definition, combined.merges.len()),
                Outcome::NotApplied(reason) => return reason.into(),
            }
        }
        Adaptation::RemoveDistractors => {
            let removed = definition
                .visible_lines()
                .into_iter()
                .filter(|l| l.role.is_distractor())
                .count();
            let kept = definition
                .lines
                .iter()
                .filter(|l| l.role == LineRole::Plain)
                .cloned();
            (
                ProblemDefinition::from_records(
                    kept,
                    definition.options.clone(),
                    definition.indentation_provided,
                ),
                removed,
            )
        }
        Adaptation::RevealIndentation => {
            let mut revealed = definition.clone();
            revealed.indentation_provided = true;
            (revealed, 0)
        }
    };

    identify_pairs(&mut regenerated);
    Outcome::Applied(AppliedAdaptation {
        kind,
        definition: regenerated,
        changed,
    })
}

/// The adaptation state machine:
/// `Idle -> EligibleForHelp -> HelpApplied -> Idle (on reset)`.
///
/// Eligibility is a predicate over the counters, recomputed on every query.
/// Help is only ever applied on request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptiveController {
    /// Attempt and adaptation counters.
    state:        AdaptiveState,
    /// Whether an adaptation has been applied since the last reset.
    help_applied: bool,
    /// Thresholds and combiner settings.
    config:       EngineConfig,
}

impl AdaptiveController {
    /// Creates a controller with zeroed counters.
    pub fn new(config: EngineConfig) -> Self {
        Self {
            state: AdaptiveState::default(),
            help_applied: false,
            config,
        }
    }

    /// Returns the counters.
    pub fn state(&self) -> AdaptiveState {
        self.state
    }

    /// Returns the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether enough incorrect attempts have been made to ask for help.
    pub fn is_eligible(&self) -> bool {
        self.state.incorrect_attempts >= self.config.help_threshold
    }

    /// Returns the current phase.
    pub fn phase(&self) -> HelpPhase {
        if !self.is_eligible() {
            HelpPhase::Idle
        } else if self.help_applied {
            HelpPhase::HelpApplied
        } else {
            HelpPhase::EligibleForHelp
        }
    }

    /// Records an attempt and returns whether help is now available.
    pub fn report_attempt(&mut self, is_correct: bool) -> bool {
        self.state.attempts += 1;
        if !is_correct {
            self.state.incorrect_attempts += 1;
        }

        let eligible = self.is_eligible();
        tracing::debug!(
            "Attempt {} ({}), help eligible: {eligible}",
            self.state.attempts,
            if is_correct { "correct" } else { "incorrect" }
        );
        eligible
    }

    /// Applies the first adaptation, in priority order, that can change
    /// `definition`. Counters are updated but never reset here.
    pub fn request_help(&mut self, definition: &ProblemDefinition) -> Outcome<AppliedAdaptation> {
        if !self.is_eligible() {
            return NotApplied::NotEligible {
                incorrect: self.state.incorrect_attempts,
                threshold: self.config.help_threshold,
            }
            .into();
        }

        for kind in Adaptation::PRIORITY {
            if !kind.is_applicable(definition, &self.config) {
                continue;
            }

            match apply_adaptation(kind, definition, &self.config) {
                Outcome::Applied(applied) => {
                    let changed = u32::try_from(applied.changed).unwrap_or(u32::MAX);
                    match kind {
                        Adaptation::CombineBlocks => self.state.combined_blocks_applied += changed,
                        Adaptation::RemoveDistractors => self.state.distractors_removed += changed,
                        Adaptation::RevealIndentation => {}
                    }
                    self.help_applied = true;
                    tracing::info!("Applied adaptation: {kind}");
                    return Outcome::Applied(applied);
                }
                Outcome::NotApplied(reason) => {
                    tracing::debug!("Skipping {kind}: {reason}");
                }
            }
        }

        tracing::info!("No adaptation available");
        NotApplied::NoAdaptationAvailable.into()
    }

    /// Zeroes the counters and returns to `Idle`.
    pub fn reset(&mut self) {
        self.state = AdaptiveState::default();
        self.help_applied = false;
    }
}
