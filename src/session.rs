#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! One learner working on one problem: the definition, its arrangement and
//! the adaptive state, behind the operations a host UI calls.

use serde::{Deserialize, Serialize};

use crate::{
    adaptive::{Adaptation, AdaptiveController, AdaptiveState, HelpPhase},
    arrangement::{ArrangementStore, Area, BatchMove, Block, CombineResult, MoveOutcome, SplitResult},
    config::EngineConfig,
    error::{Outcome, ProblemError},
    indentation::{IndentationHint, diff},
    pairing::{PairGroup, identify_pairs},
    parser::ProblemDefinition,
    problem::ProblemFile,
    validator::{ValidationReport, validate},
};

/// Everything needed to rebuild a [`Session`]. Plain data; storing it is the
/// caller's business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// The problem as loaded, after pairing.
    pub original:   ProblemDefinition,
    /// The problem after any adaptations.
    pub working:    ProblemDefinition,
    /// The arrangement areas.
    pub store:      ArrangementStore,
    /// Counters and help state.
    pub controller: AdaptiveController,
    /// Seed used whenever blocks are regenerated.
    pub seed:       u64,
}

/// A problem being solved.
#[derive(Debug, Clone)]
pub struct Session {
    /// The problem as loaded, after pairing.
    original:   ProblemDefinition,
    /// The problem after any adaptations.
    working:    ProblemDefinition,
    /// The arrangement areas.
    store:      ArrangementStore,
    /// Counters and help state.
    controller: AdaptiveController,
    /// Groups found by the last pairing run.
    groups:     Vec<PairGroup>,
    /// Seed used whenever blocks are regenerated.
    seed:       u64,
}

impl Session {
    /// Loads a problem: pairs distractors and lays out fresh blocks. The
    /// shuffle seed comes from the problem options or, failing that, is
    /// random.
    pub fn load(mut definition: ProblemDefinition, config: EngineConfig) -> Self {
        let groups = identify_pairs(&mut definition);
        let seed = definition
            .options
            .shuffle_seed
            .unwrap_or_else(rand::random);
        let store = ArrangementStore::from_definition(&definition, seed);

        tracing::info!(
            "Loaded problem with {} lines and {} paired groups",
            definition.lines.len(),
            groups.len()
        );
        Self {
            original: definition.clone(),
            working: definition,
            store,
            controller: AdaptiveController::new(config),
            groups,
            seed,
        }
    }

    /// Loads a problem file.
    pub fn from_problem(problem: &ProblemFile, config: EngineConfig) -> Self {
        Self::load(problem.definition(), config)
    }

    /// Returns the current (possibly adapted) problem definition.
    pub fn definition(&self) -> &ProblemDefinition {
        &self.working
    }

    /// Returns the problem as originally loaded.
    pub fn original(&self) -> &ProblemDefinition {
        &self.original
    }

    /// Returns the arrangement areas.
    pub fn store(&self) -> &ArrangementStore {
        &self.store
    }

    /// Returns the paired groups of the current definition.
    pub fn groups(&self) -> &[PairGroup] {
        &self.groups
    }

    /// Returns the adaptive counters.
    pub fn state(&self) -> AdaptiveState {
        self.controller.state()
    }

    /// Returns the help phase.
    pub fn phase(&self) -> HelpPhase {
        self.controller.phase()
    }

    /// Moves one block. See [`ArrangementStore::move_block`].
    pub fn move_block(
        &mut self,
        id: &str,
        from: Area,
        to: Area,
        insert_index: Option<usize>,
    ) -> Outcome<MoveOutcome> {
        self.store.move_block(id, from, to, insert_index)
    }

    /// Moves several blocks. See [`ArrangementStore::move_many`].
    pub fn move_many(&mut self, ids: &[&str], from: Area, to: Area) -> Outcome<BatchMove> {
        self.store.move_many(ids, from, to)
    }

    /// Combines blocks. See [`ArrangementStore::combine`].
    pub fn combine(&mut self, ids: &[&str], target: Area) -> Outcome<CombineResult> {
        self.store.combine(ids, target)
    }

    /// Splits a combined block. See [`ArrangementStore::split`].
    pub fn split(&mut self, id: &str) -> Outcome<SplitResult> {
        self.store.split(id)
    }

    /// Sets a block's indentation, unless indentation is provided.
    pub fn set_indentation(&mut self, id: &str, level: usize) -> Outcome<Block> {
        self.store.set_indentation(id, level)
    }

    /// Checks the solution area. Has no effect on the adaptive state.
    pub fn validate(&self) -> ValidationReport {
        validate(self.store.solution(), &self.working)
    }

    /// Indentation hints for the solution area as it is now.
    pub fn indentation_hints(&self) -> Vec<IndentationHint> {
        diff(
            &self.store.solution_lines(),
            &self.working.expected_lines(),
            self.working.indent_unit(),
        )
    }

    /// Records an attempt and returns whether help is now available.
    pub fn report_attempt(&mut self, is_correct: bool) -> bool {
        self.controller.report_attempt(is_correct)
    }

    /// Validates the solution and records the result as an attempt.
    pub fn submit(&mut self) -> ValidationReport {
        let report = self.validate();
        self.controller.report_attempt(report.is_correct);
        report
    }

    /// Whether help may be requested.
    pub fn is_help_eligible(&self) -> bool {
        self.controller.is_eligible()
    }

    /// Applies the next adaptation, regenerating the definition and replacing
    /// every block. Counters are kept.
    pub fn request_help(&mut self) -> Outcome<Adaptation> {
        match self.controller.request_help(&self.working) {
            Outcome::Applied(applied) => {
                self.working = applied.definition;
                self.groups = identify_pairs(&mut self.working);
                self.store = ArrangementStore::from_definition(&self.working, self.seed);
                Outcome::Applied(applied.kind)
            }
            Outcome::NotApplied(reason) => Outcome::NotApplied(reason),
        }
    }

    /// Returns to the problem as loaded, with fresh blocks and zeroed
    /// counters.
    pub fn reset_to_original(&mut self) {
        self.working = self.original.clone();
        self.groups = identify_pairs(&mut self.working);
        self.store = ArrangementStore::from_definition(&self.working, self.seed);
        self.controller.reset();
        tracing::info!("Reset to the original problem");
    }

    /// Captures the session as plain data.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            original:   self.original.clone(),
            working:    self.working.clone(),
            store:      self.store.clone(),
            controller: self.controller.clone(),
            seed:       self.seed,
        }
    }

    /// Rebuilds a session from a snapshot, refusing one whose arrangement is
    /// inconsistent.
    pub fn restore(snapshot: SessionSnapshot) -> Result<Self, ProblemError> {
        snapshot.store.check_invariants()?;

        let SessionSnapshot {
            original,
            mut working,
            store,
            controller,
            seed,
        } = snapshot;
        let groups = identify_pairs(&mut working);

        Ok(Self {
            original,
            working,
            store,
            controller,
            groups,
            seed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ProblemOptions, error::NotApplied};

    fn session(source: &str) -> Session {
        let options = ProblemOptions::builder().shuffle_seed(11).build();
        Session::load(ProblemDefinition::parse(source, options), EngineConfig::default())
    }

    #[test]
    fn solving_in_order_is_correct() {
        let mut session = session("def f():\n    return 1\nreturn 2 #distractor");
        session
            .move_block("block-0", Area::Pool, Area::Solution, None)
            .applied()
            .expect("moved");
        session
            .move_block("block-1", Area::Pool, Area::Solution, None)
            .applied()
            .expect("moved");
        session
            .set_indentation("block-1", 1)
            .applied()
            .expect("indented");

        let report = session.submit();
        assert!(report.is_correct, "{report:?}");
        assert!(session.indentation_hints().is_empty());
        assert_eq!(session.state().attempts, 1);
        assert_eq!(session.state().incorrect_attempts, 0);
    }

    #[test]
    fn validation_does_not_count_as_an_attempt() {
        let session = session("a = 1\nb = 2");
        let report = session.validate();
        assert!(!report.is_correct);
        assert_eq!(report.score, 0.0);
        assert_eq!(session.state().attempts, 0);
    }

    #[test]
    fn help_regenerates_blocks_but_keeps_counters() {
        let mut session = session("a = 1\nb = 2\nc = 3\nzz = 9 #distractor");
        session
            .move_block("block-0", Area::Pool, Area::Solution, None)
            .applied()
            .expect("moved");
        assert!(matches!(
            session.request_help().reason(),
            Some(NotApplied::NotEligible { .. })
        ));

        session.submit();
        session.submit();
        assert!(session.is_help_eligible());

        assert_eq!(session.request_help().applied(), Some(Adaptation::RemoveDistractors));
        assert_eq!(session.store().pool().len(), 3);
        assert!(session.store().solution().is_empty());
        assert_eq!(session.state().incorrect_attempts, 2);
        assert_eq!(session.phase(), HelpPhase::HelpApplied);

        assert_eq!(session.request_help().applied(), Some(Adaptation::RevealIndentation));
        assert!(session.store().indentation_locked());
        assert_eq!(
            session.set_indentation("block-0", 2).reason(),
            Some(&NotApplied::IndentationLocked)
        );

        session.reset_to_original();
        assert_eq!(session.state(), AdaptiveState::default());
        assert_eq!(session.store().pool().len(), 4);
        assert!(!session.store().indentation_locked());
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let mut session = session("x = 1\nx = 2 #distractor\ny = 3");
        session
            .move_block("block-0", Area::Pool, Area::Solution, None)
            .applied()
            .expect("moved");
        session.report_attempt(false);

        let json = serde_json::to_string(&session.snapshot()).expect("serialize");
        let snapshot: SessionSnapshot = serde_json::from_str(&json).expect("deserialize");
        let restored = Session::restore(snapshot).expect("consistent snapshot");

        assert_eq!(restored.store(), session.store());
        assert_eq!(restored.state(), session.state());
        assert_eq!(restored.groups().len(), 1);
    }
}
