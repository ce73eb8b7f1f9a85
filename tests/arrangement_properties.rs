use std::collections::HashSet;

use parsons::{ArrangementStore, Area, ProblemDefinition, ProblemOptions, pairing::identify_pairs};
use proptest::prelude::*;

const SOURCE: &str = "def total(xs):\n    s = 0\n    for x in xs:\n        s += x\n    return s\n    \
                      return x #distractor\n    s = 1 #distractor\nprint(xs) #distractor\n    for y \
                      in xs: #distractor";

#[derive(Debug, Clone)]
enum Op {
    Move(usize, usize, Option<usize>),
    MoveMany(Vec<usize>, usize),
    Combine(Vec<usize>, usize),
    Split(usize),
    Indent(usize, usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), 0..3usize, proptest::option::of(0..12usize))
            .prop_map(|(b, to, at)| Op::Move(b, to, at)),
        (proptest::collection::vec(any::<usize>(), 1..5), 0..3usize)
            .prop_map(|(bs, to)| Op::MoveMany(bs, to)),
        (proptest::collection::vec(any::<usize>(), 0..4), 0..3usize)
            .prop_map(|(bs, to)| Op::Combine(bs, to)),
        any::<usize>().prop_map(Op::Split),
        (any::<usize>(), 0..4usize).prop_map(|(b, level)| Op::Indent(b, level)),
    ]
}

fn store(seed: u64) -> ArrangementStore {
    let mut def = ProblemDefinition::parse(SOURCE, ProblemOptions::default());
    identify_pairs(&mut def);
    ArrangementStore::from_definition(&def, seed)
}

fn ids(store: &ArrangementStore) -> Vec<String> {
    store.blocks().map(|b| b.id().to_string()).collect()
}

fn pick(ids: &[String], n: usize) -> String {
    ids[n % ids.len()].clone()
}

fn lines(store: &ArrangementStore) -> Vec<usize> {
    let mut lines: Vec<usize> = store.blocks().flat_map(|b| b.lines().to_vec()).collect();
    lines.sort_unstable();
    lines
}

fn apply(store: &mut ArrangementStore, op: &Op) {
    let all = ids(store);
    match op {
        Op::Move(b, to, at) => {
            let id = pick(&all, *b);
            if let Some((from, _)) = store.locate(&id) {
                store.move_block(&id, from, Area::ALL[*to], *at);
            }
        }
        Op::MoveMany(bs, to) => {
            let chosen: Vec<String> = bs.iter().map(|b| pick(&all, *b)).collect();
            if let Some((from, _)) = store.locate(&chosen[0]) {
                let refs: Vec<&str> = chosen.iter().map(String::as_str).collect();
                store.move_many(&refs, from, Area::ALL[*to]);
            }
        }
        Op::Combine(bs, to) => {
            let chosen: Vec<String> = bs.iter().map(|b| pick(&all, *b)).collect();
            let refs: Vec<&str> = chosen.iter().map(String::as_str).collect();
            store.combine(&refs, Area::ALL[*to]);
        }
        Op::Split(b) => {
            store.split(&pick(&all, *b));
        }
        Op::Indent(b, level) => {
            store.set_indentation(&pick(&all, *b), *level);
        }
    }
}

proptest! {
    #[test]
    fn line_records_are_conserved(seed in any::<u64>(), ops in proptest::collection::vec(op(), 0..40)) {
        let mut store = store(seed);
        let initial = lines(&store);

        for op in &ops {
            apply(&mut store, op);
            prop_assert_eq!(lines(&store), initial.clone());
            prop_assert!(store.check_invariants().is_ok());
        }
    }

    #[test]
    fn solution_holds_at_most_one_member_per_group(
        seed in any::<u64>(),
        ops in proptest::collection::vec(op(), 0..40),
    ) {
        let mut store = store(seed);

        for op in &ops {
            apply(&mut store, op);
            let mut groups = HashSet::new();
            for group in store.solution().iter().filter_map(|b| b.group_id()) {
                prop_assert!(groups.insert(group), "group {} placed twice", group);
            }
        }
    }

    #[test]
    fn every_block_lives_in_exactly_one_area(
        seed in any::<u64>(),
        ops in proptest::collection::vec(op(), 0..40),
    ) {
        let mut store = store(seed);

        for op in &ops {
            apply(&mut store, op);
            let all = ids(&store);
            let unique: HashSet<&String> = all.iter().collect();
            prop_assert_eq!(unique.len(), all.len());
        }
    }
}
