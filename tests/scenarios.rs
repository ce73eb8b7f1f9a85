use parsons::{
    Adaptation, Area, EngineConfig, LineRole, ProblemDefinition, ProblemOptions, Session,
    adaptive::choose_adaptation,
    indentation::diff,
    pairing::identify_pairs,
    similarity::related,
};

fn seeded(source: &str) -> Session {
    let options = ProblemOptions::builder().shuffle_seed(3).build();
    Session::load(ProblemDefinition::parse(source, options), EngineConfig::default())
}

#[test]
fn similarity_sanity() {
    assert!(related("if x > 5:", "if x < 5:"));
    assert!(!related("total = sum(nums)", "total = sum(nums)"));
    assert!(!related("print(a)", "while True:"));
}

#[test]
fn one_group_for_the_matching_distractor() {
    let mut def =
        ProblemDefinition::parse("a=1\nb=2 #distractor\na=2 #distractor", ProblemOptions::default());
    let groups = identify_pairs(&mut def);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].correct, 0);
    assert_eq!(groups[0].distractors, vec![2]);
    assert_eq!(def.lines[2].role, LineRole::Paired);
    assert_eq!(def.lines[1].role, LineRole::Distractor);
    assert_eq!(def.lines[1].group, None);
    assert!(def.to_source().ends_with("a=2 #paired"));
}

#[test]
fn one_hint_for_the_unindented_body() {
    let hints = diff(&["if x:", "y=1"], &["if x:", "    y=1"], 4);
    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].line_index, 1);
    assert_eq!(hints[0].current_indent, 0);
    assert_eq!(hints[0].expected_indent, 1);
    assert!(hints[0].message.contains("indented more"));
}

#[test]
fn hints_are_empty_for_identical_programs_and_symmetric_in_count() {
    let expected = ["def f():", "    if x:", "        return 1", "    return 0"];
    let current = ["def f():", "if x:", "    return 1", "    return 0"];
    assert!(diff(&expected, &expected, 4).is_empty());

    let forward = diff(&current, &expected, 4);
    let backward = diff(&expected, &current, 4);
    assert_eq!(forward.len(), backward.len());
    assert_ne!(forward[0].message, backward[0].message);
}

#[test]
fn combine_is_chosen_over_removing_distractors_after_two_failures() {
    let mut session = seeded("a = 1\nb = 2\nc = 3\nd = 4\ne = 5");
    assert!(!session.report_attempt(false));
    assert!(session.report_attempt(false));
    assert!(session.is_help_eligible());

    assert_eq!(
        choose_adaptation(session.definition(), &EngineConfig::default()),
        Some(Adaptation::CombineBlocks)
    );
    assert_eq!(session.request_help().applied(), Some(Adaptation::CombineBlocks));
    assert_eq!(session.definition().lines.len(), 4);
    assert_eq!(session.store().pool().len(), 4);
    assert_eq!(session.state().combined_blocks_applied, 1);
    assert_eq!(session.state().incorrect_attempts, 2);
}

#[test]
fn split_undoes_combine() {
    let mut session = seeded("if x:\n    y = 1\nz = 2");
    session
        .move_many(&["block-0", "block-1"], Area::Pool, Area::Solution)
        .applied()
        .expect("moved");
    session
        .set_indentation("block-1", 1)
        .applied()
        .expect("indented");
    let before: Vec<_> = session.store().solution().to_vec();

    session
        .combine(&["block-0", "block-1"], Area::Solution)
        .applied()
        .expect("combined");
    assert_eq!(session.store().solution().len(), 1);

    let split = session.split("block-0+1").applied().expect("split");
    assert_eq!(split.blocks.len(), 2);
    for restored in &split.blocks {
        let original = before
            .iter()
            .find(|b| b.id() == restored.id())
            .expect("restored block existed before");
        assert_eq!(restored.display_text().trim(), original.display_text().trim());
        assert_eq!(restored.indentation(), original.indentation());
    }
}

#[test]
fn reveal_indentation_snaps_blocks_to_expected_levels() {
    let mut session = seeded("def f():\n    return 1");
    session.report_attempt(false);
    session.report_attempt(false);

    assert_eq!(session.request_help().applied(), Some(Adaptation::RevealIndentation));
    for block in session.store().blocks() {
        assert_eq!(block.indentation(), block.expected_indent());
    }

    session
        .move_block("block-0", Area::Pool, Area::Solution, None)
        .applied()
        .expect("moved");
    session
        .move_block("block-1", Area::Pool, Area::Solution, None)
        .applied()
        .expect("moved");
    assert!(session.validate().is_correct);
}

#[test]
fn groups_follow_their_correct_line_through_combining() {
    let mut session = seeded("x = 1\ny = 2\nz = 3\nw = 4\nx = 5\nx = 2 #distractor");
    let before = &session.groups()[0];
    assert_eq!(session.definition().lines[before.correct].display_text(), "x = 1");

    session.report_attempt(false);
    session.report_attempt(false);
    assert_eq!(session.request_help().applied(), Some(Adaptation::CombineBlocks));

    let groups = session.groups().to_vec();
    assert_eq!(groups.len(), 1);
    let lines = &session.definition().lines;
    assert_eq!(lines[groups[0].correct].display_text(), "x = 1\ny = 2");
    assert_eq!(lines[groups[0].distractors[0]].display_text(), "x = 2");

    let group_of = |text: &str| {
        session
            .store()
            .blocks()
            .find(|b| b.display_text() == text)
            .and_then(|b| b.group_id())
    };
    assert!(group_of("x = 2").is_some());
    assert_eq!(group_of("x = 2"), group_of("x = 1\ny = 2"));
    assert_eq!(group_of("x = 5"), None);
}
