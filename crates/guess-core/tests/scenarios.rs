use guess_core::belief::{Answer, BeliefState, Regime, UpdateOutcome};
use guess_core::catalog::{Catalog, Identity};
use guess_core::game::BeliefSnapshot;
use guess_core::guess::{GuessPolicy, Verdict};
use guess_core::params::{GameParams, QuestionStrategy};
use guess_core::select::{QuestionSelector, SelectionPhase};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const TOLERANCE: f64 = 1e-9;

fn xyz_catalog() -> Catalog {
    Catalog::new(vec![
        Identity::new("X", [("a", true), ("b", false)]),
        Identity::new("Y", [("a", false), ("b", true)]),
        Identity::new("Z", [("a", true), ("b", true)]),
    ])
    .expect("catalog")
}

fn hard_only() -> GameParams {
    GameParams {
        soft_elimination_threshold: 0,
        ..GameParams::default()
    }
}

fn random_catalog(rng: &mut SmallRng, people: usize, attributes: usize) -> Catalog {
    let identities = (0..people)
        .map(|p| {
            let profile: Vec<(String, bool)> = (0..attributes)
                .map(|a| (format!("attr{a:02}"), rng.gen_bool(0.5)))
                .collect();
            Identity::new(format!("person{p:02}"), profile)
        })
        .collect();
    Catalog::new(identities).expect("catalog")
}

#[test]
fn hard_answer_keeps_only_matching_identities() {
    let catalog = xyz_catalog();
    let params = hard_only();
    let mut state = BeliefState::new(&catalog);

    let outcome = state
        .apply_answer(&catalog, &params, "a", Answer::Yes)
        .expect("known attribute");

    assert_eq!(outcome, UpdateOutcome::Updated);
    assert_eq!(state.regime(), Regime::Hard);
    assert!((state.probability("X") - 0.5).abs() < TOLERANCE);
    assert!((state.probability("Z") - 0.5).abs() < TOLERANCE);
    assert_eq!(state.probability("Y"), 0.0);
}

#[test]
fn soft_answer_down_weights_mismatch() {
    let catalog = xyz_catalog();
    let params = GameParams::default();
    let mut state = BeliefState::new(&catalog);

    state
        .apply_answer(&catalog, &params, "a", Answer::Yes)
        .expect("known attribute");

    assert_eq!(state.regime(), Regime::Soft);
    // Unnormalized mass is 1/3 + 0.4/3 + 1/3 = 2.4/3.
    assert!((state.probability("X") - 1.0 / 2.4).abs() < TOLERANCE);
    assert!((state.probability("Z") - 1.0 / 2.4).abs() < TOLERANCE);
    assert!((state.probability("Y") - 0.4 / 2.4).abs() < TOLERANCE);
    assert!((state.total_mass() - 1.0).abs() < TOLERANCE);
}

#[test]
fn indistinguishable_candidates_fall_back_to_first_unasked() {
    let catalog = Catalog::new(vec![
        Identity::new("X", [("a", true), ("b", true), ("c", false)]),
        Identity::new("Y", [("a", false), ("b", true), ("c", false)]),
    ])
    .expect("catalog");
    let params = GameParams::default();
    let mut state = BeliefState::new(&catalog);
    state
        .apply_answer(&catalog, &params, "a", Answer::Yes)
        .expect("known attribute");

    let selector = QuestionSelector::new(&catalog, &params);
    assert_eq!(
        selector.select(&state),
        Some(("b", SelectionPhase::LastResort))
    );
}

#[test]
fn single_live_candidate_falls_through_to_last_resort() {
    let catalog = Catalog::new(vec![
        Identity::new("X", [("a", true), ("b", false)]),
        Identity::new("Y", [("a", true), ("b", true)]),
    ])
    .expect("catalog");
    let params = GameParams::default();
    let snapshot = BeliefSnapshot {
        probabilities: [("X".to_string(), 1.0), ("Y".to_string(), 0.0)].into(),
        asked: Default::default(),
        question_count: 0,
    };
    let state = snapshot.restore(&catalog, &params).expect("restore");

    let selector = QuestionSelector::new(&catalog, &params);
    assert_eq!(
        selector.select(&state),
        Some(("a", SelectionPhase::LastResort))
    );
}

#[test]
fn certainty_threshold_is_inclusive() {
    let identities = ["X", "Y"]
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            Identity::new(
                name,
                (0..8).map(move |a| (format!("q{a}"), (a + i) % 2 == 0)),
            )
        })
        .collect();
    let catalog = Catalog::new(identities).expect("catalog");
    let params = GameParams::default();
    let snapshot = BeliefSnapshot {
        probabilities: [("X".to_string(), 0.85), ("Y".to_string(), 0.15)].into(),
        asked: ["q0", "q1", "q2"].map(String::from).into(),
        question_count: params.min_questions_before_guess,
    };
    let state = snapshot.restore(&catalog, &params).expect("restore");

    let verdict = GuessPolicy::new(&catalog, &params).evaluate(&state);
    assert_eq!(
        verdict,
        Verdict::Guess {
            name: "X".into(),
            confidence: 0.85,
            exhausted_questions: false,
        }
    );

    let earlier = BeliefSnapshot {
        question_count: params.min_questions_before_guess - 1,
        ..BeliefSnapshot::capture(&state)
    }
    .restore(&catalog, &params)
    .expect("restore");
    assert_eq!(
        GuessPolicy::new(&catalog, &params).evaluate(&earlier),
        Verdict::AskMore
    );
}

#[test]
fn conflicting_hard_answers_exhaust_the_state() {
    let catalog = xyz_catalog();
    let params = hard_only();
    let mut state = BeliefState::new(&catalog);

    let first = state
        .apply_answer(&catalog, &params, "a", Answer::No)
        .expect("known attribute");
    assert_eq!(first, UpdateOutcome::Updated);

    let second = state
        .apply_answer(&catalog, &params, "b", Answer::No)
        .expect("known attribute");
    assert_eq!(second, UpdateOutcome::Contradiction);
    assert!(state.is_exhausted());
    assert!(state.total_mass() < TOLERANCE);
    for probability in state.probabilities().values() {
        assert!(*probability < TOLERANCE);
    }
    assert_eq!(
        GuessPolicy::new(&catalog, &params).evaluate(&state),
        Verdict::NoMatch
    );
}

#[test]
fn successful_updates_stay_normalized() {
    let mut rng = SmallRng::seed_from_u64(42);
    for _ in 0..16 {
        let catalog = random_catalog(&mut rng, 12, 10);
        let params = GameParams::default();
        let mut state = BeliefState::new(&catalog);
        for _ in 0..10 {
            let attribute = catalog.attributes()[rng.gen_range(0..10)].clone();
            let answer = Answer::from(rng.gen_bool(0.5));
            match state
                .apply_answer(&catalog, &params, &attribute, answer)
                .expect("known attribute")
            {
                UpdateOutcome::Updated => {
                    assert!((state.total_mass() - 1.0).abs() < TOLERANCE);
                }
                UpdateOutcome::Contradiction => break,
            }
        }
    }
}

#[test]
fn hard_regime_zeroes_every_mismatch() {
    let mut rng = SmallRng::seed_from_u64(7);
    for _ in 0..16 {
        let catalog = random_catalog(&mut rng, 10, 8);
        let params = hard_only();
        let mut state = BeliefState::new(&catalog);
        for _ in 0..4 {
            let attribute = catalog.attributes()[rng.gen_range(0..8)].clone();
            let answer = Answer::from(rng.gen_bool(0.5));
            let before = state.clone();
            if state
                .apply_answer(&catalog, &params, &attribute, answer)
                .expect("known attribute")
                == UpdateOutcome::Contradiction
            {
                break;
            }
            for identity in catalog.identities() {
                let after = state.probability(identity.name());
                if !answer.matches(identity.has(&attribute)) {
                    assert_eq!(after, 0.0);
                }
                if before.probability(identity.name()) == 0.0 {
                    assert_eq!(after, 0.0);
                }
            }
        }
    }
}

#[test]
fn repeated_penalty_shrinks_share_and_keeps_normalization() {
    let catalog = xyz_catalog();
    let mut state = BeliefState::new(&catalog);
    let mut previous = state.probability("Z");
    for _ in 0..2 {
        assert!(state.penalize_wrong_guess("Z", 0.01));
        assert!((state.total_mass() - 1.0).abs() < TOLERANCE);
        let share = state.probability("Z");
        assert!(share < previous);
        previous = share;
    }
    assert!(!state.penalize_wrong_guess("W", 0.01));
}

#[test]
fn selector_returns_nothing_once_everyone_is_eliminated() {
    let catalog = xyz_catalog();
    let params = hard_only();
    let mut state = BeliefState::new(&catalog);
    state
        .apply_answer(&catalog, &params, "a", Answer::No)
        .expect("known attribute");
    state
        .apply_answer(&catalog, &params, "b", Answer::No)
        .expect("known attribute");

    // Clear the asked set so only exhaustion can stop selection.
    let fresh = BeliefSnapshot {
        asked: Default::default(),
        ..BeliefSnapshot::capture(&state)
    }
    .restore(&catalog, &params)
    .expect("restore");
    assert_eq!(
        QuestionSelector::new(&catalog, &params).next_question(&fresh),
        None
    );
}

#[test]
fn sampled_pool_without_discriminator_uses_fallback_scan() {
    let identities = (0..3)
        .map(|p| {
            let mut profile: Vec<(String, bool)> =
                (0..11).map(|a| (format!("a{a:02}"), true)).collect();
            profile.push(("z_split".to_string(), p == 0));
            Identity::new(format!("P{p}"), profile)
        })
        .collect();
    let catalog = Catalog::new(identities).expect("catalog");
    let state = BeliefState::new(&catalog);

    let mut phases = Vec::new();
    for seed in 0..64 {
        let params = GameParams {
            strategy: QuestionStrategy::EntropySampled,
            attribute_sample_ratio: 0.1,
            min_attributes_to_sample: 1,
            sample_seed: seed,
            ..GameParams::default()
        };
        let (attribute, phase) = QuestionSelector::new(&catalog, &params)
            .select(&state)
            .expect("unasked attributes remain");
        assert_eq!(attribute, "z_split", "seed {seed}");
        phases.push(phase);
    }

    // Two of twelve attributes are sampled, so most seeds miss the only useful one.
    assert!(phases.contains(&SelectionPhase::Fallback));
    assert!(phases.contains(&SelectionPhase::Global));
    assert!(
        phases
            .iter()
            .all(|phase| matches!(phase, SelectionPhase::Global | SelectionPhase::Fallback))
    );
}

#[test]
fn focus_only_weighs_the_top_k_candidates() {
    // A and B lead; "s" separates them while "h" halves the whole field.
    let catalog = Catalog::new(vec![
        Identity::new("A", [("same", true), ("s", true), ("h", false)]),
        Identity::new("B", [("same", true), ("s", false), ("h", false)]),
        Identity::new("C", [("same", true), ("s", false), ("h", true)]),
        Identity::new("D", [("same", true), ("s", false), ("h", true)]),
        Identity::new("E", [("same", true), ("s", false), ("h", true)]),
        Identity::new("F", [("same", true), ("s", false), ("h", false)]),
    ])
    .expect("catalog");
    let restore = |question_count: u32, params: &GameParams| {
        BeliefSnapshot {
            probabilities: [
                ("A", 0.2),
                ("B", 0.2),
                ("C", 0.15),
                ("D", 0.15),
                ("E", 0.15),
                ("F", 0.15),
            ]
            .into_iter()
            .map(|(name, p)| (name.to_string(), p))
            .collect(),
            asked: ["same".to_string()].into(),
            question_count,
        }
        .restore(&catalog, params)
        .expect("restore")
    };

    let narrow = GameParams {
        top_k_focus: 2,
        ..GameParams::default()
    };
    let wide = GameParams {
        top_k_focus: 6,
        ..GameParams::default()
    };
    let late = narrow.soft_elimination_threshold + 1;

    assert_eq!(
        QuestionSelector::new(&catalog, &narrow).select(&restore(late, &narrow)),
        Some(("s", SelectionPhase::Focus))
    );
    assert_eq!(
        QuestionSelector::new(&catalog, &wide).select(&restore(late, &wide)),
        Some(("h", SelectionPhase::Focus))
    );
    assert_eq!(
        QuestionSelector::new(&catalog, &narrow).select(&restore(1, &narrow)),
        Some(("h", SelectionPhase::Global))
    );
}
