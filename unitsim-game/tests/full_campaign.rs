use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::BTreeMap;
use unitsim_game::{
    AdjustOp, Adjustment, BaseField, Department, Effect, Ending, GameSession, Initiative,
    InitiativeCatalog, Ruleset, RulesetProfile, TurnError,
};

fn uniform_catalog(effect: Effect) -> InitiativeCatalog {
    let initiative = Initiative {
        title: "Fixture".to_string(),
        description: String::new(),
        base_success_chance: 1.0,
        effect,
        partial_effect: None,
        risk: None,
    };
    let departments: BTreeMap<Department, Vec<Initiative>> = Department::ALL
        .into_iter()
        .map(|department| (department, vec![initiative.clone()]))
        .collect();
    InitiativeCatalog { departments }
}

fn set_field(field: BaseField, value: f64) -> Adjustment {
    Adjustment::new(field, AdjustOp::Set { value })
}

fn play_random(session: &mut GameSession, chooser_seed: u64) -> Vec<f64> {
    let mut chooser = ChaCha20Rng::seed_from_u64(chooser_seed);
    let mut guard = 0;
    while !session.state().game_over() {
        let department = *Department::ALL.choose(&mut chooser).unwrap();
        let offered = session.select_department(department).unwrap().initiatives.len();
        let pick = chooser.gen_range(0..offered);
        let report = session.resolve_initiative(pick).unwrap();
        assert!(report.metrics.is_consistent());
        assert!(
            !(report.is_victory && report.ending != Some(Ending::Victory)),
            "victory flag must match the ending"
        );
        guard += 1;
        assert!(guard <= 100, "game must terminate");
    }
    session.state().history.clone()
}

#[test]
fn same_seed_and_choices_replay_identically() {
    let catalog = InitiativeCatalog::load_from_static();
    for seed in [1_u64, 42, 0xDEAD_BEEF] {
        let mut first = GameSession::new(Ruleset::default(), catalog.clone(), seed).unwrap();
        let mut second = GameSession::new(Ruleset::default(), catalog.clone(), seed).unwrap();
        assert_eq!(play_random(&mut first, seed), play_random(&mut second, seed));
        assert_eq!(first.state(), second.state());
    }
}

#[test]
fn random_campaigns_end_within_turn_cap() {
    let catalog = InitiativeCatalog::load_from_static();
    for profile in RulesetProfile::ALL {
        let ruleset = profile.ruleset();
        for seed in 0..200_u64 {
            let mut session = GameSession::new(ruleset.clone(), catalog.clone(), seed).unwrap();
            let history = play_random(&mut session, seed ^ 0x5EED);
            let state = session.state();
            assert!(state.turn <= ruleset.final_turn + 1);
            assert_eq!(history.len() as u32, state.turn);
            let summary = session.summary().unwrap();
            assert_eq!(summary.ending, state.ending.unwrap());
            if state.is_victory() {
                assert_eq!(state.turn, ruleset.final_turn);
                assert!(state.metrics.net_profit() >= ruleset.win_threshold);
            }
        }
    }
}

#[test]
fn victory_lands_exactly_on_final_turn() {
    let catalog = uniform_catalog(Effect(vec![
        set_field(BaseField::AvgPrice, 100.0),
        set_field(BaseField::CostOfGoods, 10.0),
        set_field(BaseField::FirstConversion, 50.0),
        set_field(BaseField::Users, 5_000.0),
        set_field(BaseField::CostPerUser, 1.0),
    ]));
    let ruleset = Ruleset {
        reroll_chances: false,
        ..Ruleset::default()
    };
    let mut session = GameSession::new(ruleset, catalog, 9).unwrap();
    let mut reports = Vec::new();
    while !session.state().game_over() {
        session.select_department(Department::Product).unwrap();
        reports.push(session.resolve_initiative(0).unwrap());
    }
    assert_eq!(reports.len(), 14);
    let last = reports.last().unwrap();
    assert_eq!(last.ending, Some(Ending::Victory));
    assert!(last.is_victory);
    assert_eq!(session.state().turn, 15);
    assert!(
        reports[..13].iter().all(|report| report.ending.is_none()),
        "profit alone must not end the game early"
    );
    assert!(
        last.headline.starts_with("Victory!"),
        "unexpected headline {}",
        last.headline
    );
}

#[test]
fn starter_economy_runs_out_of_cash() {
    let catalog = uniform_catalog(Effect::default());
    let ruleset = Ruleset {
        reroll_chances: false,
        ..Ruleset::default()
    };
    let mut session = GameSession::new(ruleset, catalog, 2).unwrap();
    let mut balances = Vec::new();
    while !session.state().game_over() {
        session.select_department(Department::Onboarding).unwrap();
        balances.push(session.resolve_initiative(0).unwrap().balance);
    }
    assert!((balances[0] - 23_100.0).abs() < 1e-9);
    assert_eq!(balances.len(), 5);
    assert!(balances[..4].iter().all(|balance| *balance >= 0.0));
    assert_eq!(session.state().ending, Some(Ending::Insolvency));
    assert_eq!(
        session.select_department(Department::Admin).err(),
        Some(TurnError::GameOver)
    );
}

#[test]
fn churn_ends_game_after_two_low_user_turns() {
    let catalog = uniform_catalog(Effect(vec![set_field(BaseField::Users, 10.0)]));
    let ruleset = Ruleset {
        reroll_chances: false,
        starting_balance: 1_000_000.0,
        ..Ruleset::default()
    };
    let mut session = GameSession::new(ruleset, catalog, 4).unwrap();
    session.select_department(Department::Acquisition).unwrap();
    let first = session.resolve_initiative(0).unwrap();
    assert!(first.low_user_warning && !first.game_over);
    session.select_department(Department::Acquisition).unwrap();
    let second = session.resolve_initiative(0).unwrap();
    assert_eq!(second.ending, Some(Ending::Churn));
}

#[test]
fn achievements_unlock_once_across_a_campaign() {
    let catalog = uniform_catalog(Effect(vec![
        set_field(BaseField::AvgPrice, 100.0),
        set_field(BaseField::CostOfGoods, 10.0),
        set_field(BaseField::FirstConversion, 50.0),
        set_field(BaseField::Users, 5_000.0),
        set_field(BaseField::CostPerUser, 1.0),
    ]));
    let ruleset = Ruleset {
        reroll_chances: false,
        ..Ruleset::default()
    };
    let mut session = GameSession::new(ruleset, catalog, 9).unwrap();
    let mut seen = Vec::new();
    while !session.state().game_over() {
        session.select_department(Department::Admin).unwrap();
        seen.extend(session.resolve_initiative(0).unwrap().unlocked);
    }
    let mut unique = seen.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(seen.len(), unique.len(), "an achievement was reported twice");
    assert_eq!(session.state().achieved_count(), seen.len());
    assert_eq!(seen.len(), unitsim_game::REGISTRY.len());
}
