use minigame_engine::collaborators::{AdCounter, Collaborators, ScoreLog};
use minigame_engine::config::{
    AlignmentRules, AvoidanceRules, DodgeRules, GameRules, PlayArea, RulesBook, TargetPolicy,
};
use minigame_engine::engine::RoundEngine;
use minigame_engine::signal::{RandomWalkSource, ScriptedSource, SignalSource, ViolationSource};
use minigame_engine::types::{
    ClockView, GameId, MeterView, RoundEvent, RoundState, SignalValue, TerminalReason,
};

fn engine(
    game: GameId,
    rules: GameRules,
    signal: impl SignalSource + 'static,
    seed: u32,
) -> (RoundEngine, ScoreLog, AdCounter) {
    let scores = ScoreLog::default();
    let ads = AdCounter::default();
    let engine = RoundEngine::new(
        game,
        rules,
        Box::new(signal),
        Collaborators::new(scores.clone(), false, ads.clone()),
        seed,
    );
    (engine, scores, ads)
}

fn meter_progress(engine: &RoundEngine) -> Option<u32> {
    match engine.snapshot().meter {
        MeterView::Progress { value, .. } => Some(value),
        _ => None,
    }
}

fn meter_strikes(engine: &RoundEngine) -> Option<u32> {
    match engine.snapshot().meter {
        MeterView::Strikes { count, .. } => Some(count),
        _ => None,
    }
}

#[test]
fn alignment_twenty_close_ticks_win() {
    let samples: Vec<f32> = (0..20)
        .map(|i| if i % 2 == 0 { 0.38 } else { 0.22 })
        .collect();
    let rules = GameRules::Alignment(AlignmentRules {
        target: TargetPolicy::Fixed { value: 0.3 },
        ..AlignmentRules::default()
    });
    let (mut engine, scores, ads) = engine(
        GameId::ChargerChallenge,
        rules,
        ScriptedSource::positions(samples),
        1,
    );
    engine.start(0).expect("start");
    assert_eq!(engine.snapshot().target, Some(0.3));

    for tick in 1..=20u64 {
        engine.advance(tick * 100);
        let progress = meter_progress(&engine).expect("alignment meter");
        assert!(progress <= 100);
        if tick < 20 {
            assert_eq!(engine.state(), RoundState::Playing);
        }
    }
    assert_eq!(engine.state(), RoundState::Won);
    assert_eq!(meter_progress(&engine), Some(100));
    assert_eq!(engine.score(), 20 * 10);
    assert_eq!(scores.entries(), vec![(GameId::ChargerChallenge, 200)]);
    assert_eq!(ads.count(), 0);
}

#[test]
fn avoidance_strikes_out_exactly_on_third_violation() {
    let script = [true, false, false, false, true, false, false, false, true];
    let (mut engine, scores, ads) = engine(
        GameId::MewingMaster,
        GameRules::Avoidance(AvoidanceRules::default()),
        ScriptedSource::violations(script),
        2,
    );
    engine.start(0).expect("start");

    let mut last_strikes = 0;
    for tick in 1..=8u64 {
        engine.advance(tick * 500);
        let strikes = meter_strikes(&engine).expect("strike meter");
        assert!(strikes >= last_strikes);
        assert!(strikes < 3);
        last_strikes = strikes;
        assert_eq!(engine.state(), RoundState::Playing);
    }
    engine.advance(9 * 500);
    assert_eq!(engine.state(), RoundState::Lost);
    assert_eq!(meter_strikes(&engine), Some(3));
    assert_eq!(
        engine.summary().map(|summary| summary.reason),
        Some(TerminalReason::StrikedOut)
    );
    assert_eq!(scores.entries().len(), 1);
    assert_eq!(ads.count(), 1);
    assert!(engine.interstitial_pending());
}

#[test]
fn dodge_entity_over_player_hits_once_at_interpolated_time() {
    // A narrow field forces every spawn to overlap the centred player.
    let rules = DodgeRules {
        fall_base_ms: 1_000,
        fall_step_ms: 0,
        area: PlayArea {
            width: 100.0,
            ..PlayArea::default()
        },
        ..DodgeRules::default()
    };
    let (mut engine, _, _) = engine(
        GameId::SkibidiDodge,
        GameRules::Dodge(rules),
        ScriptedSource::positions([0.0]),
        3,
    );
    engine.start(0).expect("start");

    engine.advance(1_400);
    assert_eq!(engine.round().entities.len(), 1);
    assert_eq!(engine.round().entities[0].fall_duration_ms, 1_000);

    // bottom edge reaches the hit zone about 776ms into a 1000ms fall
    engine.advance(2_150);
    assert_eq!(
        engine.snapshot().meter,
        MeterView::Lives {
            remaining: 3,
            max: 3
        }
    );
    engine.advance(2_200);
    assert_eq!(
        engine.snapshot().meter,
        MeterView::Lives {
            remaining: 2,
            max: 3
        }
    );
    assert!(engine.round().entities.is_empty());
    let hits = engine
        .drain_events()
        .into_iter()
        .filter(|event| matches!(event, RoundEvent::Hit { .. }))
        .count();
    assert_eq!(hits, 1);
}

#[test]
fn dodge_difficulty_is_non_decreasing_and_capped() {
    let rules = DodgeRules {
        lives: 10_000,
        ..DodgeRules::default()
    };
    let (mut engine, _, _) = engine(
        GameId::SkibidiDodge,
        GameRules::Dodge(rules),
        RandomWalkSource::new(9, 0.2),
        4,
    );
    engine.start(0).expect("start");
    let mut last_difficulty = engine.difficulty();
    let mut last_score = engine.score();
    for step in 1..=3_000u64 {
        engine.advance(step * 50);
        assert!(engine.difficulty() >= last_difficulty);
        assert!(engine.difficulty() <= 10);
        assert!(engine.score() >= last_score);
        last_difficulty = engine.difficulty();
        last_score = engine.score();
    }
    assert_eq!(engine.difficulty(), 10);
    assert_eq!(engine.snapshot().clock, ClockView::Elapsed { seconds: 150 });
}

#[test]
fn state_machine_only_takes_legal_edges() {
    let book = RulesBook::default();
    for seed in 0..12u32 {
        for game in GameId::ALL {
            let rules = book.rules_for(game);
            let source: Box<dyn SignalSource> = match &rules {
                GameRules::Avoidance(avoid) => {
                    Box::new(ViolationSource::new(seed, avoid.violation_chance))
                }
                _ => Box::new(RandomWalkSource::new(seed, 0.2)),
            };
            let mut engine = RoundEngine::new(game, rules, source, Collaborators::detached(), seed);
            engine.start(0).expect("start");

            let mut previous = engine.state();
            let mut previous_score = engine.score();
            let mut now_ms = 0;
            while now_ms < 90_000 {
                now_ms += 50;
                engine.advance(now_ms);
                let state = engine.state();
                let legal = matches!(
                    (previous, state),
                    (RoundState::Playing, RoundState::Playing)
                        | (RoundState::Playing, RoundState::Won)
                        | (RoundState::Playing, RoundState::Lost)
                        | (RoundState::Won, RoundState::Won)
                        | (RoundState::Lost, RoundState::Lost)
                );
                assert!(legal, "{game}: {previous:?} -> {state:?}");
                assert!(engine.score() >= previous_score || state.is_terminal());
                previous = state;
                previous_score = engine.score();
            }
            engine.quit();
        }
    }
}

#[test]
fn terminal_rounds_report_exactly_once() {
    for seed in 0..8u32 {
        let (mut engine, scores, _) = engine(
            GameId::MewingMaster,
            GameRules::Avoidance(AvoidanceRules {
                violation_chance: 0.3,
                ..AvoidanceRules::default()
            }),
            ViolationSource::new(seed, 0.3),
            seed,
        );
        engine.start(0).expect("start");
        engine.advance(120_000);
        assert!(engine.state().is_terminal());
        engine.advance(240_000);
        assert_eq!(scores.entries().len(), 1);
        assert_eq!(scores.entries()[0].1, engine.score());
    }
}

#[test]
fn reset_after_loss_is_indistinguishable_from_fresh() {
    let rules = GameRules::Dodge(DodgeRules {
        lives: 1,
        fall_base_ms: 1_000,
        fall_step_ms: 0,
        area: PlayArea {
            width: 100.0,
            ..PlayArea::default()
        },
        ..DodgeRules::default()
    });
    let (mut played, _, _) = engine(
        GameId::SkibidiDodge,
        rules.clone(),
        ScriptedSource::positions([0.0]),
        5,
    );
    played.start(0).expect("start");
    played.advance(5_000);
    assert_eq!(played.state(), RoundState::Lost);
    played.dismiss_interstitial();
    played.reset().expect("reset");
    played.start(0).expect("restart");

    let (mut fresh, _, _) = engine(
        GameId::SkibidiDodge,
        rules,
        ScriptedSource::positions([0.0]),
        5,
    );
    fresh.start(0).expect("start");

    let a = played.snapshot();
    let b = fresh.snapshot();
    assert_eq!(a.state, b.state);
    assert_eq!(a.score, 0);
    assert_eq!(a.score, b.score);
    assert_eq!(a.difficulty, 1);
    assert_eq!(a.meter, b.meter);
    assert_eq!(a.clock, b.clock);
    assert!(a.entities.is_empty());
    assert_eq!(a.signal, SignalValue::Position(0.0));
    assert!(!a.interstitial_pending);
}
