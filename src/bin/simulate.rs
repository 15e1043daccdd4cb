use clap::Parser;
use minigame_engine::collaborators::{AdCounter, Collaborators, ScoreLog};
use minigame_engine::config::{GameRules, RulesBook};
use minigame_engine::constants::SERVER_TICK_MS;
use minigame_engine::engine::RoundEngine;
use minigame_engine::signal::{RandomWalkSource, SignalSource, ViolationSource};
use minigame_engine::types::{GameId, RoundState, TerminalReason};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// charger_challenge, mewing_master or skibidi_dodge
    #[arg(long)]
    game: String,
    #[arg(long, default_value_t = 10)]
    rounds: u32,
    #[arg(long)]
    seed: Option<u64>,
    /// Rounds still playing after this much virtual time are abandoned.
    #[arg(long, default_value_t = 600)]
    max_seconds: u64,
    #[arg(long)]
    rules: Option<PathBuf>,
    #[arg(long)]
    premium: bool,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RoundResultLine {
    round: u32,
    seed: u32,
    game: GameId,
    outcome: RoundState,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<TerminalReason>,
    score: u64,
    difficulty: u32,
    duration_ms: u64,
    interstitial: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunSummary {
    game: GameId,
    base_seed: u32,
    round_count: usize,
    outcome_counts: BTreeMap<String, usize>,
    abandoned: usize,
    average_score: f64,
    best_score: u64,
    interstitials: u64,
    scores_reported: usize,
    rounds: Vec<RoundResultLine>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let Some(game) = GameId::parse(cli.game.trim()) else {
        error!(game = %cli.game, "unknown game id");
        std::process::exit(2);
    };
    let rules_book = match cli.rules.as_deref() {
        Some(path) => match RulesBook::load(path) {
            Ok(book) => book,
            Err(err) => {
                error!("failed to load rules: {err}");
                std::process::exit(2);
            }
        },
        None => RulesBook::default(),
    };
    let rules = rules_book.rules_for(game);
    let base_seed = normalize_seed(cli.seed.unwrap_or_else(rand::random));
    let score_log = ScoreLog::default();
    let ads = AdCounter::default();

    info!(%game, rounds = cli.rounds, base_seed, "simulation started");
    let mut results = Vec::new();
    for round in 0..cli.rounds {
        let seed = base_seed.wrapping_add(round);
        let collaborators = Collaborators::new(score_log.clone(), cli.premium, ads.clone());
        let result = run_round(game, &rules, collaborators, round, seed, cli.max_seconds);
        if result.outcome == RoundState::Playing {
            warn!(round, seed, "round abandoned at the time cap");
        }
        match serde_json::to_string(&result) {
            Ok(line) => println!("{line}"),
            Err(err) => error!("failed to serialize round result: {err}"),
        }
        results.push(result);
    }

    let summary = build_run_summary(
        game,
        base_seed,
        results,
        ads.count(),
        score_log.entries().len(),
    );
    info!(
        average_score = summary.average_score,
        best_score = summary.best_score,
        abandoned = summary.abandoned,
        "simulation finished"
    );

    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(err) = write_summary(path, &summary) {
            error!(path = %path.to_string_lossy(), "failed to write summary: {err}");
            std::process::exit(2);
        }
    }
}

fn synthetic_source(rules: &GameRules, seed: u32) -> Box<dyn SignalSource> {
    let seed = seed ^ 0x5bd1_e995;
    match rules {
        GameRules::Alignment(rules) => Box::new(RandomWalkSource::new(seed, rules.walk_step)),
        GameRules::Avoidance(rules) => Box::new(ViolationSource::new(seed, rules.violation_chance)),
        GameRules::Dodge(rules) => Box::new(RandomWalkSource::new(seed, rules.walk_step)),
    }
}

fn run_round(
    game: GameId,
    rules: &GameRules,
    collaborators: Collaborators,
    round: u32,
    seed: u32,
    max_seconds: u64,
) -> RoundResultLine {
    let mut engine = RoundEngine::new(
        game,
        rules.clone(),
        synthetic_source(rules, seed),
        collaborators,
        seed,
    );
    let limit_ms = max_seconds.saturating_mul(1_000);
    let mut now_ms = 0;
    if let Err(err) = engine.start(now_ms) {
        warn!(round, "round refused to start: {err}");
    }
    while engine.state() == RoundState::Playing && now_ms < limit_ms {
        now_ms += SERVER_TICK_MS;
        engine.advance(now_ms);
    }

    let line = match engine.summary() {
        Some(summary) => RoundResultLine {
            round,
            seed,
            game: engine.game(),
            outcome: summary.outcome,
            reason: Some(summary.reason),
            score: summary.score,
            difficulty: summary.difficulty,
            duration_ms: summary.duration_ms,
            interstitial: engine.interstitial_pending(),
        },
        None => RoundResultLine {
            round,
            seed,
            game: engine.game(),
            outcome: engine.state(),
            reason: None,
            score: engine.score(),
            difficulty: engine.difficulty(),
            duration_ms: now_ms,
            interstitial: false,
        },
    };
    engine.quit();
    line
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn outcome_key(outcome: RoundState) -> String {
    match outcome {
        RoundState::Waiting => "waiting",
        RoundState::Playing => "abandoned",
        RoundState::Won => "won",
        RoundState::Lost => "lost",
    }
    .to_string()
}

fn build_run_summary(
    game: GameId,
    base_seed: u32,
    rounds: Vec<RoundResultLine>,
    interstitials: u64,
    scores_reported: usize,
) -> RunSummary {
    let mut outcome_counts: BTreeMap<String, usize> = BTreeMap::new();
    for line in &rounds {
        *outcome_counts.entry(outcome_key(line.outcome)).or_insert(0) += 1;
    }
    let round_count = rounds.len();
    let total_score: u64 = rounds.iter().map(|line| line.score).sum();
    let average_score = if round_count == 0 {
        0.0
    } else {
        total_score as f64 / round_count as f64
    };
    RunSummary {
        game,
        base_seed,
        round_count,
        abandoned: rounds
            .iter()
            .filter(|line| line.outcome == RoundState::Playing)
            .count(),
        outcome_counts,
        average_score,
        best_score: rounds.iter().map(|line| line.score).max().unwrap_or(0),
        interstitials,
        scores_reported,
        rounds,
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_line(outcome: RoundState, score: u64) -> RoundResultLine {
        RoundResultLine {
            round: 0,
            seed: 42,
            game: GameId::MewingMaster,
            outcome,
            reason: None,
            score,
            difficulty: 1,
            duration_ms: 60_000,
            interstitial: false,
        }
    }

    #[test]
    fn build_run_summary_counts_outcomes_and_scores() {
        let summary = build_run_summary(
            GameId::MewingMaster,
            42,
            vec![
                make_line(RoundState::Won, 700),
                make_line(RoundState::Lost, 100),
                make_line(RoundState::Lost, 300),
            ],
            2,
            3,
        );
        assert_eq!(summary.round_count, 3);
        assert_eq!(summary.outcome_counts.get("lost"), Some(&2));
        assert_eq!(summary.outcome_counts.get("won"), Some(&1));
        assert_eq!(summary.best_score, 700);
        assert!((summary.average_score - 366.666).abs() < 0.01);
        assert_eq!(summary.abandoned, 0);
    }

    #[test]
    fn simulated_rounds_terminate_and_report_once() {
        let log = ScoreLog::default();
        let ads = AdCounter::default();
        for game in [GameId::ChargerChallenge, GameId::MewingMaster] {
            let rules = RulesBook::default().rules_for(game);
            let collaborators = Collaborators::new(log.clone(), false, ads.clone());
            let line = run_round(game, &rules, collaborators, 0, 7, 120);
            assert!(line.outcome.is_terminal());
            assert!(line.reason.is_some());
        }
        assert_eq!(log.entries().len(), 2);
    }

    #[test]
    fn dodge_round_is_abandoned_at_cap_without_report() {
        let log = ScoreLog::default();
        let mut rules = RulesBook::default();
        rules.skibidi_dodge.spawn_base_ms = 3_600_000;
        rules.skibidi_dodge.spawn_floor_ms = 3_600_000;
        let collaborators = Collaborators::new(log.clone(), true, AdCounter::default());
        let line = run_round(
            GameId::SkibidiDodge,
            &rules.rules_for(GameId::SkibidiDodge),
            collaborators,
            0,
            3,
            5,
        );
        assert_eq!(line.outcome, RoundState::Playing);
        assert_eq!(line.duration_ms, 5_000);
        assert!(log.entries().is_empty());
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let target = std::env::temp_dir()
            .join(format!("minigame-sim-missing-{now}"))
            .join("summary.json");
        let summary = build_run_summary(GameId::SkibidiDodge, 1, Vec::new(), 0, 0);
        assert!(write_summary(&target, &summary).is_err());
    }
}
