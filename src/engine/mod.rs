use tracing::{debug, info};

use crate::clock::{ClockTick, RoundClock};
use crate::collaborators::Collaborators;
use crate::collision::{is_aligned, AlignmentMeter, StrikeTracker, ViolationOutcome};
use crate::config::{GameRules, TargetPolicy};
use crate::constants::{ALIGN_PROGRESS_MAX, CLOCK_PERIOD_MS, POSITION_MAX, POSITION_MIN};
use crate::error::EngineError;
use crate::ledger::ScoreLedger;
use crate::rng::Rng;
use crate::signal::{sanitize, SignalAvailability, SignalSource};
use crate::types::{
    EntityView, GameId, MeterView, RoundEvent, RoundState, RoundSummary, RoundView, SignalValue,
    TerminalReason,
};

mod spawn_system;
mod timers;

pub use self::spawn_system::{FallingEntity, SpawnProposal, SpawnScheduler};
pub use self::timers::{CancelToken, RoundTimers, TaskKind};

#[derive(Clone, Debug)]
pub enum RoundMeter {
    Progress(AlignmentMeter),
    Strikes(StrikeTracker),
    Lives { remaining: u32, max: u32 },
}

#[derive(Clone, Debug)]
pub struct Round {
    pub state: RoundState,
    pub ledger: ScoreLedger,
    pub clock: RoundClock,
    pub signal: SignalValue,
    pub target: Option<f32>,
    pub meter: RoundMeter,
    pub entities: Vec<FallingEntity>,
    pub reason: Option<TerminalReason>,
    pub interstitial_pending: bool,
    pub started_at_ms: u64,
    pub now_ms: u64,
    next_entity_id: u64,
}

impl Round {
    fn fresh(rules: &GameRules) -> Self {
        let (ledger, clock, meter) = match rules {
            GameRules::Alignment(rules) => (
                ScoreLedger::flat(),
                RoundClock::countdown(rules.duration_secs),
                RoundMeter::Progress(AlignmentMeter::new(
                    rules.progress_gain,
                    rules.progress_decay,
                    ALIGN_PROGRESS_MAX,
                )),
            ),
            GameRules::Avoidance(rules) => (
                ScoreLedger::flat(),
                RoundClock::countdown(rules.duration_secs),
                RoundMeter::Strikes(StrikeTracker::new(rules.max_strikes)),
            ),
            GameRules::Dodge(rules) => (
                ScoreLedger::stepped(rules.difficulty_step, rules.max_difficulty),
                match rules.time_limit_secs {
                    Some(limit) => RoundClock::countdown(limit),
                    None => RoundClock::count_up(),
                },
                RoundMeter::Lives {
                    remaining: rules.lives,
                    max: rules.lives,
                },
            ),
        };
        Self {
            state: RoundState::Waiting,
            ledger,
            clock,
            signal: SignalValue::resting(rules.signal_kind()),
            target: None,
            meter,
            entities: Vec::new(),
            reason: None,
            interstitial_pending: false,
            started_at_ms: 0,
            now_ms: 0,
            next_entity_id: 0,
        }
    }

    fn signal_position(&self) -> f32 {
        match self.signal {
            SignalValue::Position(x) => x,
            SignalValue::Violation(_) => 0.0,
        }
    }
}

pub struct RoundEngine {
    game: GameId,
    rules: GameRules,
    round: Round,
    signal: Box<dyn SignalSource>,
    collaborators: Collaborators,
    rng: Rng,
    timers: RoundTimers,
    spawner: Option<SpawnScheduler>,
    events: Vec<RoundEvent>,
    blocked_reason: Option<String>,
    exited: bool,
}

impl RoundEngine {
    pub fn new(
        game: GameId,
        rules: GameRules,
        signal: Box<dyn SignalSource>,
        collaborators: Collaborators,
        seed: u32,
    ) -> Self {
        let spawner = match &rules {
            GameRules::Dodge(dodge) => Some(SpawnScheduler::from_rules(dodge)),
            _ => None,
        };
        Self {
            game,
            round: Round::fresh(&rules),
            rules,
            signal,
            collaborators,
            rng: Rng::new(seed),
            timers: RoundTimers::default(),
            spawner,
            events: Vec::new(),
            blocked_reason: None,
            exited: false,
        }
    }

    pub fn game(&self) -> GameId {
        self.game
    }

    pub fn state(&self) -> RoundState {
        self.round.state
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn score(&self) -> u64 {
        self.round.ledger.score()
    }

    pub fn difficulty(&self) -> u32 {
        self.round.ledger.current_difficulty()
    }

    pub fn active_tasks(&self) -> usize {
        self.timers.active_tasks()
    }

    pub fn cancel_token(&self) -> Option<CancelToken> {
        self.timers.token()
    }

    pub fn interstitial_pending(&self) -> bool {
        self.round.interstitial_pending
    }

    pub fn shows_summary(&self) -> bool {
        self.round.state.is_terminal() && !self.round.interstitial_pending
    }

    pub fn dismiss_interstitial(&mut self) {
        self.round.interstitial_pending = false;
    }

    pub fn push_signal(&mut self, value: SignalValue) {
        if self.exited {
            return;
        }
        self.signal.push(value);
    }

    pub fn drain_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn start(&mut self, now_ms: u64) -> Result<(), EngineError> {
        if self.exited {
            return Err(EngineError::Exited);
        }
        if self.round.state != RoundState::Waiting {
            return Err(EngineError::InvalidTransition {
                action: "start",
                from: self.round.state,
            });
        }
        if self.signal.kind() != self.rules.signal_kind() {
            return Err(EngineError::SignalUnavailable(format!(
                "{} needs a {:?} signal, source provides {:?}",
                self.game,
                self.rules.signal_kind(),
                self.signal.kind()
            )));
        }
        if let SignalAvailability::Blocked(reason) = self.signal.availability() {
            debug!(game = %self.game, %reason, "start refused: signal unavailable");
            self.blocked_reason = Some(reason.clone());
            return Err(EngineError::SignalUnavailable(reason));
        }
        self.blocked_reason = None;

        let mut round = Round::fresh(&self.rules);
        round.state = RoundState::Playing;
        round.started_at_ms = now_ms;
        round.now_ms = now_ms;
        if let GameRules::Alignment(rules) = &self.rules {
            round.target = Some(match rules.target {
                TargetPolicy::Fixed { value } => value,
                TargetPolicy::Random { spread } => {
                    self.rng.centered(spread).clamp(POSITION_MIN, POSITION_MAX)
                }
            });
        }
        round.clock.start();
        self.round = round;
        self.signal.reset();

        self.timers.arm();
        self.timers
            .every(TaskKind::Signal, self.rules.signal_interval_ms(), now_ms);
        self.timers.every(TaskKind::Clock, CLOCK_PERIOD_MS, now_ms);
        if let GameRules::Dodge(rules) = &self.rules {
            self.timers
                .every(TaskKind::Score, rules.score_interval_ms, now_ms);
            if let Some(spawner) = self.spawner {
                self.timers
                    .after(TaskKind::Spawn, spawner.next_spawn_delay_ms(1), now_ms);
            }
            self.timers
                .every(TaskKind::Collision, rules.collision_interval_ms, now_ms);
            self.timers
                .every(TaskKind::Cleanup, rules.cleanup_interval_ms, now_ms);
        }

        self.events.push(RoundEvent::Started {
            game: self.game,
            at_ms: now_ms,
        });
        info!(game = %self.game, target = ?self.round.target, "round started");
        Ok(())
    }

    pub fn advance(&mut self, now_ms: u64) {
        if self.exited || self.round.state != RoundState::Playing {
            return;
        }
        while let Some((kind, due_ms)) = self.timers.next_due(now_ms) {
            if !self.timers.fire(kind) {
                break;
            }
            self.round.now_ms = due_ms;
            self.run_task(kind, due_ms);
        }
        if self.round.state == RoundState::Playing {
            self.round.now_ms = self.round.now_ms.max(now_ms);
        }
    }

    pub fn reset(&mut self) -> Result<(), EngineError> {
        if self.exited {
            return Err(EngineError::Exited);
        }
        match self.round.state {
            RoundState::Waiting => Ok(()),
            RoundState::Playing => Err(EngineError::InvalidTransition {
                action: "reset",
                from: RoundState::Playing,
            }),
            RoundState::Won | RoundState::Lost => {
                self.timers.cancel();
                self.round = Round::fresh(&self.rules);
                self.events.push(RoundEvent::Reset);
                debug!(game = %self.game, "round reset");
                Ok(())
            }
        }
    }

    pub fn quit(&mut self) {
        if self.exited {
            return;
        }
        self.timers.cancel();
        self.round.clock.stop();
        self.round.entities.clear();
        self.exited = true;
        info!(game = %self.game, state = ?self.round.state, "engine exited");
    }

    fn run_task(&mut self, kind: TaskKind, at_ms: u64) {
        match kind {
            TaskKind::Signal => self.on_signal_tick(),
            TaskKind::Clock => self.on_clock_tick(),
            TaskKind::Score => self.on_score_tick(),
            TaskKind::Spawn => self.spawn_entity(at_ms),
            TaskKind::Collision => self.resolve_entity_collisions(at_ms),
            TaskKind::Cleanup => self.remove_exited_entities(at_ms),
        }
    }

    fn on_signal_tick(&mut self) {
        let raw = self.signal.tick();
        let value = sanitize(raw, self.rules.signal_kind(), self.round.signal);
        self.round.signal = value;

        match value {
            SignalValue::Position(position) => {
                let GameRules::Alignment(rules) = &self.rules else {
                    // dodge reads the position lazily during collision checks
                    return;
                };
                let (threshold, per_tick) = (rules.threshold, rules.score_per_tick);
                let Some(target) = self.round.target else {
                    return;
                };
                let aligned = is_aligned(position, target, threshold);
                if aligned {
                    self.round.ledger.add_score(per_tick);
                }
                let RoundMeter::Progress(meter) = &mut self.round.meter else {
                    return;
                };
                if meter.apply(aligned) {
                    self.finish(RoundState::Won, TerminalReason::Charged);
                }
            }
            SignalValue::Violation(violation) => {
                let RoundMeter::Strikes(tracker) = &mut self.round.meter else {
                    return;
                };
                match tracker.apply(violation) {
                    ViolationOutcome::Clean(bonus) => {
                        self.round.ledger.add_score(bonus);
                    }
                    ViolationOutcome::Strike(count) => {
                        self.events.push(RoundEvent::Strike { count });
                    }
                    ViolationOutcome::StruckOut => {
                        let count = tracker.strikes();
                        self.events.push(RoundEvent::Strike { count });
                        self.finish(RoundState::Lost, TerminalReason::StrikedOut);
                    }
                }
            }
        }
    }

    fn on_clock_tick(&mut self) {
        let Some(tick) = self.round.clock.tick() else {
            return;
        };
        if let GameRules::Avoidance(rules) = &self.rules {
            self.round.ledger.add_score(rules.score_per_second);
        }
        if tick != ClockTick::Expired {
            return;
        }
        if matches!(self.rules, GameRules::Avoidance(_)) {
            self.finish(RoundState::Won, TerminalReason::Survived);
        } else {
            self.finish(RoundState::Lost, TerminalReason::TimeExpired);
        }
    }

    fn on_score_tick(&mut self) {
        let GameRules::Dodge(rules) = &self.rules else {
            return;
        };
        if let Some(level) = self.round.ledger.add_score(rules.score_per_tick) {
            self.events.push(RoundEvent::DifficultyRaised { level });
            debug!(level, score = self.round.ledger.score(), "difficulty raised");
        }
    }

    fn finish(&mut self, outcome: RoundState, reason: TerminalReason) {
        if self.round.state != RoundState::Playing {
            return;
        }
        self.timers.cancel();
        self.round.clock.stop();
        self.round.entities.clear();
        self.round.state = outcome;
        self.round.reason = Some(reason);

        let score = self.round.ledger.score();
        self.collaborators.scores.report_score(self.game, score);
        self.events.push(RoundEvent::Finished {
            outcome,
            reason,
            score,
        });
        info!(game = %self.game, ?outcome, ?reason, score, "round finished");

        if outcome == RoundState::Lost && !self.collaborators.entitlement.is_premium() {
            self.round.interstitial_pending = true;
            self.collaborators.ads.request_interstitial();
            self.events.push(RoundEvent::InterstitialRequested);
        }
    }

    pub fn summary(&self) -> Option<RoundSummary> {
        let reason = self.round.reason?;
        Some(RoundSummary {
            game: self.game,
            outcome: self.round.state,
            reason,
            score: self.round.ledger.score(),
            difficulty: self.round.ledger.current_difficulty(),
            duration_ms: self.round.now_ms.saturating_sub(self.round.started_at_ms),
        })
    }

    pub fn snapshot(&self) -> RoundView {
        let meter = match &self.round.meter {
            RoundMeter::Progress(meter) => MeterView::Progress {
                value: meter.progress(),
                max: meter.max(),
            },
            RoundMeter::Strikes(tracker) => MeterView::Strikes {
                count: tracker.strikes(),
                max: tracker.max_strikes(),
                streak: tracker.streak(),
            },
            RoundMeter::Lives { remaining, max } => MeterView::Lives {
                remaining: *remaining,
                max: *max,
            },
        };
        let (player_x, entities) = match &self.rules {
            GameRules::Dodge(rules) => (
                Some(rules.area.player_x(self.round.signal_position())),
                self.round
                    .entities
                    .iter()
                    .map(|entity| EntityView {
                        id: entity.id,
                        x: entity.x,
                        y: entity.top(&rules.area, self.round.now_ms),
                        skin: entity.skin,
                    })
                    .collect(),
            ),
            _ => (None, Vec::new()),
        };
        RoundView {
            game: self.game,
            state: self.round.state,
            score: self.round.ledger.score(),
            clock: self.round.clock.view(),
            signal: self.round.signal,
            target: self.round.target,
            player_x,
            meter,
            difficulty: self.round.ledger.current_difficulty(),
            entities,
            show_summary: self.shows_summary(),
            interstitial_pending: self.round.interstitial_pending,
            blocked_reason: self.blocked_reason.clone(),
        }
    }
}
