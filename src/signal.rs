use std::collections::VecDeque;

use crate::constants::{POSITION_MAX, POSITION_MIN};
use crate::rng::Rng;
use crate::types::{SignalKind, SignalValue};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignalAvailability {
    Ready,
    Blocked(String),
}

pub trait SignalSource: Send {
    fn kind(&self) -> SignalKind;

    fn tick(&mut self) -> SignalValue;

    fn availability(&self) -> SignalAvailability {
        SignalAvailability::Ready
    }

    fn reset(&mut self) {}

    fn push(&mut self, _value: SignalValue) {}
}

pub fn sanitize(value: SignalValue, expected: SignalKind, previous: SignalValue) -> SignalValue {
    match (expected, value) {
        (SignalKind::Position, SignalValue::Position(x)) if x.is_finite() => {
            SignalValue::Position(x.clamp(POSITION_MIN, POSITION_MAX))
        }
        (SignalKind::Violation, SignalValue::Violation(open)) => SignalValue::Violation(open),
        _ if previous.kind() == expected => previous,
        _ => SignalValue::resting(expected),
    }
}

#[derive(Clone, Debug)]
pub struct RandomWalkSource {
    rng: Rng,
    step: f32,
    value: f32,
}

impl RandomWalkSource {
    pub fn new(seed: u32, step: f32) -> Self {
        Self {
            rng: Rng::new(seed),
            step,
            value: 0.0,
        }
    }
}

impl SignalSource for RandomWalkSource {
    fn kind(&self) -> SignalKind {
        SignalKind::Position
    }

    fn tick(&mut self) -> SignalValue {
        let delta = self.rng.centered(self.step);
        self.value = (self.value + delta).clamp(POSITION_MIN, POSITION_MAX);
        SignalValue::Position(self.value)
    }

    fn reset(&mut self) {
        self.value = 0.0;
    }
}

#[derive(Clone, Debug)]
pub struct ViolationSource {
    rng: Rng,
    chance: f32,
}

impl ViolationSource {
    pub fn new(seed: u32, chance: f32) -> Self {
        Self {
            rng: Rng::new(seed),
            chance,
        }
    }
}

impl SignalSource for ViolationSource {
    fn kind(&self) -> SignalKind {
        SignalKind::Violation
    }

    fn tick(&mut self) -> SignalValue {
        SignalValue::Violation(self.rng.bool(self.chance))
    }
}

#[derive(Clone, Debug)]
pub struct ScriptedSource {
    kind: SignalKind,
    queue: VecDeque<SignalValue>,
    last: SignalValue,
}

impl ScriptedSource {
    pub fn new(kind: SignalKind, values: impl IntoIterator<Item = SignalValue>) -> Self {
        Self {
            kind,
            queue: values.into_iter().collect(),
            last: SignalValue::resting(kind),
        }
    }

    pub fn positions(values: impl IntoIterator<Item = f32>) -> Self {
        Self::new(
            SignalKind::Position,
            values.into_iter().map(SignalValue::Position),
        )
    }

    pub fn violations(values: impl IntoIterator<Item = bool>) -> Self {
        Self::new(
            SignalKind::Violation,
            values.into_iter().map(SignalValue::Violation),
        )
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl SignalSource for ScriptedSource {
    fn kind(&self) -> SignalKind {
        self.kind
    }

    fn tick(&mut self) -> SignalValue {
        if let Some(next) = self.queue.pop_front() {
            self.last = next;
        } else if self.kind == SignalKind::Violation {
            // a violation is an event, not a level
            self.last = SignalValue::Violation(false);
        }
        self.last
    }
}

#[derive(Clone, Debug)]
pub struct FeedSource {
    kind: SignalKind,
    latest: SignalValue,
    pending_violation: bool,
    blocked: Option<String>,
}

impl FeedSource {
    pub fn new(kind: SignalKind) -> Self {
        Self {
            kind,
            latest: SignalValue::resting(kind),
            pending_violation: false,
            blocked: None,
        }
    }

    pub fn set_blocked(&mut self, reason: Option<String>) {
        self.blocked = reason;
    }
}

impl SignalSource for FeedSource {
    fn kind(&self) -> SignalKind {
        self.kind
    }

    fn tick(&mut self) -> SignalValue {
        match self.kind {
            SignalKind::Position => self.latest,
            SignalKind::Violation => {
                let fired = std::mem::take(&mut self.pending_violation);
                SignalValue::Violation(fired)
            }
        }
    }

    fn availability(&self) -> SignalAvailability {
        match &self.blocked {
            Some(reason) => SignalAvailability::Blocked(reason.clone()),
            None => SignalAvailability::Ready,
        }
    }

    fn reset(&mut self) {
        self.latest = SignalValue::resting(self.kind);
        self.pending_violation = false;
    }

    fn push(&mut self, value: SignalValue) {
        match value {
            SignalValue::Violation(true) => self.pending_violation = true,
            SignalValue::Violation(false) => {}
            SignalValue::Position(_) => self.latest = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_and_rejects_non_finite() {
        let prev = SignalValue::Position(0.4);
        assert_eq!(
            sanitize(SignalValue::Position(3.0), SignalKind::Position, prev),
            SignalValue::Position(1.0)
        );
        assert_eq!(
            sanitize(SignalValue::Position(-9.0), SignalKind::Position, prev),
            SignalValue::Position(-1.0)
        );
        assert_eq!(
            sanitize(SignalValue::Position(f32::NAN), SignalKind::Position, prev),
            prev
        );
        assert_eq!(
            sanitize(SignalValue::Position(f32::INFINITY), SignalKind::Position, prev),
            prev
        );
        assert_eq!(
            sanitize(SignalValue::Violation(true), SignalKind::Position, prev),
            prev
        );
        assert_eq!(
            sanitize(
                SignalValue::Position(0.2),
                SignalKind::Violation,
                SignalValue::Position(0.0)
            ),
            SignalValue::Violation(false)
        );
    }

    #[test]
    fn random_walk_stays_bounded() {
        let mut source = RandomWalkSource::new(99, 0.8);
        for _ in 0..5_000 {
            let SignalValue::Position(x) = source.tick() else {
                panic!("expected position");
            };
            assert!((POSITION_MIN..=POSITION_MAX).contains(&x));
        }
    }

    #[test]
    fn violation_source_respects_extreme_chances() {
        let mut never = ViolationSource::new(1, 0.0);
        let mut always = ViolationSource::new(1, 1.0);
        for _ in 0..200 {
            assert_eq!(never.tick(), SignalValue::Violation(false));
            assert_eq!(always.tick(), SignalValue::Violation(true));
        }
    }

    #[test]
    fn scripted_positions_hold_last_value() {
        let mut source = ScriptedSource::positions([0.1, 0.2]);
        assert_eq!(source.tick(), SignalValue::Position(0.1));
        assert_eq!(source.tick(), SignalValue::Position(0.2));
        assert_eq!(source.remaining(), 0);
        assert_eq!(source.tick(), SignalValue::Position(0.2));
    }

    #[test]
    fn scripted_violations_do_not_repeat() {
        let mut source = ScriptedSource::violations([true]);
        assert_eq!(source.tick(), SignalValue::Violation(true));
        assert_eq!(source.tick(), SignalValue::Violation(false));
    }

    #[test]
    fn feed_latches_violation_until_next_tick() {
        let mut feed = FeedSource::new(SignalKind::Violation);
        feed.push(SignalValue::Violation(true));
        feed.push(SignalValue::Violation(false));
        assert_eq!(feed.tick(), SignalValue::Violation(true));
        assert_eq!(feed.tick(), SignalValue::Violation(false));
    }

    #[test]
    fn feed_reports_blocked_state() {
        let mut feed = FeedSource::new(SignalKind::Position);
        assert_eq!(feed.availability(), SignalAvailability::Ready);
        feed.set_blocked(Some("camera permission denied".to_string()));
        assert_eq!(
            feed.availability(),
            SignalAvailability::Blocked("camera permission denied".to_string())
        );
        feed.push(SignalValue::Position(0.5));
        assert_eq!(feed.tick(), SignalValue::Position(0.5));
        feed.reset();
        assert_eq!(feed.tick(), SignalValue::Position(0.0));
    }
}
