use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::score_store::ScoreStore;
use crate::types::GameId;

pub trait ScoreSink: Send {
    fn report_score(&mut self, game: GameId, score: u64);
}

pub trait Entitlement: Send {
    fn is_premium(&self) -> bool;
}

pub trait AdGate: Send {
    fn request_interstitial(&mut self);
}

pub struct Collaborators {
    pub scores: Box<dyn ScoreSink>,
    pub entitlement: Box<dyn Entitlement>,
    pub ads: Box<dyn AdGate>,
}

impl Collaborators {
    pub fn new(
        scores: impl ScoreSink + 'static,
        entitlement: impl Entitlement + 'static,
        ads: impl AdGate + 'static,
    ) -> Self {
        Self {
            scores: Box::new(scores),
            entitlement: Box::new(entitlement),
            ads: Box::new(ads),
        }
    }

    pub fn detached() -> Self {
        Self::new(DiscardScores, true, NoAds)
    }
}

impl Entitlement for bool {
    fn is_premium(&self) -> bool {
        *self
    }
}

#[derive(Clone, Debug, Default)]
pub struct PremiumFlag(Arc<AtomicBool>);

impl PremiumFlag {
    pub fn new(premium: bool) -> Self {
        Self(Arc::new(AtomicBool::new(premium)))
    }

    pub fn set(&self, premium: bool) {
        self.0.store(premium, Ordering::Relaxed);
    }
}

impl Entitlement for PremiumFlag {
    fn is_premium(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardScores;

impl ScoreSink for DiscardScores {
    fn report_score(&mut self, _game: GameId, _score: u64) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoAds;

impl AdGate for NoAds {
    fn request_interstitial(&mut self) {}
}

#[derive(Clone)]
pub struct SharedScoreStore(pub Arc<Mutex<ScoreStore>>);

impl ScoreSink for SharedScoreStore {
    fn report_score(&mut self, game: GameId, score: u64) {
        self.0.lock().record(game, score);
    }
}

#[derive(Clone, Debug, Default)]
pub struct ScoreLog(pub Arc<Mutex<Vec<(GameId, u64)>>>);

impl ScoreLog {
    pub fn entries(&self) -> Vec<(GameId, u64)> {
        self.0.lock().clone()
    }
}

impl ScoreSink for ScoreLog {
    fn report_score(&mut self, game: GameId, score: u64) {
        self.0.lock().push((game, score));
    }
}

#[derive(Clone, Debug, Default)]
pub struct AdCounter(pub Arc<AtomicU64>);

impl AdCounter {
    pub fn count(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl AdGate for AdCounter {
    fn request_interstitial(&mut self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}
