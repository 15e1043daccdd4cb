#[derive(Clone, Debug)]
pub struct ScoreLedger {
    score: u64,
    difficulty: u32,
    step: Option<u64>,
    max_difficulty: u32,
}

impl ScoreLedger {
    pub fn flat() -> Self {
        Self {
            score: 0,
            difficulty: 1,
            step: None,
            max_difficulty: 1,
        }
    }

    pub fn stepped(step: u64, max_difficulty: u32) -> Self {
        Self {
            score: 0,
            difficulty: 1,
            step: Some(step.max(1)),
            max_difficulty: max_difficulty.max(1),
        }
    }

    pub fn add_score(&mut self, delta: u64) -> Option<u32> {
        self.score = self.score.saturating_add(delta);
        let step = self.step?;
        let level = (self.score / step)
            .saturating_add(1)
            .min(self.max_difficulty as u64) as u32;
        if level > self.difficulty {
            self.difficulty = level;
            return Some(level);
        }
        None
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn current_difficulty(&self) -> u32 {
        self.difficulty
    }
}
