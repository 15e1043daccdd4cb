use crate::config::PlayArea;

pub fn is_aligned(signal: f32, target: f32, threshold: f32) -> bool {
    (signal - target).abs() < threshold
}

#[derive(Clone, Debug)]
pub struct AlignmentMeter {
    progress: u32,
    gain: u32,
    decay: u32,
    max: u32,
}

impl AlignmentMeter {
    pub fn new(gain: u32, decay: u32, max: u32) -> Self {
        Self {
            progress: 0,
            gain,
            decay,
            max,
        }
    }

    pub fn apply(&mut self, aligned: bool) -> bool {
        self.progress = if aligned {
            self.progress.saturating_add(self.gain).min(self.max)
        } else {
            self.progress.saturating_sub(self.decay)
        };
        self.is_full()
    }

    pub fn is_full(&self) -> bool {
        self.progress >= self.max
    }

    pub fn progress(&self) -> u32 {
        self.progress
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationOutcome {
    Clean(u64),
    Strike(u32),
    StruckOut,
}

#[derive(Clone, Debug)]
pub struct StrikeTracker {
    strikes: u32,
    streak: u32,
    max_strikes: u32,
}

impl StrikeTracker {
    pub fn new(max_strikes: u32) -> Self {
        Self {
            strikes: 0,
            streak: 0,
            max_strikes,
        }
    }

    pub fn apply(&mut self, violation: bool) -> ViolationOutcome {
        if violation {
            self.strikes = self.strikes.saturating_add(1);
            self.streak = 0;
            if self.strikes >= self.max_strikes {
                return ViolationOutcome::StruckOut;
            }
            return ViolationOutcome::Strike(self.strikes);
        }
        let bonus = self.streak as u64;
        self.streak = self.streak.saturating_add(1);
        ViolationOutcome::Clean(bonus)
    }

    pub fn strikes(&self) -> u32 {
        self.strikes
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn max_strikes(&self) -> u32 {
        self.max_strikes
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    // touching edges count as overlap
    pub fn overlaps(&self, other: &Rect) -> bool {
        let separated = self.right < other.left
            || other.right < self.left
            || self.bottom < other.top
            || other.bottom < self.top;
        !separated
    }
}

pub fn hit_zone(area: &PlayArea, player_x: f32) -> Rect {
    let top = area.height - area.hit_zone_top_offset;
    Rect {
        left: player_x - area.player_width / 2.0,
        top,
        right: player_x + area.player_width / 2.0,
        bottom: area.height - area.hit_zone_bottom_offset,
    }
}

pub fn fall_progress(now_ms: u64, spawned_at_ms: u64, fall_duration_ms: u64) -> f32 {
    if fall_duration_ms == 0 {
        return 1.0;
    }
    let elapsed = now_ms.saturating_sub(spawned_at_ms) as f64;
    (elapsed / fall_duration_ms as f64).clamp(0.0, 1.0) as f32
}

pub fn entity_top(area: &PlayArea, progress: f32) -> f32 {
    -area.entity_size + (area.height + area.entity_size) * progress
}

pub fn entity_rect(area: &PlayArea, x: f32, top: f32) -> Rect {
    Rect::new(x, top, area.entity_size, area.entity_size)
}

pub fn has_exited(area: &PlayArea, top: f32) -> bool {
    top >= area.height
}
