use crate::types::ClockView;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockMode {
    CountDown,
    CountUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockTick {
    Running(u32),
    Expired,
}

#[derive(Clone, Debug)]
pub struct RoundClock {
    mode: ClockMode,
    duration: u32,
    seconds: u32,
    running: bool,
}

impl RoundClock {
    pub fn countdown(duration_secs: u32) -> Self {
        Self {
            mode: ClockMode::CountDown,
            duration: duration_secs,
            seconds: duration_secs,
            running: false,
        }
    }

    pub fn count_up() -> Self {
        Self {
            mode: ClockMode::CountUp,
            duration: 0,
            seconds: 0,
            running: false,
        }
    }

    pub fn start(&mut self) {
        self.seconds = match self.mode {
            ClockMode::CountDown => self.duration,
            ClockMode::CountUp => 0,
        };
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn tick(&mut self) -> Option<ClockTick> {
        if !self.running {
            return None;
        }
        let expired = match self.mode {
            ClockMode::CountDown => {
                self.seconds = self.seconds.saturating_sub(1);
                self.seconds == 0
            }
            ClockMode::CountUp => {
                self.seconds = self.seconds.saturating_add(1);
                false
            }
        };
        if expired {
            self.running = false;
            return Some(ClockTick::Expired);
        }
        Some(ClockTick::Running(self.seconds))
    }

    pub fn view(&self) -> ClockView {
        match self.mode {
            ClockMode::CountDown => ClockView::Remaining {
                seconds: self.seconds,
            },
            ClockMode::CountUp => ClockView::Elapsed {
                seconds: self.seconds,
            },
        }
    }
}
