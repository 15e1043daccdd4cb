use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// declaration order breaks ties between tasks due at the same instant
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    Signal,
    Clock,
    Score,
    Spawn,
    Collision,
    Cleanup,
}

#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Clone, Debug)]
struct PeriodicTask {
    kind: TaskKind,
    // zero: the owner reschedules after each firing
    period_ms: u64,
    next_due_ms: Option<u64>,
}

#[derive(Debug, Default)]
pub struct RoundTimers {
    token: Option<CancelToken>,
    tasks: Vec<PeriodicTask>,
}

impl RoundTimers {
    pub fn arm(&mut self) -> CancelToken {
        self.cancel();
        let token = CancelToken::new();
        self.token = Some(token.clone());
        token
    }

    pub fn every(&mut self, kind: TaskKind, period_ms: u64, now_ms: u64) {
        let period_ms = period_ms.max(1);
        self.insert(PeriodicTask {
            kind,
            period_ms,
            next_due_ms: Some(now_ms.saturating_add(period_ms)),
        });
    }

    pub fn after(&mut self, kind: TaskKind, delay_ms: u64, now_ms: u64) {
        self.insert(PeriodicTask {
            kind,
            period_ms: 0,
            next_due_ms: Some(now_ms.saturating_add(delay_ms.max(1))),
        });
    }

    fn insert(&mut self, task: PeriodicTask) {
        if !self.is_live() {
            return;
        }
        self.tasks.retain(|existing| existing.kind != task.kind);
        self.tasks.push(task);
    }

    pub fn reschedule(&mut self, kind: TaskKind, due_ms: u64) {
        if let Some(task) = self.tasks.iter_mut().find(|task| task.kind == kind) {
            task.next_due_ms = Some(due_ms);
        }
    }

    pub fn next_due(&self, limit_ms: u64) -> Option<(TaskKind, u64)> {
        if !self.is_live() {
            return None;
        }
        self.tasks
            .iter()
            .filter_map(|task| task.next_due_ms.map(|due| (due, task.kind)))
            .filter(|(due, _)| *due <= limit_ms)
            .min()
            .map(|(due, kind)| (kind, due))
    }

    pub fn fire(&mut self, kind: TaskKind) -> bool {
        if !self.is_live() {
            return false;
        }
        let Some(task) = self.tasks.iter_mut().find(|task| task.kind == kind) else {
            return false;
        };
        task.next_due_ms = match (task.period_ms, task.next_due_ms) {
            (0, _) => None,
            (period, Some(due)) => Some(due.saturating_add(period)),
            (_, None) => None,
        };
        true
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        self.tasks.clear();
    }

    pub fn is_live(&self) -> bool {
        self.token
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    pub fn token(&self) -> Option<CancelToken> {
        self.token.clone()
    }

    pub fn active_tasks(&self) -> usize {
        if self.is_live() {
            self.tasks.len()
        } else {
            0
        }
    }
}
