use tracing::debug;

use super::*;
use crate::collision::{entity_rect, entity_top, fall_progress, has_exited, hit_zone};
use crate::config::{DodgeRules, PlayArea};
use crate::constants::DODGE_SKIN_COUNT;
use crate::rng::Rng;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnProposal {
    pub x: f32,
    pub fall_duration_ms: u64,
    pub skin: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FallingEntity {
    pub id: u64,
    pub x: f32,
    pub spawned_at_ms: u64,
    pub fall_duration_ms: u64,
    pub skin: u8,
}

impl FallingEntity {
    pub fn top(&self, area: &PlayArea, now_ms: u64) -> f32 {
        entity_top(
            area,
            fall_progress(now_ms, self.spawned_at_ms, self.fall_duration_ms),
        )
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SpawnScheduler {
    spawn_base_ms: u64,
    spawn_step_ms: u64,
    spawn_floor_ms: u64,
    fall_base_ms: u64,
    fall_step_ms: u64,
    fall_floor_ms: u64,
    area: PlayArea,
}

impl SpawnScheduler {
    pub fn from_rules(rules: &DodgeRules) -> Self {
        Self {
            spawn_base_ms: rules.spawn_base_ms,
            spawn_step_ms: rules.spawn_step_ms,
            spawn_floor_ms: rules.spawn_floor_ms,
            fall_base_ms: rules.fall_base_ms,
            fall_step_ms: rules.fall_step_ms,
            fall_floor_ms: rules.fall_floor_ms,
            area: rules.area,
        }
    }

    pub fn next_spawn_delay_ms(&self, difficulty: u32) -> u64 {
        self.spawn_base_ms
            .saturating_sub(difficulty as u64 * self.spawn_step_ms)
            .max(self.spawn_floor_ms)
    }

    pub fn fall_duration_ms(&self, difficulty: u32) -> u64 {
        self.fall_base_ms
            .saturating_sub(difficulty as u64 * self.fall_step_ms)
            .max(self.fall_floor_ms)
    }

    pub fn propose(&self, difficulty: u32, rng: &mut Rng) -> SpawnProposal {
        SpawnProposal {
            x: rng.range(0.0, self.area.width - self.area.entity_size),
            fall_duration_ms: self.fall_duration_ms(difficulty),
            skin: rng.pick_index(DODGE_SKIN_COUNT as usize) as u8,
        }
    }
}

impl RoundEngine {
    pub(super) fn spawn_entity(&mut self, at_ms: u64) {
        let Some(scheduler) = self.spawner else {
            return;
        };
        let difficulty = self.round.ledger.current_difficulty();
        let proposal = scheduler.propose(difficulty, &mut self.rng);
        self.insert_entity(proposal, at_ms);
        self.timers.reschedule(
            TaskKind::Spawn,
            at_ms.saturating_add(scheduler.next_spawn_delay_ms(difficulty)),
        );
    }

    pub(super) fn insert_entity(&mut self, proposal: SpawnProposal, at_ms: u64) -> u64 {
        let id = self.round.next_entity_id;
        self.round.next_entity_id += 1;
        self.round.entities.push(FallingEntity {
            id,
            x: proposal.x,
            spawned_at_ms: at_ms,
            fall_duration_ms: proposal.fall_duration_ms,
            skin: proposal.skin,
        });
        debug!(id, x = proposal.x, fall_ms = proposal.fall_duration_ms, "entity spawned");
        id
    }

    pub(super) fn resolve_entity_collisions(&mut self, at_ms: u64) {
        let GameRules::Dodge(rules) = &self.rules else {
            return;
        };
        let area = rules.area;
        let zone = hit_zone(&area, area.player_x(self.round.signal_position()));

        let mut hits = Vec::new();
        self.round.entities.retain(|entity| {
            let top = entity.top(&area, at_ms);
            if has_exited(&area, top) {
                return false;
            }
            if entity_rect(&area, entity.x, top).overlaps(&zone) {
                hits.push(entity.id);
                return false;
            }
            true
        });

        for entity_id in hits {
            let RoundMeter::Lives { remaining, .. } = &mut self.round.meter else {
                return;
            };
            *remaining = remaining.saturating_sub(1);
            let lives_left = *remaining;
            self.events.push(RoundEvent::Hit {
                entity_id,
                lives_left,
            });
            debug!(entity_id, lives_left, "player hit");
            if lives_left == 0 {
                self.finish(RoundState::Lost, TerminalReason::OutOfLives);
                return;
            }
        }
    }

    pub(super) fn remove_exited_entities(&mut self, at_ms: u64) {
        let GameRules::Dodge(rules) = &self.rules else {
            return;
        };
        let area = rules.area;
        self.round
            .entities
            .retain(|entity| !has_exited(&area, entity.top(&area, at_ms)));
    }
}
