use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::ConfigError;
use crate::types::{GameId, SignalKind};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum TargetPolicy {
    Fixed { value: f32 },
    Random { spread: f32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AlignmentRules {
    pub signal_interval_ms: u64,
    pub walk_step: f32,
    pub target: TargetPolicy,
    pub threshold: f32,
    pub progress_gain: u32,
    pub progress_decay: u32,
    pub score_per_tick: u64,
    pub duration_secs: u32,
}

impl Default for AlignmentRules {
    fn default() -> Self {
        Self {
            signal_interval_ms: ALIGN_SIGNAL_MS,
            walk_step: ALIGN_WALK_STEP,
            target: TargetPolicy::Random {
                spread: ALIGN_TARGET_SPREAD,
            },
            threshold: ALIGN_THRESHOLD,
            progress_gain: ALIGN_PROGRESS_GAIN,
            progress_decay: ALIGN_PROGRESS_DECAY,
            score_per_tick: ALIGN_SCORE_PER_TICK,
            duration_secs: ALIGN_DURATION_SECS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AvoidanceRules {
    pub signal_interval_ms: u64,
    pub violation_chance: f32,
    pub max_strikes: u32,
    pub score_per_second: u64,
    pub duration_secs: u32,
}

impl Default for AvoidanceRules {
    fn default() -> Self {
        Self {
            signal_interval_ms: AVOID_SIGNAL_MS,
            violation_chance: AVOID_VIOLATION_CHANCE,
            max_strikes: AVOID_MAX_STRIKES,
            score_per_second: AVOID_SCORE_PER_SECOND,
            duration_secs: AVOID_DURATION_SECS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayArea {
    pub width: f32,
    pub height: f32,
    pub entity_size: f32,
    pub player_width: f32,
    pub hit_zone_top_offset: f32,
    pub hit_zone_bottom_offset: f32,
}

impl Default for PlayArea {
    fn default() -> Self {
        Self {
            width: PLAY_AREA_WIDTH,
            height: PLAY_AREA_HEIGHT,
            entity_size: ENTITY_SIZE,
            player_width: PLAYER_WIDTH,
            hit_zone_top_offset: HIT_ZONE_TOP_OFFSET,
            hit_zone_bottom_offset: HIT_ZONE_BOTTOM_OFFSET,
        }
    }
}

impl PlayArea {
    pub fn player_x(&self, signal: f32) -> f32 {
        let half = self.width / 2.0;
        half + signal.clamp(POSITION_MIN, POSITION_MAX) * (half - self.player_width).max(0.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DodgeRules {
    pub signal_interval_ms: u64,
    pub walk_step: f32,
    pub collision_interval_ms: u64,
    pub score_interval_ms: u64,
    pub cleanup_interval_ms: u64,
    pub score_per_tick: u64,
    pub lives: u32,
    pub difficulty_step: u64,
    pub max_difficulty: u32,
    pub spawn_base_ms: u64,
    pub spawn_step_ms: u64,
    pub spawn_floor_ms: u64,
    pub fall_base_ms: u64,
    pub fall_step_ms: u64,
    pub fall_floor_ms: u64,
    pub time_limit_secs: Option<u32>,
    pub area: PlayArea,
}

impl Default for DodgeRules {
    fn default() -> Self {
        Self {
            signal_interval_ms: DODGE_SIGNAL_MS,
            walk_step: DODGE_WALK_STEP,
            collision_interval_ms: DODGE_COLLISION_MS,
            score_interval_ms: DODGE_SCORE_MS,
            cleanup_interval_ms: DODGE_CLEANUP_MS,
            score_per_tick: DODGE_SCORE_PER_TICK,
            lives: DODGE_LIVES,
            difficulty_step: DODGE_DIFFICULTY_STEP,
            max_difficulty: DODGE_MAX_DIFFICULTY,
            spawn_base_ms: DODGE_SPAWN_BASE_MS,
            spawn_step_ms: DODGE_SPAWN_STEP_MS,
            spawn_floor_ms: DODGE_SPAWN_FLOOR_MS,
            fall_base_ms: DODGE_FALL_BASE_MS,
            fall_step_ms: DODGE_FALL_STEP_MS,
            fall_floor_ms: DODGE_FALL_FLOOR_MS,
            time_limit_secs: None,
            area: PlayArea::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum GameRules {
    Alignment(AlignmentRules),
    Avoidance(AvoidanceRules),
    Dodge(DodgeRules),
}

impl GameRules {
    pub fn signal_kind(&self) -> SignalKind {
        match self {
            Self::Alignment(_) | Self::Dodge(_) => SignalKind::Position,
            Self::Avoidance(_) => SignalKind::Violation,
        }
    }

    pub fn signal_interval_ms(&self) -> u64 {
        match self {
            Self::Alignment(rules) => rules.signal_interval_ms,
            Self::Avoidance(rules) => rules.signal_interval_ms,
            Self::Dodge(rules) => rules.signal_interval_ms,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesBook {
    pub charger_challenge: AlignmentRules,
    pub mewing_master: AvoidanceRules,
    pub skibidi_dodge: DodgeRules,
}

impl RulesBook {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let book: RulesBook = serde_json::from_str(text)?;
        book.validate()?;
        Ok(book)
    }

    pub fn rules_for(&self, game: GameId) -> GameRules {
        match game {
            GameId::ChargerChallenge => GameRules::Alignment(self.charger_challenge.clone()),
            GameId::MewingMaster => GameRules::Avoidance(self.mewing_master.clone()),
            GameId::SkibidiDodge => GameRules::Dodge(self.skibidi_dodge.clone()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let align = &self.charger_challenge;
        require(align.signal_interval_ms > 0, "charger_challenge.signalIntervalMs must be > 0")?;
        require(
            align.threshold.is_finite() && align.threshold > 0.0,
            "charger_challenge.threshold must be a positive number",
        )?;
        require(align.progress_gain > 0, "charger_challenge.progressGain must be > 0")?;
        require(align.duration_secs > 0, "charger_challenge.durationSecs must be > 0")?;
        if let TargetPolicy::Fixed { value } = align.target {
            require(
                (POSITION_MIN..=POSITION_MAX).contains(&value),
                "charger_challenge.target.value must be within [-1, 1]",
            )?;
        }

        let avoid = &self.mewing_master;
        require(avoid.signal_interval_ms > 0, "mewing_master.signalIntervalMs must be > 0")?;
        require(
            (0.0..=1.0).contains(&avoid.violation_chance),
            "mewing_master.violationChance must be within [0, 1]",
        )?;
        require(avoid.max_strikes > 0, "mewing_master.maxStrikes must be > 0")?;
        require(avoid.duration_secs > 0, "mewing_master.durationSecs must be > 0")?;

        let dodge = &self.skibidi_dodge;
        for (value, name) in [
            (dodge.signal_interval_ms, "signalIntervalMs"),
            (dodge.collision_interval_ms, "collisionIntervalMs"),
            (dodge.score_interval_ms, "scoreIntervalMs"),
            (dodge.cleanup_interval_ms, "cleanupIntervalMs"),
            (dodge.spawn_floor_ms, "spawnFloorMs"),
            (dodge.fall_floor_ms, "fallFloorMs"),
            (dodge.difficulty_step, "difficultyStep"),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "skibidi_dodge.{name} must be > 0"
                )));
            }
        }
        require(dodge.lives > 0, "skibidi_dodge.lives must be > 0")?;
        require(dodge.max_difficulty >= 1, "skibidi_dodge.maxDifficulty must be >= 1")?;
        let area = dodge.area;
        require(
            area.width > area.entity_size && area.height > area.hit_zone_top_offset,
            "skibidi_dodge.area is too small",
        )?;
        require(
            area.hit_zone_top_offset > area.hit_zone_bottom_offset,
            "skibidi_dodge.area hit zone top must lie above its bottom",
        )?;
        Ok(())
    }
}

fn require(condition: bool, message: &str) -> Result<(), ConfigError> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::Invalid(message.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub score_db_path: PathBuf,
    pub static_dir: Option<PathBuf>,
    pub rules_path: Option<PathBuf>,
    pub tick_ms: u64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            None => 8080,
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Env {
                name: "PORT",
                value,
            })?,
        };
        let tick_ms = match lookup("TICK_MS") {
            None => SERVER_TICK_MS,
            Some(value) => match value.parse::<u64>() {
                Ok(parsed) if parsed > 0 => parsed,
                _ => return Err(ConfigError::Env { name: "TICK_MS", value }),
            },
        };
        Ok(Self {
            port,
            score_db_path: lookup("SCORE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".data/scores.json")),
            static_dir: lookup("STATIC_DIR").map(PathBuf::from),
            rules_path: lookup("RULES_PATH").map(PathBuf::from),
            tick_ms,
        })
    }

    pub fn load_rules(&self) -> Result<RulesBook, ConfigError> {
        match &self.rules_path {
            Some(path) => RulesBook::load(path),
            None => Ok(RulesBook::default()),
        }
    }
}
