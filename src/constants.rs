pub const SERVER_TICK_MS: u64 = 50;
pub const CLOCK_PERIOD_MS: u64 = 1_000;

pub const POSITION_MIN: f32 = -1.0;
pub const POSITION_MAX: f32 = 1.0;

// Alignment (charger challenge)
pub const ALIGN_SIGNAL_MS: u64 = 100;
pub const ALIGN_WALK_STEP: f32 = 0.2;
pub const ALIGN_TARGET_SPREAD: f32 = 1.5;
pub const ALIGN_THRESHOLD: f32 = 0.15;
pub const ALIGN_PROGRESS_GAIN: u32 = 5;
pub const ALIGN_PROGRESS_DECAY: u32 = 2;
pub const ALIGN_PROGRESS_MAX: u32 = 100;
pub const ALIGN_SCORE_PER_TICK: u64 = 10;
pub const ALIGN_DURATION_SECS: u32 = 30;

// Avoidance (mewing master)
pub const AVOID_SIGNAL_MS: u64 = 500;
pub const AVOID_VIOLATION_CHANCE: f32 = 0.05;
pub const AVOID_MAX_STRIKES: u32 = 3;
pub const AVOID_SCORE_PER_SECOND: u64 = 10;
pub const AVOID_DURATION_SECS: u32 = 60;

// Dodge (skibidi dodge)
pub const DODGE_SIGNAL_MS: u64 = 100;
pub const DODGE_WALK_STEP: f32 = 0.3;
pub const DODGE_COLLISION_MS: u64 = 50;
pub const DODGE_SCORE_MS: u64 = 100;
pub const DODGE_CLEANUP_MS: u64 = 1_000;
pub const DODGE_SCORE_PER_TICK: u64 = 10;
pub const DODGE_LIVES: u32 = 3;
pub const DODGE_DIFFICULTY_STEP: u64 = 500;
pub const DODGE_MAX_DIFFICULTY: u32 = 10;
pub const DODGE_SPAWN_BASE_MS: u64 = 1_500;
pub const DODGE_SPAWN_STEP_MS: u64 = 100;
pub const DODGE_SPAWN_FLOOR_MS: u64 = 500;
pub const DODGE_FALL_BASE_MS: u64 = 3_000;
pub const DODGE_FALL_STEP_MS: u64 = 200;
pub const DODGE_FALL_FLOOR_MS: u64 = 600;
pub const DODGE_SKIN_COUNT: u8 = 8;

pub const PLAY_AREA_WIDTH: f32 = 390.0;
pub const PLAY_AREA_HEIGHT: f32 = 844.0;
pub const ENTITY_SIZE: f32 = 50.0;
pub const PLAYER_WIDTH: f32 = 60.0;
pub const HIT_ZONE_TOP_OFFSET: f32 = 150.0;
pub const HIT_ZONE_BOTTOM_OFFSET: f32 = 100.0;
