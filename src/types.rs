use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameId {
    ChargerChallenge,
    MewingMaster,
    SkibidiDodge,
}

impl GameId {
    pub const ALL: [GameId; 3] = [
        GameId::ChargerChallenge,
        GameId::MewingMaster,
        GameId::SkibidiDodge,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "charger_challenge" => Some(Self::ChargerChallenge),
            "mewing_master" => Some(Self::MewingMaster),
            "skibidi_dodge" => Some(Self::SkibidiDodge),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChargerChallenge => "charger_challenge",
            Self::MewingMaster => "mewing_master",
            Self::SkibidiDodge => "skibidi_dodge",
        }
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundState {
    Waiting,
    Playing,
    Won,
    Lost,
}

impl RoundState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    Charged,
    TimeExpired,
    StrikedOut,
    Survived,
    OutOfLives,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SignalValue {
    Position(f32),
    Violation(bool),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Position,
    Violation,
}

impl SignalValue {
    pub fn kind(self) -> SignalKind {
        match self {
            Self::Position(_) => SignalKind::Position,
            Self::Violation(_) => SignalKind::Violation,
        }
    }

    pub fn resting(kind: SignalKind) -> Self {
        match kind {
            SignalKind::Position => Self::Position(0.0),
            SignalKind::Violation => Self::Violation(false),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ClockView {
    Remaining { seconds: u32 },
    Elapsed { seconds: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MeterView {
    Progress { value: u32, max: u32 },
    Strikes { count: u32, max: u32, streak: u32 },
    Lives { remaining: u32, max: u32 },
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityView {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub skin: u8,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoundView {
    pub game: GameId,
    pub state: RoundState,
    pub score: u64,
    pub clock: ClockView,
    pub signal: SignalValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f32>,
    #[serde(rename = "playerX", skip_serializing_if = "Option::is_none")]
    pub player_x: Option<f32>,
    pub meter: MeterView,
    pub difficulty: u32,
    pub entities: Vec<EntityView>,
    #[serde(rename = "showSummary")]
    pub show_summary: bool,
    #[serde(rename = "interstitialPending")]
    pub interstitial_pending: bool,
    #[serde(rename = "blockedReason", skip_serializing_if = "Option::is_none")]
    pub blocked_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoundEvent {
    Started {
        game: GameId,
        #[serde(rename = "atMs")]
        at_ms: u64,
    },
    Strike {
        count: u32,
    },
    Hit {
        #[serde(rename = "entityId")]
        entity_id: u64,
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    DifficultyRaised {
        level: u32,
    },
    Finished {
        outcome: RoundState,
        reason: TerminalReason,
        score: u64,
    },
    InterstitialRequested,
    Reset,
}

#[derive(Clone, Debug, Serialize)]
pub struct RoundSummary {
    pub game: GameId,
    pub outcome: RoundState,
    pub reason: TerminalReason,
    pub score: u64,
    pub difficulty: u32,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct BestScoreEntry {
    pub game: GameId,
    #[serde(rename = "bestScore")]
    pub best_score: u64,
    pub rounds: u64,
    #[serde(rename = "updatedAtMs")]
    pub updated_at_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ScoreBoardResponse {
    #[serde(rename = "generatedAtIso")]
    pub generated_at_iso: String,
    pub entries: Vec<BestScoreEntry>,
}
