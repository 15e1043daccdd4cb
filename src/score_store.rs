use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{BestScoreEntry, GameId, ScoreBoardResponse};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct StoredBestScore {
    #[serde(rename = "bestScore", alias = "best_score")]
    best_score: u64,
    #[serde(default)]
    rounds: u64,
    #[serde(rename = "updatedAtMs", alias = "updated_at_ms", default)]
    updated_at_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct ScoreStoreFile {
    version: u8,
    games: BTreeMap<GameId, StoredBestScore>,
}

#[derive(Clone, Debug, Deserialize)]
struct ScoreStoreFileRaw {
    version: u8,
    games: BTreeMap<String, serde_json::Value>,
}

pub struct ScoreStore {
    file_path: Option<PathBuf>,
    games: BTreeMap<GameId, StoredBestScore>,
}

impl ScoreStore {
    pub fn new(file_path: PathBuf) -> Self {
        let games = load_games(&file_path);
        Self {
            file_path: Some(file_path),
            games,
        }
    }

    pub fn in_memory() -> Self {
        Self {
            file_path: None,
            games: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, game: GameId, score: u64) {
        let now_ms = now_ms();
        let current = self.games.entry(game).or_default();
        current.rounds += 1;
        if score > current.best_score {
            debug!(%game, previous = current.best_score, score, "new best score");
            current.best_score = score;
            current.updated_at_ms = now_ms;
        }
        self.save();
    }

    pub fn build_response(&self) -> ScoreBoardResponse {
        ScoreBoardResponse {
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            entries: GameId::ALL
                .iter()
                .map(|&game| {
                    let stored = self.games.get(&game).cloned().unwrap_or_default();
                    BestScoreEntry {
                        game,
                        best_score: stored.best_score,
                        rounds: stored.rounds,
                        updated_at_ms: stored.updated_at_ms,
                    }
                })
                .collect(),
        }
    }

    fn save(&self) {
        let Some(file_path) = &self.file_path else {
            return;
        };
        if let Some(parent) = file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                warn!(path = %parent.display(), %error, "failed to create score store dir");
                return;
            }
        }

        let payload = ScoreStoreFile {
            version: 1,
            games: self.games.clone(),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(file_path, text) {
                    warn!(path = %file_path.display(), %error, "failed to write score store");
                }
            }
            Err(error) => {
                warn!(path = %file_path.display(), %error, "failed to serialize score store");
            }
        }
    }
}

fn load_games(path: &Path) -> BTreeMap<GameId, StoredBestScore> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), %error, "failed to read score store");
            }
            return BTreeMap::new();
        }
    };
    let parsed = match serde_json::from_str::<ScoreStoreFileRaw>(&text) {
        Ok(value) if value.version == 1 => value,
        Ok(value) => {
            warn!(
                path = %path.display(),
                version = value.version,
                "unsupported score store version"
            );
            return BTreeMap::new();
        }
        Err(error) => {
            warn!(path = %path.display(), %error, "failed to parse score store");
            return BTreeMap::new();
        }
    };

    let mut games = BTreeMap::new();
    for (raw_key, raw_value) in parsed.games {
        let Some(game) = GameId::parse(raw_key.trim()) else {
            warn!(key = %raw_key, "skipping unknown game in score store");
            continue;
        };
        match serde_json::from_value::<StoredBestScore>(raw_value) {
            Ok(entry) => {
                games.insert(game, entry);
            }
            Err(error) => {
                warn!(key = %raw_key, %error, "skipping invalid score entry");
            }
        }
    }
    games
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let unique = format!(
            "{}-{}-{}",
            name,
            std::process::id(),
            now_ms().saturating_add(rand::random::<u32>() as u64)
        );
        std::env::temp_dir().join(unique).join("scores.json")
    }

    fn best(store: &ScoreStore, game: GameId) -> u64 {
        store.games.get(&game).map_or(0, |entry| entry.best_score)
    }

    #[test]
    fn record_keeps_maximum_per_game() {
        let mut store = ScoreStore::in_memory();
        store.record(GameId::SkibidiDodge, 300);
        store.record(GameId::SkibidiDodge, 120);
        store.record(GameId::MewingMaster, 40);

        assert_eq!(best(&store, GameId::SkibidiDodge), 300);
        assert_eq!(best(&store, GameId::MewingMaster), 40);
        assert_eq!(best(&store, GameId::ChargerChallenge), 0);

        let response = store.build_response();
        assert_eq!(response.entries.len(), 3);
        let dodge = response
            .entries
            .iter()
            .find(|entry| entry.game == GameId::SkibidiDodge)
            .expect("dodge entry exists");
        assert_eq!(dodge.rounds, 2);
        assert_eq!(dodge.best_score, 300);
    }

    #[test]
    fn scores_survive_reload() {
        let path = temp_file("score-store-reload");
        let mut store = ScoreStore::new(path.clone());
        store.record(GameId::ChargerChallenge, 200);
        drop(store);

        let mut reloaded = ScoreStore::new(path.clone());
        assert_eq!(best(&reloaded, GameId::ChargerChallenge), 200);
        reloaded.record(GameId::ChargerChallenge, 50);
        assert_eq!(best(&reloaded, GameId::ChargerChallenge), 200);

        let _ = fs::remove_file(&path);
        if let Some(parent) = path.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    #[test]
    fn load_skips_unknown_and_invalid_entries() {
        let path = temp_file("score-store-partial");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        let raw = r#"{
  "version": 1,
  "games": {
    "skibidi_dodge": { "bestScore": 900, "rounds": 4, "updatedAtMs": 10 },
    "mewing_master": { "bestScore": -3, "rounds": 1, "updatedAtMs": 10 },
    "tetris": { "bestScore": 1, "rounds": 1, "updatedAtMs": 10 }
  }
}"#;
        fs::write(&path, raw).expect("write file");

        let store = ScoreStore::new(path.clone());
        assert_eq!(best(&store, GameId::SkibidiDodge), 900);
        assert_eq!(best(&store, GameId::MewingMaster), 0);

        let _ = fs::remove_file(&path);
        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn unsupported_version_starts_empty() {
        let path = temp_file("score-store-version");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        fs::write(&path, r#"{"version":2,"games":{}}"#).expect("write file");

        let store = ScoreStore::new(path.clone());
        assert_eq!(best(&store, GameId::SkibidiDodge), 0);

        let _ = fs::remove_dir_all(&parent);
    }

    #[test]
    fn entry_without_round_count_keeps_best_score() {
        let path = temp_file("score-store-legacy");
        let parent = path.parent().expect("parent exists").to_path_buf();
        fs::create_dir_all(&parent).expect("create dir");
        fs::write(
            &path,
            r#"{"version":1,"games":{"charger_challenge":{"bestScore":420}}}"#,
        )
        .expect("write file");

        let mut store = ScoreStore::new(path.clone());
        assert_eq!(best(&store, GameId::ChargerChallenge), 420);
        store.record(GameId::ChargerChallenge, 100);
        let entry = store
            .build_response()
            .entries
            .into_iter()
            .find(|entry| entry.game == GameId::ChargerChallenge)
            .expect("charger entry exists");
        assert_eq!(entry.best_score, 420);
        assert_eq!(entry.rounds, 1);

        let _ = fs::remove_dir_all(&parent);
    }
}
