use std::path::PathBuf;

use crate::types::SignalKind;

pub fn permission_block_reason(kind: SignalKind) -> String {
    match kind {
        SignalKind::Position => "camera access is needed to track your head".to_string(),
        SignalKind::Violation => "camera access is needed to track your face".to_string(),
    }
}

pub fn resolve_static_dir(configured: Option<PathBuf>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("dist/client"), PathBuf::from("../dist/client")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

pub fn session_seed(session_seq: u64, entropy: u32) -> u32 {
    let mixed = session_seq
        .wrapping_mul(0x9e37_79b9_7f4a_7c15)
        .rotate_left(17)
        ^ entropy as u64;
    (mixed ^ (mixed >> 32)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_seed_varies_by_sequence() {
        assert_ne!(session_seed(1, 7), session_seed(2, 7));
        assert_eq!(session_seed(3, 7), session_seed(3, 7));
    }

    #[test]
    fn missing_static_dir_is_ignored() {
        let missing = std::env::temp_dir().join("minigame-engine-no-such-dir");
        assert_eq!(resolve_static_dir(Some(missing)), None);
    }

    #[test]
    fn block_reason_mentions_camera() {
        assert!(permission_block_reason(SignalKind::Position).contains("camera"));
        assert!(permission_block_reason(SignalKind::Violation).contains("camera"));
    }
}
