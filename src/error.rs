use std::io;
use std::path::PathBuf;

use crate::types::RoundState;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum EngineError {
    #[error("cannot {action} while round is {from:?}")]
    InvalidTransition { action: &'static str, from: RoundState },

    #[error("signal source unavailable: {0}")]
    SignalUnavailable(String),

    #[error("engine has exited")]
    Exited,
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse rules: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid rules: {0}")]
    Invalid(String),

    #[error("invalid environment variable {name}: {value}")]
    Env { name: &'static str, value: String },
}
