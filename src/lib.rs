pub mod clock;
pub mod collaborators;
pub mod collision;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod rng;
pub mod score_store;
pub mod server_protocol;
pub mod server_utils;
pub mod signal;
pub mod types;
