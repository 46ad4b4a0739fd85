//! Bet suggestion scoring: aggregate a bettor's finished bets, enrich the
//! day's fixtures with recent form and head-to-head data from a match
//! provider, and rank the fixtures by how confident a suggestion can be.

pub mod api_football;
pub mod bets;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod form;
pub mod head_to_head;
pub mod history;
pub mod http_cache;
pub mod http_client;
pub mod performance;
pub mod provider;
pub mod ranker;
pub mod scorer;
pub mod service;

pub use error::ContractError;
pub use service::{RefreshOutcome, SuggestionService};
