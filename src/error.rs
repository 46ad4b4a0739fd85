use thiserror::Error;

/// Upstream collaborators handed the aggregation something it must never see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error("combined bet {bet_id} has {legs} leg(s), at least 2 required")]
    CombinedBetTooFewLegs { bet_id: String, legs: usize },
    #[error("unknown wager type {0:?}")]
    UnknownWagerType(String),
    #[error("bet {bet_id} is still pending")]
    UnsettledBet { bet_id: String },
}
