use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ContractError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum WagerType {
    HomeWin,
    AwayWin,
    Draw,
    HomeOrDraw,
    AwayOrDraw,
    HomeOrAway,
    OverGoals,
    UnderGoals,
    BothTeamsScore,
    BothTeamsNotScore,
    Other,
}

impl WagerType {
    pub const ALL: [WagerType; 11] = [
        WagerType::HomeWin,
        WagerType::AwayWin,
        WagerType::Draw,
        WagerType::HomeOrDraw,
        WagerType::AwayOrDraw,
        WagerType::HomeOrAway,
        WagerType::OverGoals,
        WagerType::UnderGoals,
        WagerType::BothTeamsScore,
        WagerType::BothTeamsNotScore,
        WagerType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            WagerType::HomeWin => "home_win",
            WagerType::AwayWin => "away_win",
            WagerType::Draw => "draw",
            WagerType::HomeOrDraw => "home_or_draw",
            WagerType::AwayOrDraw => "away_or_draw",
            WagerType::HomeOrAway => "home_or_away",
            WagerType::OverGoals => "over_goals",
            WagerType::UnderGoals => "under_goals",
            WagerType::BothTeamsScore => "both_teams_score",
            WagerType::BothTeamsNotScore => "both_teams_not_score",
            WagerType::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WagerType::HomeWin => "Home win",
            WagerType::AwayWin => "Away win",
            WagerType::Draw => "Draw",
            WagerType::HomeOrDraw => "Home or draw",
            WagerType::AwayOrDraw => "Away or draw",
            WagerType::HomeOrAway => "Home or away",
            WagerType::OverGoals => "Over goals",
            WagerType::UnderGoals => "Under goals",
            WagerType::BothTeamsScore => "Both teams score",
            WagerType::BothTeamsNotScore => "Both teams do not score",
            WagerType::Other => "Other",
        }
    }
}

impl fmt::Display for WagerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WagerType {
    type Err = ContractError;

    /// Accepts the snake_case names plus the short codes bet slips commonly use.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = raw.trim().to_ascii_lowercase();
        let wager = match key.as_str() {
            "home_win" | "1" => WagerType::HomeWin,
            "away_win" | "2" => WagerType::AwayWin,
            "draw" | "x" => WagerType::Draw,
            "home_or_draw" | "1x" => WagerType::HomeOrDraw,
            "away_or_draw" | "x2" => WagerType::AwayOrDraw,
            "home_or_away" | "12" => WagerType::HomeOrAway,
            "over_goals" | "over" => WagerType::OverGoals,
            "under_goals" | "under" => WagerType::UnderGoals,
            "both_teams_score" | "btts_yes" => WagerType::BothTeamsScore,
            "both_teams_not_score" | "btts_no" => WagerType::BothTeamsNotScore,
            "other" => WagerType::Other,
            _ => return Err(ContractError::UnknownWagerType(raw.to_string())),
        };
        Ok(wager)
    }
}

impl TryFrom<String> for WagerType {
    type Error = ContractError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetOutcome {
    Won,
    Lost,
    Pending,
    Void,
}

impl BetOutcome {
    pub fn is_decided(self) -> bool {
        matches!(self, BetOutcome::Won | BetOutcome::Lost)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishedBet {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub championship: String,
    pub wager: WagerType,
    pub outcome: BetOutcome,
    pub stake: f64,
    pub payout: f64,
    pub odds: f64,
    pub placed_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetLeg {
    pub home_team: String,
    pub away_team: String,
    pub championship: String,
    pub wager: WagerType,
    #[serde(default)]
    pub odds: Option<f64>,
}

/// A parlay: one stake, one payout and one outcome shared by every leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedBet {
    pub id: String,
    pub legs: Vec<BetLeg>,
    pub outcome: BetOutcome,
    pub stake: f64,
    pub payout: f64,
    pub odds: f64,
    pub placed_on: NaiveDate,
}

impl CombinedBet {
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.legs.len() < 2 {
            return Err(ContractError::CombinedBetTooFewLegs {
                bet_id: self.id.clone(),
                legs: self.legs.len(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinishedBets {
    #[serde(default)]
    pub simple: Vec<FinishedBet>,
    #[serde(default)]
    pub combined: Vec<CombinedBet>,
}

impl FinishedBets {
    pub fn is_empty(&self) -> bool {
        self.simple.is_empty() && self.combined.is_empty()
    }

    /// Drops pending bets, which never belong in aggregation inputs.
    pub fn settled_only(mut self) -> Self {
        self.simple.retain(|b| b.outcome != BetOutcome::Pending);
        self.combined.retain(|b| b.outcome != BetOutcome::Pending);
        self
    }
}

/// Read access to a wallet's finished bets.
pub trait BetStore: Send + Sync {
    fn finished_bets(&self, wallet_id: &str) -> Result<FinishedBets>;
}

/// Bets kept in a JSON file: either a single `FinishedBets` object shared by
/// every wallet, or a map of wallet id to `FinishedBets`.
#[derive(Debug, Clone)]
pub struct JsonBetStore {
    path: PathBuf,
}

impl JsonBetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BetFile {
    Single(FinishedBets),
    Wallets(HashMap<String, FinishedBets>),
}

impl BetStore for JsonBetStore {
    fn finished_bets(&self, wallet_id: &str) -> Result<FinishedBets> {
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("failed reading bets from {}", self.path.display()))?;
        parse_bets_json(&raw, wallet_id)
    }
}

pub fn parse_bets_json(raw: &str, wallet_id: &str) -> Result<FinishedBets> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(FinishedBets::default());
    }
    let file: BetFile = serde_json::from_str(trimmed).context("invalid bets json")?;
    let bets = match file {
        BetFile::Single(bets) => bets,
        BetFile::Wallets(mut wallets) => wallets.remove(wallet_id).unwrap_or_default(),
    };
    Ok(bets.settled_only())
}
