use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueRef {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    NotStarted,
    Live,
    Finished,
    Postponed,
    Cancelled,
    Awarded,
    Other(String),
}

impl MatchStatus {
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "NS" | "TBD" => MatchStatus::NotStarted,
            "1H" | "HT" | "2H" | "ET" | "BT" | "P" | "SUSP" | "INT" | "LIVE" => MatchStatus::Live,
            "FT" | "AET" | "PEN" => MatchStatus::Finished,
            "PST" => MatchStatus::Postponed,
            "CANC" | "ABD" => MatchStatus::Cancelled,
            "AWD" | "WO" => MatchStatus::Awarded,
            other => MatchStatus::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: u64,
    pub kickoff: String,
    pub status: MatchStatus,
    pub league: LeagueRef,
    pub home: TeamRef,
    pub away: TeamRef,
    #[serde(default)]
    pub home_goals: Option<u8>,
    #[serde(default)]
    pub away_goals: Option<u8>,
}

impl Match {
    pub fn is_upcoming(&self) -> bool {
        self.status == MatchStatus::NotStarted
    }

    pub fn score(&self) -> Option<(u8, u8)> {
        Some((self.home_goals?, self.away_goals?))
    }
}

/// Fixture and results source. Implementations may be rate limited.
pub trait MatchProvider: Send + Sync {
    fn matches_for_date(&self, date: NaiveDate) -> Result<Vec<Match>>;
    fn recent_matches(&self, team_id: u32, count: usize) -> Result<Vec<Match>>;
    fn head_to_head(&self, team_a: u32, team_b: u32, count: usize) -> Result<Vec<Match>>;

    fn remaining_quota(&self) -> Option<u32> {
        None
    }
}

/// In-memory provider for offline runs and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticProvider {
    #[serde(default)]
    pub fixtures: HashMap<NaiveDate, Vec<Match>>,
    #[serde(default)]
    pub recent: HashMap<u32, Vec<Match>>,
    #[serde(default)]
    pub meetings: Vec<Match>,
    #[serde(default)]
    pub failing_teams: HashSet<u32>,
    #[serde(default)]
    pub quota: Option<u32>,
}

impl StaticProvider {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed reading provider data from {}", path.display()))?;
        serde_json::from_str(&raw).context("invalid provider json")
    }

    fn check_team(&self, team_id: u32) -> Result<()> {
        if self.failing_teams.contains(&team_id) {
            return Err(anyhow!("provider unavailable for team {team_id}"));
        }
        Ok(())
    }
}

impl MatchProvider for StaticProvider {
    fn matches_for_date(&self, date: NaiveDate) -> Result<Vec<Match>> {
        Ok(self.fixtures.get(&date).cloned().unwrap_or_default())
    }

    fn recent_matches(&self, team_id: u32, count: usize) -> Result<Vec<Match>> {
        self.check_team(team_id)?;
        let mut out = self.recent.get(&team_id).cloned().unwrap_or_default();
        out.truncate(count);
        Ok(out)
    }

    fn head_to_head(&self, team_a: u32, team_b: u32, count: usize) -> Result<Vec<Match>> {
        self.check_team(team_a)?;
        self.check_team(team_b)?;
        Ok(self
            .meetings
            .iter()
            .filter(|m| {
                (m.home.id == team_a && m.away.id == team_b)
                    || (m.home.id == team_b && m.away.id == team_a)
            })
            .take(count)
            .cloned()
            .collect())
    }

    fn remaining_quota(&self) -> Option<u32> {
        self.quota
    }
}
