use std::fmt;

use serde::{Deserialize, Serialize};

use crate::provider::{Match, TeamRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormResult {
    Win,
    Draw,
    Loss,
}

impl FormResult {
    fn from_goals(scored: u8, conceded: u8) -> Self {
        if scored > conceded {
            FormResult::Win
        } else if scored < conceded {
            FormResult::Loss
        } else {
            FormResult::Draw
        }
    }

    pub fn letter(self) -> char {
        match self {
            FormResult::Win => 'W',
            FormResult::Draw => 'D',
            FormResult::Loss => 'L',
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecentFormRecord {
    pub team: String,
    /// Provider order, not re-sorted.
    pub results: Vec<FormResult>,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
}

impl RecentFormRecord {
    pub fn has_data(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn matches_counted(&self) -> u32 {
        self.results.len() as u32
    }

    /// Win percentage over matches with a known score.
    pub fn form_score(&self) -> Option<f64> {
        if self.results.is_empty() {
            return None;
        }
        Some(self.wins as f64 / self.results.len() as f64 * 100.0)
    }
}

impl fmt::Display for RecentFormRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            write!(f, "{}", result.letter())?;
        }
        Ok(())
    }
}

/// Form score of an optional record, zero when absent or empty.
pub fn form_score_or_zero(record: Option<&RecentFormRecord>) -> f64 {
    record.and_then(RecentFormRecord::form_score).unwrap_or(0.0)
}

pub fn evaluate_form(team: &TeamRef, matches: &[Match]) -> RecentFormRecord {
    let mut record = RecentFormRecord {
        team: team.name.clone(),
        ..RecentFormRecord::default()
    };

    for m in matches {
        let Some((home_goals, away_goals)) = m.score() else {
            continue;
        };
        let (scored, conceded) = if m.home.id == team.id {
            (home_goals, away_goals)
        } else if m.away.id == team.id {
            (away_goals, home_goals)
        } else {
            tracing::debug!(team_id = team.id, match_id = m.id, "skipping match without team");
            continue;
        };

        let result = FormResult::from_goals(scored, conceded);
        match result {
            FormResult::Win => record.wins += 1,
            FormResult::Draw => record.draws += 1,
            FormResult::Loss => record.losses += 1,
        }
        record.goals_for += scored as u32;
        record.goals_against += conceded as u32;
        record.results.push(result);
    }

    record
}
