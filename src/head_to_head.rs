use serde::{Deserialize, Serialize};

use crate::provider::{Match, TeamRef};

/// Side of the fixture being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

/// Winner of a past meeting, relative to that meeting's own home side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeetingWinner {
    Home,
    Away,
    Draw,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub date: String,
    pub home: String,
    pub away: String,
    pub score: String,
    pub winner: MeetingWinner,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadToHeadRecord {
    pub home_team: String,
    pub away_team: String,
    pub home_wins: u32,
    pub away_wins: u32,
    pub draws: u32,
    pub home_goals: u32,
    pub away_goals: u32,
    pub meetings: Vec<MeetingSummary>,
}

impl HeadToHeadRecord {
    pub fn total_meetings(&self) -> u32 {
        self.home_wins + self.away_wins + self.draws
    }

    pub fn favored(&self) -> Option<Side> {
        if self.home_wins > self.away_wins {
            Some(Side::Home)
        } else if self.away_wins > self.home_wins {
            Some(Side::Away)
        } else {
            None
        }
    }

    pub fn wins_for(&self, side: Side) -> u32 {
        match side {
            Side::Home => self.home_wins,
            Side::Away => self.away_wins,
        }
    }

    pub fn win_gap(&self) -> u32 {
        self.home_wins.abs_diff(self.away_wins)
    }
}

/// Tabulate past meetings from the perspective of the upcoming fixture's
/// `home` and `away` teams, whichever side each hosted in the meeting itself.
pub fn analyze_head_to_head(
    home: &TeamRef,
    away: &TeamRef,
    meetings: &[Match],
) -> HeadToHeadRecord {
    let mut record = HeadToHeadRecord {
        home_team: home.name.clone(),
        away_team: away.name.clone(),
        ..HeadToHeadRecord::default()
    };

    for m in meetings {
        let Some((meeting_home_goals, meeting_away_goals)) = m.score() else {
            continue;
        };
        let (for_home, for_away) = if m.home.id == home.id && m.away.id == away.id {
            (meeting_home_goals, meeting_away_goals)
        } else if m.home.id == away.id && m.away.id == home.id {
            (meeting_away_goals, meeting_home_goals)
        } else {
            tracing::debug!(match_id = m.id, "skipping meeting between other teams");
            continue;
        };

        record.home_goals += for_home as u32;
        record.away_goals += for_away as u32;
        if for_home > for_away {
            record.home_wins += 1;
        } else if for_away > for_home {
            record.away_wins += 1;
        } else {
            record.draws += 1;
        }

        let winner = if meeting_home_goals > meeting_away_goals {
            MeetingWinner::Home
        } else if meeting_away_goals > meeting_home_goals {
            MeetingWinner::Away
        } else {
            MeetingWinner::Draw
        };
        record.meetings.push(MeetingSummary {
            date: m.kickoff.clone(),
            home: m.home.name.clone(),
            away: m.away.name.clone(),
            score: format!("{meeting_home_goals}-{meeting_away_goals}"),
            winner,
        });
    }

    record
}
