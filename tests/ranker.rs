use std::collections::HashMap;

use betsense::form::{FormResult, RecentFormRecord};
use betsense::history::HistorySnapshot;
use betsense::provider::{LeagueRef, Match, MatchStatus, TeamRef};
use betsense::ranker::{MatchEvidence, rank_suggestions};

fn fixture(id: u64, home: &str, away: &str, status: MatchStatus) -> Match {
    Match {
        id,
        kickoff: format!("2026-10-17T{:02}:00", 10 + id),
        status,
        league: LeagueRef {
            id: 1,
            name: "Eredivisie".to_string(),
        },
        home: TeamRef {
            id: id as u32 * 10,
            name: home.to_string(),
        },
        away: TeamRef {
            id: id as u32 * 10 + 1,
            name: away.to_string(),
        },
        home_goals: None,
        away_goals: None,
    }
}

fn form(team: &str, wins: u32, losses: u32) -> RecentFormRecord {
    let mut results = vec![FormResult::Win; wins as usize];
    results.extend(vec![FormResult::Loss; losses as usize]);
    RecentFormRecord {
        team: team.to_string(),
        results,
        wins,
        losses,
        ..RecentFormRecord::default()
    }
}

fn evidence(home: RecentFormRecord, away: RecentFormRecord) -> MatchEvidence {
    MatchEvidence {
        home_form: Some(home),
        away_form: Some(away),
        head_to_head: None,
    }
}

#[test]
fn equal_confidence_keeps_fixture_order() {
    let matches = vec![
        fixture(1, "Ajax", "Utrecht", MatchStatus::NotStarted),
        fixture(2, "PSV", "Twente", MatchStatus::NotStarted),
        fixture(3, "Feyenoord", "AZ", MatchStatus::NotStarted),
    ];
    let mut found = HashMap::new();
    found.insert(1, evidence(form("Ajax", 4, 1), form("Utrecht", 0, 5)));
    found.insert(2, evidence(form("PSV", 5, 0), form("Twente", 0, 5)));
    found.insert(3, evidence(form("Feyenoord", 4, 1), form("AZ", 0, 5)));

    let ranking = rank_suggestions(&matches, &HistorySnapshot::default(), &found, 65.0);
    let ids: Vec<u64> = ranking.suggestions.iter().map(|s| s.match_id).collect();
    assert_eq!(ids, vec![2, 1, 3]);
    assert!(
        ranking
            .suggestions
            .windows(2)
            .all(|w| w[0].confidence >= w[1].confidence)
    );
    assert_eq!(ranking.high_confidence, 1);
}

#[test]
fn only_upcoming_fixtures_are_considered() {
    let matches = vec![
        fixture(1, "Ajax", "Utrecht", MatchStatus::Live),
        fixture(2, "PSV", "Twente", MatchStatus::NotStarted),
        fixture(3, "Feyenoord", "AZ", MatchStatus::Cancelled),
    ];
    let mut found = HashMap::new();
    found.insert(1, evidence(form("Ajax", 5, 0), form("Utrecht", 0, 5)));
    found.insert(2, evidence(form("PSV", 1, 4), form("Twente", 1, 4)));

    let ranking = rank_suggestions(&matches, &HistorySnapshot::default(), &found, 65.0);
    assert_eq!(ranking.considered, 1);
    assert_eq!(ranking.emitted, 0);
    assert!(ranking.suggestions.is_empty());
}

#[test]
fn no_fixtures_no_suggestions() {
    let ranking = rank_suggestions(&[], &HistorySnapshot::default(), &HashMap::new(), 65.0);
    assert_eq!(ranking.considered, 0);
    assert_eq!(ranking.emitted, 0);
}
