use betsense::form::{FormResult, evaluate_form, form_score_or_zero};
use betsense::head_to_head::{MeetingWinner, Side, analyze_head_to_head};
use betsense::provider::{LeagueRef, Match, MatchStatus, TeamRef};

fn team(id: u32, name: &str) -> TeamRef {
    TeamRef {
        id,
        name: name.to_string(),
    }
}

fn played(id: u64, home: &TeamRef, away: &TeamRef, goals: Option<(u8, u8)>) -> Match {
    Match {
        id,
        kickoff: format!("2026-09-{:02}T15:00", id % 28 + 1),
        status: MatchStatus::Finished,
        league: LeagueRef {
            id: 39,
            name: "Premier League".to_string(),
        },
        home: home.clone(),
        away: away.clone(),
        home_goals: goals.map(|g| g.0),
        away_goals: goals.map(|g| g.1),
    }
}

#[test]
fn form_counts_results_from_team_perspective() {
    let ars = team(1, "Arsenal");
    let che = team(2, "Chelsea");
    let eve = team(3, "Everton");
    let recent = vec![
        played(1, &ars, &che, Some((2, 0))),
        played(2, &eve, &ars, Some((1, 3))),
        played(3, &ars, &eve, Some((1, 1))),
        played(4, &che, &ars, Some((2, 1))),
        played(5, &ars, &che, None),
    ];

    let form = evaluate_form(&ars, &recent);
    assert_eq!(
        form.results,
        vec![FormResult::Win, FormResult::Win, FormResult::Draw, FormResult::Loss]
    );
    assert_eq!((form.wins, form.draws, form.losses), (2, 1, 1));
    assert_eq!((form.goals_for, form.goals_against), (7, 4));
    assert_eq!(form.to_string(), "WWDL");
    assert_eq!(form.form_score(), Some(50.0));
}

#[test]
fn form_without_scores_has_no_score() {
    let ars = team(1, "Arsenal");
    let che = team(2, "Chelsea");
    let eve = team(3, "Everton");
    let recent = vec![
        played(1, &ars, &che, None),
        played(2, &che, &eve, Some((1, 0))),
    ];

    let form = evaluate_form(&ars, &recent);
    assert!(!form.has_data());
    assert_eq!(form.form_score(), None);
    assert_eq!(form_score_or_zero(Some(&form)), 0.0);
    assert_eq!(form_score_or_zero(None), 0.0);
}

#[test]
fn head_to_head_credits_teams_regardless_of_venue() {
    let ars = team(1, "Arsenal");
    let che = team(2, "Chelsea");
    let eve = team(3, "Everton");
    let meetings = vec![
        played(1, &ars, &che, Some((1, 0))),
        played(2, &che, &ars, Some((0, 2))),
        played(3, &che, &ars, Some((3, 1))),
        played(4, &ars, &che, Some((2, 2))),
        played(5, &ars, &che, None),
        played(6, &ars, &eve, Some((4, 0))),
    ];

    let record = analyze_head_to_head(&ars, &che, &meetings);
    assert_eq!(record.home_wins, 2);
    assert_eq!(record.away_wins, 1);
    assert_eq!(record.draws, 1);
    assert_eq!(record.total_meetings(), 4);
    assert_eq!((record.home_goals, record.away_goals), (6, 5));
    assert_eq!(record.favored(), Some(Side::Home));
    assert_eq!(record.win_gap(), 1);
    assert_eq!(record.meetings.len(), 4);

    let second = &record.meetings[1];
    assert_eq!(second.home, "Chelsea");
    assert_eq!(second.score, "0-2");
    assert_eq!(second.winner, MeetingWinner::Away);
}

#[test]
fn head_to_head_without_meetings_is_neutral() {
    let ars = team(1, "Arsenal");
    let che = team(2, "Chelsea");
    let record = analyze_head_to_head(&ars, &che, &[]);
    assert_eq!(record.total_meetings(), 0);
    assert_eq!(record.favored(), None);
    assert_eq!(record.home_team, "Arsenal");
}
