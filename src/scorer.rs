use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bets::WagerType;
use crate::form::RecentFormRecord;
use crate::head_to_head::{HeadToHeadRecord, Side};
use crate::history::{HistoryRecord, MIN_DECIDED_BETS, best_wager_type};
use crate::provider::Match;

pub const MIN_CONFIDENCE: f64 = 45.0;
/// Decided bets a wager type needs before it can be suggested without a favorite.
pub const MIN_WAGER_TYPE_BETS: u32 = 5;

const H2H_MIN_MEETINGS: u32 = 3;
const H2H_MIN_GAP: u32 = 2;
const H2H_SHIFT: f64 = 5.0;
const CHAMPIONSHIP_MIN_RATE: f64 = 55.0;
const CHAMPIONSHIP_REASON_RATE: f64 = 60.0;
const CHAMPIONSHIP_MAX_WEIGHT: f64 = 0.15;

/// Everything known about one upcoming fixture. Every source is optional.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub fixture: &'a Match,
    pub home_history: Option<&'a HistoryRecord>,
    pub away_history: Option<&'a HistoryRecord>,
    pub championship_history: Option<&'a HistoryRecord>,
    pub home_form: Option<&'a RecentFormRecord>,
    pub away_form: Option<&'a RecentFormRecord>,
    pub head_to_head: Option<&'a HeadToHeadRecord>,
    pub bet_types: Option<&'a BTreeMap<WagerType, HistoryRecord>>,
}

impl<'a> ScoringInput<'a> {
    pub fn bare(fixture: &'a Match) -> Self {
        Self {
            fixture,
            home_history: None,
            away_history: None,
            championship_history: None,
            home_form: None,
            away_form: None,
            head_to_head: None,
            bet_types: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    BothStrong,
    ClearMismatch,
    ModerateEdge,
    FormOnly,
    SingleSideHistory,
}

/// Scorer output before the emission gate.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub scenario: Option<ScenarioKind>,
    pub favored: Option<Side>,
    pub confidence: f64,
    pub suggested_wager: WagerType,
    pub warnings: Vec<String>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub match_id: u64,
    pub kickoff: String,
    pub championship: String,
    pub home: String,
    pub away: String,
    pub confidence: f64,
    /// Warnings first, then supporting reasons.
    pub rationale: Vec<String>,
    pub suggested_wager: WagerType,
    pub favored: Option<Side>,
    pub scenario: Option<ScenarioKind>,
    pub home_win_rate: f64,
    pub away_win_rate: f64,
    pub championship_win_rate: Option<f64>,
    pub relevant_bets: u32,
}

#[derive(Debug, Clone, Copy)]
struct TeamSignal<'a> {
    name: &'a str,
    rate: f64,
    bets: u32,
    form: f64,
    form_wins: u32,
    form_losses: u32,
    form_matches: u32,
}

impl<'a> TeamSignal<'a> {
    fn new(
        name: &'a str,
        history: Option<&HistoryRecord>,
        form: Option<&RecentFormRecord>,
    ) -> Self {
        let form = form.filter(|f| f.has_data());
        Self {
            name,
            rate: history.map(|h| h.win_rate).unwrap_or(0.0),
            bets: history.map(HistoryRecord::decided).unwrap_or(0),
            form: form.and_then(RecentFormRecord::form_score).unwrap_or(0.0),
            form_wins: form.map(|f| f.wins).unwrap_or(0),
            form_losses: form.map(|f| f.losses).unwrap_or(0),
            form_matches: form.map(RecentFormRecord::matches_counted).unwrap_or(0),
        }
    }

    fn sufficient(&self) -> bool {
        self.bets >= MIN_DECIDED_BETS
    }

    fn has_form(&self) -> bool {
        self.form_matches > 0
    }

    fn history_reason(&self) -> String {
        format!(
            "{}: {} win rate over {} bets",
            self.name,
            pct(self.rate),
            self.bets
        )
    }

    fn form_reason(&self) -> String {
        format!(
            "{} won {} of its last {} matches",
            self.name, self.form_wins, self.form_matches
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct Signals<'a> {
    home: TeamSignal<'a>,
    away: TeamSignal<'a>,
}

impl<'a> Signals<'a> {
    fn side(&self, side: Side) -> &TeamSignal<'a> {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    fn rate_gap(&self) -> f64 {
        (self.home.rate - self.away.rate).abs()
    }

    fn form_gap(&self) -> f64 {
        (self.home.form - self.away.form).abs()
    }

    /// Side with the higher form score, home on ties.
    fn form_leader(&self) -> Side {
        if self.away.form > self.home.form {
            Side::Away
        } else {
            Side::Home
        }
    }

    fn strong(&self, side: Side) -> bool {
        let t = self.side(side);
        t.sufficient() && t.rate >= 60.0
    }

    fn weak(&self, side: Side) -> bool {
        let t = self.side(side);
        t.sufficient() && t.rate < 45.0
    }
}

#[derive(Debug, Default)]
struct Verdict {
    favored: Option<Side>,
    confidence: f64,
    warnings: Vec<String>,
    reasons: Vec<String>,
}

struct Scenario {
    kind: ScenarioKind,
    applies: fn(&Signals) -> bool,
    score: fn(&Signals) -> Verdict,
}

/// Evaluated in order; the first applicable scenario decides.
const SCENARIOS: [Scenario; 5] = [
    Scenario {
        kind: ScenarioKind::BothStrong,
        applies: both_strong_applies,
        score: both_strong_score,
    },
    Scenario {
        kind: ScenarioKind::ClearMismatch,
        applies: mismatch_applies,
        score: mismatch_score,
    },
    Scenario {
        kind: ScenarioKind::ModerateEdge,
        applies: moderate_edge_applies,
        score: moderate_edge_score,
    },
    Scenario {
        kind: ScenarioKind::FormOnly,
        applies: form_only_applies,
        score: form_only_score,
    },
    Scenario {
        kind: ScenarioKind::SingleSideHistory,
        applies: single_side_applies,
        score: single_side_score,
    },
];

fn both_strong_applies(s: &Signals) -> bool {
    s.home.sufficient() && s.away.sufficient() && s.home.rate >= 65.0 && s.away.rate >= 65.0
}

fn both_strong_score(s: &Signals) -> Verdict {
    let mut v = Verdict {
        confidence: 45.0,
        ..Verdict::default()
    };
    v.warnings.push(format!(
        "Balanced matchup: you win often with both {} ({}) and {} ({})",
        s.home.name,
        pct(s.home.rate),
        s.away.name,
        pct(s.away.rate)
    ));
    let gap = s.form_gap();
    if gap >= 30.0 {
        let leader = s.form_leader();
        v.favored = Some(leader);
        v.confidence = 50.0 + gap / 4.0;
        v.reasons.push(s.side(leader).form_reason());
    } else {
        v.warnings.push(format!(
            "Recent form is also balanced ({} vs {})",
            pct(s.home.form),
            pct(s.away.form)
        ));
    }
    v
}

fn mismatch_applies(s: &Signals) -> bool {
    (s.strong(Side::Home) && s.weak(Side::Away)) || (s.strong(Side::Away) && s.weak(Side::Home))
}

fn mismatch_score(s: &Signals) -> Verdict {
    let strong_side = if s.strong(Side::Home) && s.weak(Side::Away) {
        Side::Home
    } else {
        Side::Away
    };
    let strong = s.side(strong_side);
    let weak = s.side(strong_side.opposite());

    let mut v = Verdict {
        favored: Some(strong_side),
        confidence: 75.0 + ((strong.rate - weak.rate) / 5.0).min(15.0),
        ..Verdict::default()
    };
    v.reasons.push(strong.history_reason());
    v.reasons.push(weak.history_reason());

    if weak.form - strong.form > 30.0 {
        v.confidence -= 15.0;
        v.warnings.push(format!(
            "Recent form contradicts the history: {} {} vs {} {}",
            weak.name,
            pct(weak.form),
            strong.name,
            pct(strong.form)
        ));
    }
    v
}

fn moderate_edge_applies(s: &Signals) -> bool {
    s.home.sufficient() && s.away.sufficient() && (s.rate_gap() >= 25.0 || s.form_gap() >= 40.0)
}

fn moderate_edge_score(s: &Signals) -> Verdict {
    let favored = if s.home.rate > s.away.rate {
        Side::Home
    } else if s.away.rate > s.home.rate {
        Side::Away
    } else {
        s.form_leader()
    };
    let team = s.side(favored);

    let mut v = Verdict {
        favored: Some(favored),
        confidence: 55.0 + (s.rate_gap() / 3.0).min(20.0),
        ..Verdict::default()
    };
    v.reasons.push(team.history_reason());
    if team.form >= 60.0 {
        v.confidence += 5.0;
        v.reasons.push(team.form_reason());
    }
    v
}

fn form_only_applies(s: &Signals) -> bool {
    !s.home.sufficient() && !s.away.sufficient() && (s.home.has_form() || s.away.has_form())
}

fn form_only_score(s: &Signals) -> Verdict {
    let mut v = Verdict::default();
    let leader = s.form_leader();
    let team = s.side(leader);
    let other = s.side(leader.opposite());

    if s.form_gap() >= 40.0 {
        v.favored = Some(leader);
        v.confidence = 0.6 * team.form;
        v.reasons.push(team.form_reason());
        if other.form_losses >= 3 {
            v.confidence += 10.0;
            v.reasons.push(format!(
                "{} lost {} of its last {} matches",
                other.name, other.form_losses, other.form_matches
            ));
        }
    } else if s.home.form >= 60.0 || s.away.form >= 60.0 {
        v.favored = Some(leader);
        v.confidence = 0.5 * team.form;
        v.warnings.push(format!(
            "No betting history for {} or {}: based on recent form only",
            s.home.name, s.away.name
        ));
    }
    v
}

fn single_side_applies(s: &Signals) -> bool {
    match (s.home.sufficient(), s.away.sufficient()) {
        (true, false) => s.home.rate >= 55.0,
        (false, true) => s.away.rate >= 55.0,
        _ => false,
    }
}

fn single_side_score(s: &Signals) -> Verdict {
    let favored = if s.home.sufficient() {
        Side::Home
    } else {
        Side::Away
    };
    let team = s.side(favored);
    let other = s.side(favored.opposite());

    let mut v = Verdict {
        favored: Some(favored),
        confidence: 0.8 * team.rate,
        ..Verdict::default()
    };
    v.reasons.push(team.history_reason());
    if other.form >= 70.0 {
        v.confidence -= 15.0;
        v.warnings.push(format!(
            "{} is in strong recent form ({}, {} wins in {} matches)",
            other.name,
            pct(other.form),
            other.form_wins,
            other.form_matches
        ));
    }
    v
}

fn is_eligible(input: &ScoringInput) -> bool {
    let sufficient = |h: Option<&HistoryRecord>| h.is_some_and(HistoryRecord::is_sufficient);
    let has_form = |f: Option<&RecentFormRecord>| f.is_some_and(RecentFormRecord::has_data);
    sufficient(input.home_history)
        || sufficient(input.away_history)
        || sufficient(input.championship_history)
        || has_form(input.home_form)
        || has_form(input.away_form)
}

/// Run the scenario table and the head-to-head and championship adjustments.
/// `None` means the fixture lacks the minimum evidence to be assessed at all.
pub fn assess_match(input: &ScoringInput) -> Option<Assessment> {
    if !is_eligible(input) {
        return None;
    }

    let fixture = input.fixture;
    let signals = Signals {
        home: TeamSignal::new(&fixture.home.name, input.home_history, input.home_form),
        away: TeamSignal::new(&fixture.away.name, input.away_history, input.away_form),
    };

    let mut scenario = None;
    let mut verdict = Verdict::default();
    for candidate in &SCENARIOS {
        if (candidate.applies)(&signals) {
            scenario = Some(candidate.kind);
            verdict = (candidate.score)(&signals);
            break;
        }
    }
    tracing::trace!(
        match_id = fixture.id,
        ?scenario,
        favored = ?verdict.favored,
        "scenario resolved"
    );

    if let Some(h2h) = input.head_to_head {
        apply_head_to_head(&mut verdict, h2h, &signals);
    }
    if let Some(championship) = input.championship_history {
        apply_championship(&mut verdict, championship, &fixture.league.name);
    }

    let suggested_wager = match verdict.favored {
        Some(Side::Home) => WagerType::HomeWin,
        Some(Side::Away) => WagerType::AwayWin,
        None => input
            .bet_types
            .and_then(|types| best_wager_type(types, MIN_WAGER_TYPE_BETS))
            .unwrap_or(WagerType::Draw),
    };

    Some(Assessment {
        scenario,
        favored: verdict.favored,
        confidence: verdict.confidence.clamp(0.0, 100.0),
        suggested_wager,
        warnings: verdict.warnings,
        reasons: verdict.reasons,
    })
}

fn apply_head_to_head(v: &mut Verdict, h2h: &HeadToHeadRecord, s: &Signals) {
    if h2h.total_meetings() < H2H_MIN_MEETINGS || h2h.win_gap() < H2H_MIN_GAP {
        return;
    }
    let Some(leader) = h2h.favored() else {
        return;
    };
    let leader_name = s.side(leader).name;
    v.reasons.push(format!(
        "{} won {} of the last {} head-to-head meetings",
        leader_name,
        h2h.wins_for(leader),
        h2h.total_meetings()
    ));
    match v.favored {
        Some(favored) if favored == leader => v.confidence += H2H_SHIFT,
        Some(favored) => {
            v.confidence -= H2H_SHIFT;
            v.warnings.push(format!(
                "Head-to-head favors {}, not {}",
                leader_name,
                s.side(favored).name
            ));
        }
        None => {}
    }
}

fn apply_championship(v: &mut Verdict, record: &HistoryRecord, name: &str) {
    if !record.is_sufficient() || record.win_rate < CHAMPIONSHIP_MIN_RATE {
        return;
    }
    let weight = (record.decided() as f64 / 20.0).min(CHAMPIONSHIP_MAX_WEIGHT);
    v.confidence += record.win_rate * weight;
    if record.win_rate >= CHAMPIONSHIP_REASON_RATE {
        v.reasons.push(format!(
            "You win {} of your bets in {} ({} bets)",
            pct(record.win_rate),
            name,
            record.decided()
        ));
    }
}

/// Assess a fixture and apply the emission gate.
pub fn score_match(input: &ScoringInput) -> Option<Suggestion> {
    let assessment = assess_match(input)?;
    if assessment.confidence < MIN_CONFIDENCE {
        return None;
    }
    if assessment.warnings.is_empty() && assessment.reasons.is_empty() {
        return None;
    }

    let fixture = input.fixture;
    let mut rationale = assessment.warnings;
    rationale.extend(assessment.reasons);

    Some(Suggestion {
        match_id: fixture.id,
        kickoff: fixture.kickoff.clone(),
        championship: fixture.league.name.clone(),
        home: fixture.home.name.clone(),
        away: fixture.away.name.clone(),
        confidence: assessment.confidence,
        rationale,
        suggested_wager: assessment.suggested_wager,
        favored: assessment.favored,
        scenario: assessment.scenario,
        home_win_rate: input.home_history.map(|h| h.win_rate).unwrap_or(0.0),
        away_win_rate: input.away_history.map(|h| h.win_rate).unwrap_or(0.0),
        championship_win_rate: input.championship_history.map(|c| c.win_rate),
        relevant_bets: input.home_history.map(HistoryRecord::decided).unwrap_or(0)
            + input.away_history.map(HistoryRecord::decided).unwrap_or(0),
    })
}

fn pct(v: f64) -> String {
    format!("{v:.0}%")
}
