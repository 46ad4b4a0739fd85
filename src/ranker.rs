use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::form::RecentFormRecord;
use crate::head_to_head::HeadToHeadRecord;
use crate::history::HistorySnapshot;
use crate::provider::Match;
use crate::scorer::{ScoringInput, Suggestion, score_match};

pub const DEFAULT_HIGH_CONFIDENCE: f64 = 65.0;

/// Provider evidence gathered for one fixture during a refresh cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchEvidence {
    pub home_form: Option<RecentFormRecord>,
    pub away_form: Option<RecentFormRecord>,
    pub head_to_head: Option<HeadToHeadRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Non-increasing confidence; ties keep fixture order.
    pub suggestions: Vec<Suggestion>,
    pub considered: usize,
    pub emitted: usize,
    pub high_confidence: usize,
}

pub fn scoring_input<'a>(
    fixture: &'a Match,
    history: &'a HistorySnapshot,
    evidence: Option<&'a MatchEvidence>,
) -> ScoringInput<'a> {
    ScoringInput {
        fixture,
        home_history: history.team(&fixture.home.name),
        away_history: history.team(&fixture.away.name),
        championship_history: history.championship(&fixture.league.name),
        home_form: evidence.and_then(|e| e.home_form.as_ref()),
        away_form: evidence.and_then(|e| e.away_form.as_ref()),
        head_to_head: evidence.and_then(|e| e.head_to_head.as_ref()),
        bet_types: Some(&history.bet_types),
    }
}

/// Score every upcoming fixture and order the emitted suggestions.
/// Fixtures without provider evidence are scored on history alone.
pub fn rank_suggestions(
    matches: &[Match],
    history: &HistorySnapshot,
    evidence: &HashMap<u64, MatchEvidence>,
    high_confidence: f64,
) -> Ranking {
    let mut considered = 0usize;
    let mut suggestions = Vec::new();

    for fixture in matches.iter().filter(|m| m.is_upcoming()) {
        considered += 1;
        let input = scoring_input(fixture, history, evidence.get(&fixture.id));
        if let Some(suggestion) = score_match(&input) {
            suggestions.push(suggestion);
        }
    }

    suggestions.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let high_confidence = suggestions
        .iter()
        .filter(|s| s.confidence >= high_confidence)
        .count();

    Ranking {
        emitted: suggestions.len(),
        considered,
        high_confidence,
        suggestions,
    }
}
