use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::bets::{BetOutcome, CombinedBet, FinishedBet, WagerType};
use crate::error::ContractError;

/// Minimum decided bets for a team or championship history to count as evidence.
pub const MIN_DECIDED_BETS: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub total: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
}

impl HistoryRecord {
    pub fn decided(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn is_sufficient(&self) -> bool {
        self.decided() >= MIN_DECIDED_BETS
    }

    fn record(&mut self, outcome: BetOutcome) {
        if !outcome.is_decided() {
            return;
        }
        if outcome == BetOutcome::Won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.total += 1;
    }

    fn finish(&mut self) {
        self.win_rate = win_rate(self.wins, self.losses);
    }
}

pub fn win_rate(wins: u32, losses: u32) -> f64 {
    let decided = wins + losses;
    if decided == 0 {
        0.0
    } else {
        wins as f64 / decided as f64 * 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub teams: HashMap<String, HistoryRecord>,
    pub championships: HashMap<String, HistoryRecord>,
    pub bet_types: BTreeMap<WagerType, HistoryRecord>,
}

impl Default for HistorySnapshot {
    fn default() -> Self {
        Self {
            teams: HashMap::new(),
            championships: HashMap::new(),
            bet_types: WagerType::ALL
                .iter()
                .map(|w| (*w, HistoryRecord::default()))
                .collect(),
        }
    }
}

impl HistorySnapshot {
    pub fn team(&self, name: &str) -> Option<&HistoryRecord> {
        self.teams.get(name)
    }

    pub fn championship(&self, name: &str) -> Option<&HistoryRecord> {
        self.championships.get(name)
    }

    pub fn best_wager_type(&self, min_decided: u32) -> Option<WagerType> {
        best_wager_type(&self.bet_types, min_decided)
    }

    fn credit(
        &mut self,
        home: &str,
        away: &str,
        championship: &str,
        wager: WagerType,
        outcome: BetOutcome,
    ) {
        for team in [home, away] {
            self.teams.entry(team.to_string()).or_default().record(outcome);
        }
        self.championships
            .entry(championship.to_string())
            .or_default()
            .record(outcome);
        self.bet_types.entry(wager).or_default().record(outcome);
    }
}

/// Wager type with the best win rate among those with at least `min_decided` bets.
/// Ties keep the earlier enumeration value.
pub fn best_wager_type(
    bet_types: &BTreeMap<WagerType, HistoryRecord>,
    min_decided: u32,
) -> Option<WagerType> {
    let mut best: Option<(WagerType, f64)> = None;
    for (wager, record) in bet_types {
        if record.decided() < min_decided {
            continue;
        }
        if best.is_none_or(|(_, rate)| record.win_rate > rate) {
            best = Some((*wager, record.win_rate));
        }
    }
    best.map(|(wager, _)| wager)
}

/// Fold finished simple and combined bets into per-team, per-championship and
/// per-wager-type records. Every leg of a combined bet is credited with the
/// parlay's single outcome as a whole win or loss.
pub fn aggregate_history(
    simple: &[FinishedBet],
    combined: &[CombinedBet],
) -> Result<HistorySnapshot, ContractError> {
    let mut snapshot = HistorySnapshot::default();

    for bet in simple {
        ensure_settled(&bet.id, bet.outcome)?;
        if bet.outcome == BetOutcome::Void {
            continue;
        }
        snapshot.credit(&bet.home_team, &bet.away_team, &bet.championship, bet.wager, bet.outcome);
    }

    for bet in combined {
        bet.validate()?;
        ensure_settled(&bet.id, bet.outcome)?;
        if bet.outcome == BetOutcome::Void {
            continue;
        }
        for leg in &bet.legs {
            snapshot.credit(
                &leg.home_team,
                &leg.away_team,
                &leg.championship,
                leg.wager,
                bet.outcome,
            );
        }
    }

    for record in snapshot
        .teams
        .values_mut()
        .chain(snapshot.championships.values_mut())
        .chain(snapshot.bet_types.values_mut())
    {
        record.finish();
    }

    Ok(snapshot)
}

fn ensure_settled(bet_id: &str, outcome: BetOutcome) -> Result<(), ContractError> {
    if outcome == BetOutcome::Pending {
        return Err(ContractError::UnsettledBet {
            bet_id: bet_id.to_string(),
        });
    }
    Ok(())
}
