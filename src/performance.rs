use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::bets::{BetOutcome, CombinedBet, FinishedBet};
use crate::error::ContractError;
use crate::history::win_rate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OddsRange {
    Under150,
    From150To199,
    From200To299,
    From300,
}

impl OddsRange {
    pub const ALL: [OddsRange; 4] = [
        OddsRange::Under150,
        OddsRange::From150To199,
        OddsRange::From200To299,
        OddsRange::From300,
    ];

    pub fn of(odds: f64) -> Self {
        if odds < 1.5 {
            OddsRange::Under150
        } else if odds < 2.0 {
            OddsRange::From150To199
        } else if odds < 3.0 {
            OddsRange::From200To299
        } else {
            OddsRange::From300
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OddsRange::Under150 => "< 1.50",
            OddsRange::From150To199 => "1.50-1.99",
            OddsRange::From200To299 => "2.00-2.99",
            OddsRange::From300 => ">= 3.00",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBucket {
    pub wins: u32,
    pub losses: u32,
    pub win_rate: f64,
    pub staked: f64,
    pub profit: f64,
}

impl PerformanceBucket {
    fn add(&mut self, outcome: BetOutcome, stake: f64, profit: f64) {
        if !outcome.is_decided() {
            return;
        }
        if outcome == BetOutcome::Won {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.staked += stake;
        self.profit += profit;
    }

    fn finish(&mut self) {
        self.win_rate = win_rate(self.wins, self.losses);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    /// Monday first.
    pub by_weekday: Vec<(Weekday, PerformanceBucket)>,
    pub by_odds_range: Vec<(OddsRange, PerformanceBucket)>,
    pub team_profit: HashMap<String, f64>,
    pub decided: u32,
    pub staked: f64,
    pub returned: f64,
    pub profit: f64,
    pub roi: f64,
}

fn bet_profit(outcome: BetOutcome, stake: f64, payout: f64) -> f64 {
    match outcome {
        BetOutcome::Won => payout - stake,
        BetOutcome::Lost => -stake,
        BetOutcome::Pending | BetOutcome::Void => 0.0,
    }
}

/// Weekday, odds-range and per-team profit breakdown of finished bets.
/// A combined bet's profit is split evenly across its legs for team profit.
pub fn summarize(
    simple: &[FinishedBet],
    combined: &[CombinedBet],
) -> Result<PerformanceReport, ContractError> {
    let mut weekdays = [PerformanceBucket::default(); 7];
    let mut ranges = [PerformanceBucket::default(); 4];
    let mut report = PerformanceReport::default();

    let mut fold = |report: &mut PerformanceReport,
                    id: &str,
                    outcome: BetOutcome,
                    stake: f64,
                    payout: f64,
                    odds: f64,
                    placed_on: NaiveDate|
     -> Result<Option<f64>, ContractError> {
        match outcome {
            BetOutcome::Pending => {
                return Err(ContractError::UnsettledBet {
                    bet_id: id.to_string(),
                });
            }
            BetOutcome::Void => return Ok(None),
            BetOutcome::Won | BetOutcome::Lost => {}
        }
        let profit = bet_profit(outcome, stake, payout);
        weekdays[placed_on.weekday().num_days_from_monday() as usize].add(outcome, stake, profit);
        ranges[range_index(OddsRange::of(odds))].add(outcome, stake, profit);
        report.decided += 1;
        report.staked += stake;
        if outcome == BetOutcome::Won {
            report.returned += payout;
        }
        Ok(Some(profit))
    };

    for bet in simple {
        let Some(profit) = fold(
            &mut report,
            &bet.id,
            bet.outcome,
            bet.stake,
            bet.payout,
            bet.odds,
            bet.placed_on,
        )?
        else {
            continue;
        };
        for team in [&bet.home_team, &bet.away_team] {
            *report.team_profit.entry(team.clone()).or_default() += profit;
        }
    }

    for bet in combined {
        bet.validate()?;
        let Some(profit) = fold(
            &mut report,
            &bet.id,
            bet.outcome,
            bet.stake,
            bet.payout,
            bet.odds,
            bet.placed_on,
        )?
        else {
            continue;
        };
        let share = profit / bet.legs.len() as f64;
        for leg in &bet.legs {
            for team in [&leg.home_team, &leg.away_team] {
                *report.team_profit.entry(team.clone()).or_default() += share;
            }
        }
    }

    report.profit = report.returned - report.staked;
    report.roi = if report.staked > 0.0 {
        report.profit / report.staked * 100.0
    } else {
        0.0
    };

    let days = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];
    report.by_weekday = days
        .into_iter()
        .zip(weekdays)
        .map(|(day, mut bucket)| {
            bucket.finish();
            (day, bucket)
        })
        .collect();
    report.by_odds_range = OddsRange::ALL
        .into_iter()
        .zip(ranges)
        .map(|(range, mut bucket)| {
            bucket.finish();
            (range, bucket)
        })
        .collect();

    Ok(report)
}

fn range_index(range: OddsRange) -> usize {
    match range {
        OddsRange::Under150 => 0,
        OddsRange::From150To199 => 1,
        OddsRange::From200To299 => 2,
        OddsRange::From300 => 3,
    }
}
