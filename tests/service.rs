use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::sync::mpsc;

use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use betsense::SuggestionService;
use betsense::bets::{BetOutcome, BetStore, FinishedBet, FinishedBets, WagerType};
use betsense::config::Config;
use betsense::enrichment::{EnrichmentOutcome, EnrichmentReport};
use betsense::provider::{LeagueRef, Match, MatchProvider, MatchStatus, StaticProvider, TeamRef};
use betsense::ranker::MatchEvidence;

struct MemoryStore(FinishedBets);

impl BetStore for MemoryStore {
    fn finished_bets(&self, _wallet_id: &str) -> Result<FinishedBets> {
        Ok(self.0.clone())
    }
}

/// Wraps a static provider, counting form requests and failing on demand.
struct FlakyProvider {
    inner: StaticProvider,
    failing: AtomicBool,
    recent_calls: AtomicUsize,
}

impl FlakyProvider {
    fn new(inner: StaticProvider) -> Self {
        Self {
            inner,
            failing: AtomicBool::new(false),
            recent_calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.recent_calls.load(Ordering::SeqCst)
    }
}

impl MatchProvider for FlakyProvider {
    fn matches_for_date(&self, date: NaiveDate) -> Result<Vec<Match>> {
        self.inner.matches_for_date(date)
    }

    fn recent_matches(&self, team_id: u32, count: usize) -> Result<Vec<Match>> {
        self.recent_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("http 503"));
        }
        self.inner.recent_matches(team_id, count)
    }

    fn head_to_head(&self, team_a: u32, team_b: u32, count: usize) -> Result<Vec<Match>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("http 503"));
        }
        self.inner.head_to_head(team_a, team_b, count)
    }

    fn remaining_quota(&self) -> Option<u32> {
        Some(97)
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).expect("valid date")
}

fn team(id: u32, name: &str) -> TeamRef {
    TeamRef {
        id,
        name: name.to_string(),
    }
}

fn fixture(id: u64, league: &str, home: TeamRef, away: TeamRef, status: MatchStatus) -> Match {
    let finished = status == MatchStatus::Finished;
    Match {
        id,
        kickoff: "2026-10-17T15:00".to_string(),
        status,
        league: LeagueRef {
            id: 1,
            name: league.to_string(),
        },
        home,
        away,
        home_goals: finished.then_some(1),
        away_goals: finished.then_some(0),
    }
}

fn results(for_team: TeamRef, won: bool) -> Vec<Match> {
    (0..5)
        .map(|i| {
            let mut m = fixture(
                900 + i,
                "Serie A",
                for_team.clone(),
                team(99, "Sassuolo"),
                MatchStatus::Finished,
            );
            if !won {
                m.home_goals = Some(0);
                m.away_goals = Some(2);
            }
            m
        })
        .collect()
}

fn provider_data() -> StaticProvider {
    let mut provider = StaticProvider::default();
    provider.fixtures.insert(
        date(),
        vec![
            fixture(
                1,
                "Premier League",
                team(1, "Arsenal"),
                team(2, "Chelsea"),
                MatchStatus::NotStarted,
            ),
            fixture(2, "Serie A", team(3, "Lazio"), team(4, "Roma"), MatchStatus::NotStarted),
            fixture(
                3,
                "La Liga",
                team(5, "Barcelona"),
                team(6, "Real Madrid"),
                MatchStatus::Finished,
            ),
            fixture(
                4,
                "Premier League",
                team(7, "Everton"),
                team(8, "Spurs"),
                MatchStatus::NotStarted,
            ),
        ],
    );
    provider.recent.insert(3, results(team(3, "Lazio"), true));
    provider.recent.insert(4, results(team(4, "Roma"), false));
    provider
}

fn bet(id: usize, home: &str, away: &str, outcome: BetOutcome) -> FinishedBet {
    FinishedBet {
        id: format!("b{id}"),
        home_team: home.to_string(),
        away_team: away.to_string(),
        championship: "Premier League".to_string(),
        wager: WagerType::HomeWin,
        outcome,
        stake: 10.0,
        payout: if outcome == BetOutcome::Won { 19.0 } else { 0.0 },
        odds: 1.9,
        placed_on: NaiveDate::from_ymd_opt(2026, 9, 1).expect("valid date"),
    }
}

fn wallet() -> FinishedBets {
    let mut simple = Vec::new();
    for i in 0..6 {
        simple.push(bet(i, "Arsenal", "Fulham", BetOutcome::Won));
    }
    simple.push(bet(6, "Arsenal", "Fulham", BetOutcome::Lost));
    for i in 7..11 {
        simple.push(bet(i, "Chelsea", "Brentford", BetOutcome::Lost));
    }
    simple.push(bet(11, "Chelsea", "Brentford", BetOutcome::Won));
    FinishedBets {
        simple,
        combined: Vec::new(),
    }
}

fn config() -> Config {
    Config {
        enrich_batch_size: 2,
        fetch_parallelism: 2,
        ..Config::default()
    }
}

fn service(provider: Arc<FlakyProvider>) -> SuggestionService<FlakyProvider> {
    let store: Arc<dyn BetStore> = Arc::new(MemoryStore(wallet()));
    SuggestionService::new(store, provider, "main", &config())
}

#[test]
fn batches_are_capped_and_never_repeated() {
    let provider = Arc::new(FlakyProvider::new(provider_data()));
    let mut svc = service(provider.clone());

    let first = svc.refresh(date()).expect("refresh succeeds");
    assert_eq!(provider.calls(), 4);
    assert_eq!(first.pending_matches, 1);
    assert_eq!(first.remaining_quota, Some(97));
    assert_eq!(first.ranking.considered, 3);

    let second = svc.refresh(date()).expect("refresh succeeds");
    assert_eq!(provider.calls(), 6);
    assert_eq!(second.pending_matches, 0);

    let third = svc.refresh(date()).expect("refresh succeeds");
    assert_eq!(provider.calls(), 6);
    assert_eq!(third.ranking, second.ranking);
    assert!(third.warnings.is_empty());
}

#[test]
fn enriched_fixtures_are_ranked_by_confidence() {
    let provider = Arc::new(FlakyProvider::new(provider_data()));
    let mut svc = service(provider);

    let outcome = svc.refresh(date()).expect("refresh succeeds");
    let ids: Vec<u64> = outcome.ranking.suggestions.iter().map(|s| s.match_id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(outcome.ranking.emitted, 2);
    assert_eq!(outcome.ranking.high_confidence, 2);
    let lazio = &outcome.ranking.suggestions[1];
    assert!((lazio.confidence - 70.0).abs() < 1e-9);
    assert_eq!(lazio.suggested_wager, WagerType::HomeWin);
}

#[test]
fn failed_fixture_is_scored_on_history_alone() {
    let mut data = provider_data();
    data.failing_teams.insert(1);
    let provider = Arc::new(FlakyProvider::new(data));
    let mut svc = service(provider);

    let outcome = svc.refresh(date()).expect("refresh succeeds");
    assert!(!outcome.provider_disabled);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].starts_with("match 1:"));
    assert!(outcome.ranking.suggestions.iter().any(|s| s.match_id == 1));
    assert!(svc.cycle().expect("cycle started").failures().contains_key(&1));
}

#[test]
fn systemic_outage_disables_provider_until_forced() {
    let provider = Arc::new(FlakyProvider::new(provider_data()));
    provider.failing.store(true, Ordering::SeqCst);
    let mut svc = service(provider.clone());

    let outcome = svc.refresh(date()).expect("history still loads");
    assert!(outcome.provider_disabled);
    assert_eq!(outcome.pending_matches, 0);
    assert!(outcome.warnings.iter().any(|w| w.starts_with("provider disabled")));
    let ids: Vec<u64> = outcome.ranking.suggestions.iter().map(|s| s.match_id).collect();
    assert_eq!(ids, vec![1]);

    let calls = provider.calls();
    svc.refresh(date()).expect("refresh succeeds");
    assert_eq!(provider.calls(), calls);

    provider.failing.store(false, Ordering::SeqCst);
    let forced = svc.force_refresh(date()).expect("forced refresh succeeds");
    assert!(!forced.provider_disabled);
    assert!(forced.ranking.suggestions.iter().any(|s| s.match_id == 2));
}

#[test]
fn background_batch_is_applied() {
    let provider = Arc::new(FlakyProvider::new(provider_data()));
    let mut svc = service(provider);
    svc.refresh(date()).expect("refresh succeeds");

    let (tx, rx) = mpsc::channel();
    let handle = svc.spawn_next_batch(tx.clone()).expect("one fixture left");
    let report = rx.recv().expect("report delivered");
    handle.join().expect("worker finished");

    let summary = svc.apply_report(report);
    assert!(!summary.stale);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(svc.cycle().map(|c| c.succeeded_count()), Some(3));
    assert!(svc.spawn_next_batch(tx).is_none());
}

#[test]
fn reports_for_previous_date_are_discarded() {
    let provider = Arc::new(FlakyProvider::new(provider_data()));
    let mut svc = service(provider);
    svc.refresh(date()).expect("refresh succeeds");

    let (tx, rx) = mpsc::channel();
    let handle = svc.spawn_next_batch(tx).expect("one fixture left");
    let next_day = date().succ_opt().expect("valid date");
    svc.set_date(next_day);

    let report = rx.recv().expect("report delivered");
    handle.join().expect("worker finished");
    assert_eq!(report.date, date());
    let summary = svc.apply_report(report);
    assert!(summary.stale);
    assert_eq!(svc.cycle().map(|c| c.succeeded_count()), Some(0));

    let late = EnrichmentReport {
        date: date(),
        generation: 1,
        outcomes: vec![EnrichmentOutcome {
            match_id: 2,
            result: Ok(MatchEvidence::default()),
        }],
    };
    assert!(svc.apply_report(late).stale);
    assert!(svc.ranking().suggestions.is_empty());
}

#[test]
fn batch_in_flight_during_forced_refresh_is_discarded() {
    let provider = Arc::new(FlakyProvider::new(provider_data()));
    let mut svc = service(provider.clone());
    svc.refresh(date()).expect("refresh succeeds");

    provider.failing.store(true, Ordering::SeqCst);
    let (tx, rx) = mpsc::channel();
    let handle = svc.spawn_next_batch(tx.clone()).expect("one fixture left");
    let before_force = rx.recv().expect("report delivered");
    handle.join().expect("worker finished");
    assert!(before_force.outcomes[0].result.is_err());

    provider.failing.store(false, Ordering::SeqCst);
    svc.force_refresh(date()).expect("forced refresh succeeds");
    let handle = svc.spawn_next_batch(tx).expect("fixture 4 requested again");
    let fresh = rx.recv().expect("report delivered");
    handle.join().expect("worker finished");
    assert_eq!(fresh.date, before_force.date);
    assert_ne!(fresh.generation, before_force.generation);

    let stale = svc.apply_report(before_force);
    assert!(stale.stale);
    assert!(stale.failures.is_empty());

    let applied = svc.apply_report(fresh);
    assert!(!applied.stale);
    assert_eq!(applied.succeeded, 1);
    let cycle = svc.cycle().expect("cycle started");
    assert!(cycle.failures().is_empty());
    assert_eq!(cycle.succeeded_count(), 3);
    assert_eq!(cycle.pending_count(), 0);
}

#[test]
fn empty_day_produces_empty_ranking() {
    let provider = Arc::new(FlakyProvider::new(StaticProvider {
        fixtures: HashMap::new(),
        ..StaticProvider::default()
    }));
    let mut svc = service(provider.clone());

    let outcome = svc.refresh(date()).expect("refresh succeeds");
    assert_eq!(outcome.ranking.considered, 0);
    assert_eq!(outcome.pending_matches, 0);
    assert_eq!(provider.calls(), 0);
}
