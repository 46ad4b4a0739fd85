use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;

use crate::bets::BetStore;
use crate::config::Config;
use crate::enrichment::{ApplySummary, Enricher, EnrichmentCycle, EnrichmentReport, spawn_batch};
use crate::history::{HistorySnapshot, aggregate_history};
use crate::provider::{Match, MatchProvider};
use crate::ranker::{MatchEvidence, Ranking, rank_suggestions};

#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub date: NaiveDate,
    pub ranking: Ranking,
    /// Non-fatal provider problems, one line each.
    pub warnings: Vec<String>,
    pub provider_disabled: bool,
    pub remaining_quota: Option<u32>,
    /// Upcoming fixtures still waiting for enrichment in this cycle.
    pub pending_matches: usize,
}

/// Ties a wallet's bet history and a match provider into ranked suggestions
/// for one target date at a time.
pub struct SuggestionService<P: ?Sized> {
    store: Arc<dyn BetStore>,
    provider: Arc<P>,
    enricher: Arc<Enricher<P>>,
    wallet_id: String,
    batch_size: usize,
    high_confidence: f64,
    cycle: Option<EnrichmentCycle>,
    generation: u64,
    matches: Option<Vec<Match>>,
    evidence: HashMap<u64, MatchEvidence>,
    history: HistorySnapshot,
}

impl<P: MatchProvider + ?Sized + 'static> SuggestionService<P> {
    pub fn new(
        store: Arc<dyn BetStore>,
        provider: Arc<P>,
        wallet_id: impl Into<String>,
        cfg: &Config,
    ) -> Self {
        Self {
            store,
            enricher: Arc::new(Enricher::new(provider.clone(), cfg)),
            provider,
            wallet_id: wallet_id.into(),
            batch_size: cfg.enrich_batch_size,
            high_confidence: cfg.high_confidence,
            cycle: None,
            generation: 0,
            matches: None,
            evidence: HashMap::new(),
            history: HistorySnapshot::default(),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.cycle.as_ref().map(EnrichmentCycle::date)
    }

    pub fn history(&self) -> &HistorySnapshot {
        &self.history
    }

    pub fn cycle(&self) -> Option<&EnrichmentCycle> {
        self.cycle.as_ref()
    }

    /// Switch the target date. Evidence and tracking for the old date are dropped,
    /// so reports still in flight for it are discarded on arrival.
    pub fn set_date(&mut self, date: NaiveDate) {
        if self.date() == Some(date) {
            return;
        }
        tracing::info!(%date, "starting suggestion cycle");
        self.reset(date);
    }

    fn reset(&mut self, date: NaiveDate) {
        self.generation += 1;
        self.cycle = Some(EnrichmentCycle::new(date, self.generation));
        self.matches = None;
        self.evidence.clear();
    }

    pub fn reload_history(&mut self) -> Result<()> {
        let bets = self
            .store
            .finished_bets(&self.wallet_id)
            .with_context(|| format!("loading bets for wallet {}", self.wallet_id))?;
        self.history = aggregate_history(&bets.simple, &bets.combined)
            .context("aggregating bet history")?;
        tracing::debug!(
            wallet = %self.wallet_id,
            teams = self.history.teams.len(),
            championships = self.history.championships.len(),
            "history aggregated"
        );
        Ok(())
    }

    fn ensure_matches(&mut self, date: NaiveDate) -> Result<()> {
        if self.matches.is_some() {
            return Ok(());
        }
        let matches = self
            .provider
            .matches_for_date(date)
            .with_context(|| format!("listing matches for {date}"))?;
        tracing::info!(%date, count = matches.len(), "match list loaded");
        self.matches = Some(matches);
        Ok(())
    }

    fn matches(&self) -> &[Match] {
        self.matches.as_deref().unwrap_or_default()
    }

    /// Reload history, enrich the next batch synchronously and rank the day.
    pub fn refresh(&mut self, date: NaiveDate) -> Result<RefreshOutcome> {
        self.set_date(date);
        self.reload_history()?;
        self.ensure_matches(date)?;

        let mut warnings = Vec::new();
        let batch = self.take_batch();
        if !batch.is_empty() {
            let report = self.enricher.run_batch(date, self.generation, &batch);
            let summary = self.apply_report(report);
            warnings.extend(summary_warnings(date, &summary));
        }
        Ok(self.outcome(date, warnings))
    }

    /// Like `refresh`, but forgets every success and failure for the date first.
    /// Batches still in flight from before the reset are discarded on arrival.
    pub fn force_refresh(&mut self, date: NaiveDate) -> Result<RefreshOutcome> {
        tracing::info!(%date, "forced refresh");
        self.reset(date);
        self.refresh(date)
    }

    /// Start the next batch on a background thread. Returns `None` when there is
    /// nothing left to enrich or the provider is disabled.
    pub fn spawn_next_batch(&mut self, tx: Sender<EnrichmentReport>) -> Option<JoinHandle<()>> {
        let date = self.date()?;
        let batch = self.take_batch();
        if batch.is_empty() {
            return None;
        }
        Some(spawn_batch(self.enricher.clone(), date, self.generation, batch, tx))
    }

    fn take_batch(&mut self) -> Vec<Match> {
        let Some(matches) = self.matches.as_deref() else {
            return Vec::new();
        };
        let Some(cycle) = self.cycle.as_mut() else {
            return Vec::new();
        };
        cycle.next_batch(matches, self.batch_size)
    }

    pub fn apply_report(&mut self, report: EnrichmentReport) -> ApplySummary {
        let Some(cycle) = self.cycle.as_mut() else {
            return ApplySummary {
                stale: true,
                ..ApplySummary::default()
            };
        };
        cycle.apply(report, &mut self.evidence)
    }

    /// Rank with whatever evidence has arrived so far.
    pub fn ranking(&self) -> Ranking {
        rank_suggestions(self.matches(), &self.history, &self.evidence, self.high_confidence)
    }

    fn outcome(&self, date: NaiveDate, warnings: Vec<String>) -> RefreshOutcome {
        let (provider_disabled, pending_matches) = match self.cycle.as_ref() {
            Some(cycle) => (
                cycle.is_provider_disabled(),
                if cycle.is_provider_disabled() {
                    0
                } else {
                    cycle.untouched(self.matches()) + cycle.pending_count()
                },
            ),
            None => (false, 0),
        };
        RefreshOutcome {
            date,
            ranking: self.ranking(),
            warnings,
            provider_disabled,
            remaining_quota: self.provider.remaining_quota(),
            pending_matches,
        }
    }
}

pub fn summary_warnings(date: NaiveDate, summary: &ApplySummary) -> Vec<String> {
    let mut out: Vec<String> = summary
        .failures
        .iter()
        .map(|(id, message)| format!("match {id}: provider data unavailable ({message})"))
        .collect();
    if summary.outage {
        out.push(format!(
            "provider disabled for {date}: every request in the last batch failed"
        ));
    }
    out
}
