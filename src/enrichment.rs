use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use anyhow::Result;
use chrono::NaiveDate;
use rayon::prelude::*;

use crate::config::Config;
use crate::form::evaluate_form;
use crate::head_to_head::analyze_head_to_head;
use crate::provider::{Match, MatchProvider};
use crate::ranker::MatchEvidence;

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentOutcome {
    pub match_id: u64,
    pub result: Result<MatchEvidence, String>,
}

/// Results of one batch, tagged with the cycle they were requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentReport {
    pub date: NaiveDate,
    pub generation: u64,
    pub outcomes: Vec<EnrichmentOutcome>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplySummary {
    pub stale: bool,
    pub succeeded: usize,
    pub failures: Vec<(u64, String)>,
    /// Every attempt in the batch failed and the provider is now disabled.
    pub outage: bool,
}

/// Per-date tracking of which fixtures were requested, enriched or given up on.
#[derive(Debug, Clone)]
pub struct EnrichmentCycle {
    date: NaiveDate,
    /// Bumped on every reset, including forced resets for the same date.
    generation: u64,
    pending: HashSet<u64>,
    succeeded: HashSet<u64>,
    failed: HashMap<u64, String>,
    provider_disabled: bool,
}

impl EnrichmentCycle {
    pub fn new(date: NaiveDate, generation: u64) -> Self {
        Self {
            date,
            generation,
            pending: HashSet::new(),
            succeeded: HashSet::new(),
            failed: HashMap::new(),
            provider_disabled: false,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_provider_disabled(&self) -> bool {
        self.provider_disabled
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failures(&self) -> &HashMap<u64, String> {
        &self.failed
    }

    fn is_tracked(&self, match_id: u64) -> bool {
        self.pending.contains(&match_id)
            || self.succeeded.contains(&match_id)
            || self.failed.contains_key(&match_id)
    }

    /// Upcoming fixtures never requested in this cycle.
    pub fn untouched(&self, matches: &[Match]) -> usize {
        matches
            .iter()
            .filter(|m| m.is_upcoming() && !self.is_tracked(m.id))
            .count()
    }

    /// Take up to `batch_size` untouched upcoming fixtures and mark them pending.
    pub fn next_batch(&mut self, matches: &[Match], batch_size: usize) -> Vec<Match> {
        if self.provider_disabled {
            return Vec::new();
        }
        let mut batch = Vec::new();
        for m in matches {
            if batch.len() >= batch_size {
                break;
            }
            if !m.is_upcoming() || self.is_tracked(m.id) {
                continue;
            }
            self.pending.insert(m.id);
            batch.push(m.clone());
        }
        batch
    }

    /// Merge a report into `evidence`. Reports from another date or an
    /// earlier generation are dropped.
    pub fn apply(
        &mut self,
        report: EnrichmentReport,
        evidence: &mut HashMap<u64, MatchEvidence>,
    ) -> ApplySummary {
        let mut summary = ApplySummary::default();
        if report.date != self.date || report.generation != self.generation {
            tracing::debug!(
                report_date = %report.date,
                report_generation = report.generation,
                cycle_date = %self.date,
                cycle_generation = self.generation,
                "discarding stale enrichment report"
            );
            summary.stale = true;
            return summary;
        }

        let attempted = report.outcomes.len();
        for outcome in report.outcomes {
            if !self.pending.remove(&outcome.match_id) {
                continue;
            }
            match outcome.result {
                Ok(found) => {
                    evidence.entry(outcome.match_id).or_insert(found);
                    self.succeeded.insert(outcome.match_id);
                    summary.succeeded += 1;
                }
                Err(message) => {
                    tracing::warn!(
                        match_id = outcome.match_id,
                        error = %message,
                        "enrichment failed"
                    );
                    self.failed.insert(outcome.match_id, message.clone());
                    summary.failures.push((outcome.match_id, message));
                }
            }
        }

        if attempted > 0 && summary.succeeded == 0 && summary.failures.len() == attempted {
            tracing::warn!(
                date = %self.date,
                attempted,
                "every enrichment request failed, disabling provider for this cycle"
            );
            self.provider_disabled = true;
            summary.outage = true;
        }
        summary
    }
}

/// Fans per-fixture form and head-to-head fetches out over a bounded pool.
pub struct Enricher<P: ?Sized> {
    provider: Arc<P>,
    pool: Option<rayon::ThreadPool>,
    form_matches: usize,
    h2h_matches: usize,
}

impl<P: MatchProvider + ?Sized> Enricher<P> {
    pub fn new(provider: Arc<P>, cfg: &Config) -> Self {
        Self {
            provider,
            pool: build_fetch_pool(cfg.fetch_parallelism),
            form_matches: cfg.form_matches,
            h2h_matches: cfg.h2h_matches,
        }
    }

    pub fn run_batch(&self, date: NaiveDate, generation: u64, batch: &[Match]) -> EnrichmentReport {
        let outcomes: Vec<EnrichmentOutcome> = with_fetch_pool(&self.pool, || {
            batch
                .par_iter()
                .map(|fixture| EnrichmentOutcome {
                    match_id: fixture.id,
                    result: self.enrich_one(fixture).map_err(|err| format!("{err:#}")),
                })
                .collect()
        });
        EnrichmentReport {
            date,
            generation,
            outcomes,
        }
    }

    fn enrich_one(&self, fixture: &Match) -> Result<MatchEvidence> {
        let home_recent = self.provider.recent_matches(fixture.home.id, self.form_matches)?;
        let away_recent = self.provider.recent_matches(fixture.away.id, self.form_matches)?;
        let meetings = self
            .provider
            .head_to_head(fixture.home.id, fixture.away.id, self.h2h_matches)?;

        Ok(MatchEvidence {
            home_form: Some(evaluate_form(&fixture.home, &home_recent)),
            away_form: Some(evaluate_form(&fixture.away, &away_recent)),
            head_to_head: Some(analyze_head_to_head(&fixture.home, &fixture.away, &meetings)),
        })
    }
}

/// Run a batch on a background thread and deliver the report over `tx`.
pub fn spawn_batch<P>(
    enricher: Arc<Enricher<P>>,
    date: NaiveDate,
    generation: u64,
    batch: Vec<Match>,
    tx: Sender<EnrichmentReport>,
) -> JoinHandle<()>
where
    P: MatchProvider + ?Sized + 'static,
{
    thread::spawn(move || {
        let report = enricher.run_batch(date, generation, &batch);
        if tx.send(report).is_err() {
            tracing::debug!(%date, "enrichment receiver dropped");
        }
    })
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
