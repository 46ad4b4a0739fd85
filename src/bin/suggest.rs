use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use betsense::api_football::ApiFootballProvider;
use betsense::bets::{BetStore, JsonBetStore};
use betsense::config::Config;
use betsense::performance::{PerformanceReport, summarize};
use betsense::provider::{MatchProvider, StaticProvider};
use betsense::{RefreshOutcome, SuggestionService};

const USAGE: &str = "usage: suggest <bets.json> [YYYY-MM-DD] [--wallet ID] [--json]";

struct Args {
    bets: PathBuf,
    date: NaiveDate,
    wallet: String,
    json: bool,
}

fn parse_args() -> Result<Args> {
    let mut bets = None;
    let mut date = None;
    let mut wallet = "default".to_string();
    let mut json = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--json" => json = true,
            "--wallet" => {
                wallet = args.next().ok_or_else(|| anyhow!("--wallet needs a value\n{USAGE}"))?;
            }
            _ if bets.is_none() => bets = Some(PathBuf::from(arg)),
            _ if date.is_none() => {
                date = Some(
                    NaiveDate::parse_from_str(&arg, "%Y-%m-%d")
                        .with_context(|| format!("invalid date {arg}"))?,
                );
            }
            _ => return Err(anyhow!("unexpected argument {arg}\n{USAGE}")),
        }
    }

    Ok(Args {
        bets: bets.ok_or_else(|| anyhow!(USAGE))?,
        date: date.unwrap_or_else(|| Utc::now().date_naive()),
        wallet,
        json,
    })
}

fn build_provider(cfg: &Config) -> Result<Arc<dyn MatchProvider>> {
    if let Some(provider) = ApiFootballProvider::from_config(cfg)? {
        tracing::info!(base_url = %cfg.api_base_url, "using API-Football provider");
        return Ok(Arc::new(provider));
    }
    let path = std::env::var("OFFLINE_PROVIDER")
        .map(PathBuf::from)
        .map_err(|_| anyhow!("set API_FOOTBALL_KEY or OFFLINE_PROVIDER"))?;
    tracing::info!(path = %path.display(), "using offline provider data");
    Ok(Arc::new(StaticProvider::load(&path)?))
}

#[derive(Serialize)]
struct Output<'a> {
    #[serde(flatten)]
    outcome: &'a RefreshOutcome,
    performance: &'a PerformanceReport,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let cfg = Config::from_env();
    let store: Arc<dyn BetStore> = Arc::new(JsonBetStore::new(&args.bets));
    let provider = build_provider(&cfg)?;

    let mut service = SuggestionService::new(store.clone(), provider, args.wallet.clone(), &cfg);
    let mut outcome = service.refresh(args.date)?;
    let mut warnings = std::mem::take(&mut outcome.warnings);
    while outcome.pending_matches > 0 {
        let before = outcome.pending_matches;
        outcome = service.refresh(args.date)?;
        warnings.append(&mut outcome.warnings);
        if outcome.pending_matches >= before {
            break;
        }
    }
    outcome.warnings = warnings;

    let bets = store.finished_bets(&args.wallet)?;
    let performance = summarize(&bets.simple, &bets.combined)?;

    if args.json {
        let out = Output {
            outcome: &outcome,
            performance: &performance,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_text(&outcome, &performance);
    Ok(())
}

fn print_text(outcome: &RefreshOutcome, performance: &PerformanceReport) {
    let ranking = &outcome.ranking;
    println!(
        "{}: {} fixtures considered, {} suggestions, {} high confidence",
        outcome.date, ranking.considered, ranking.emitted, ranking.high_confidence
    );
    if let Some(quota) = outcome.remaining_quota {
        println!("Provider requests remaining: {quota}");
    }
    for warning in &outcome.warnings {
        println!("! {warning}");
    }

    for (idx, s) in ranking.suggestions.iter().enumerate() {
        println!();
        println!(
            "{:>2}. {} vs {} ({}) {}",
            idx + 1,
            s.home,
            s.away,
            s.championship,
            s.kickoff
        );
        println!(
            "    {:.0}% confidence, suggest: {}",
            s.confidence,
            s.suggested_wager.label()
        );
        for line in &s.rationale {
            println!("    - {line}");
        }
    }

    println!();
    println!(
        "Bets: {} decided, staked {:.2}, profit {:.2}, ROI {:.1}%",
        performance.decided, performance.staked, performance.profit, performance.roi
    );
    for (range, bucket) in &performance.by_odds_range {
        if bucket.wins + bucket.losses == 0 {
            continue;
        }
        println!(
            "  odds {:<9} {:>3}W {:>3}L  {:>5.1}%  profit {:.2}",
            range.label(),
            bucket.wins,
            bucket.losses,
            bucket.win_rate,
            bucket.profit
        );
    }
}
