use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::http_cache::{ResponseCache, cache_for_ttl};
use crate::http_client::http_client;
use crate::provider::{LeagueRef, Match, MatchProvider, MatchStatus, TeamRef};

const API_KEY_HEADER: &str = "x-apisports-key";
const QUOTA_HEADER: &str = "x-ratelimit-requests-remaining";

pub struct ApiFootballProvider {
    client: &'static Client,
    base_url: String,
    api_key: String,
    cache: Arc<dyn ResponseCache>,
    remaining: Mutex<Option<u32>>,
}

impl ApiFootballProvider {
    pub fn new(
        client: &'static Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        cache: Arc<dyn ResponseCache>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            cache,
            remaining: Mutex::new(None),
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(cfg: &Config) -> Result<Option<Self>> {
        let Some(key) = cfg.api_key.as_deref() else {
            return Ok(None);
        };
        let client = http_client(cfg.request_timeout)?;
        Ok(Some(Self::new(
            client,
            cfg.api_base_url.clone(),
            key,
            cache_for_ttl(cfg.cache_ttl),
        )))
    }

    fn fetch_fixtures(&self, path_and_query: &str) -> Result<Vec<Match>> {
        let url = format!("{}{}", self.base_url, path_and_query);
        if let Some(body) = self.cache.get(&url) {
            tracing::debug!(%url, "fixtures served from cache");
            return parse_fixtures_json(&body);
        }

        let resp = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .send()
            .context("request failed")?;
        let status = resp.status();
        if let Some(remaining) = resp
            .headers()
            .get(QUOTA_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u32>().ok())
        {
            *self.remaining.lock().unwrap_or_else(|p| p.into_inner()) = Some(remaining);
            tracing::debug!(remaining, "provider quota");
        }
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            return Err(anyhow!("http {status}: {snippet}"));
        }

        let matches = parse_fixtures_json(&body)?;
        self.cache.set(&url, body);
        Ok(matches)
    }
}

impl MatchProvider for ApiFootballProvider {
    fn matches_for_date(&self, date: NaiveDate) -> Result<Vec<Match>> {
        let evicted = self.cache.evict_expired();
        if evicted > 0 {
            tracing::debug!(evicted, "expired cache entries dropped");
        }
        self.fetch_fixtures(&format!("/fixtures?date={}", date.format("%Y-%m-%d")))
            .with_context(|| format!("fixtures for {date}"))
    }

    fn recent_matches(&self, team_id: u32, count: usize) -> Result<Vec<Match>> {
        self.fetch_fixtures(&format!("/fixtures?team={team_id}&last={count}"))
            .with_context(|| format!("recent matches for team {team_id}"))
    }

    fn head_to_head(&self, team_a: u32, team_b: u32, count: usize) -> Result<Vec<Match>> {
        self.fetch_fixtures(&format!(
            "/fixtures/headtohead?h2h={team_a}-{team_b}&last={count}"
        ))
        .with_context(|| format!("head-to-head {team_a}-{team_b}"))
    }

    fn remaining_quota(&self) -> Option<u32> {
        *self.remaining.lock().unwrap_or_else(|p| p.into_inner())
    }
}

#[derive(Debug, Deserialize)]
struct FixturesResponse {
    #[serde(default)]
    errors: Value,
    #[serde(default)]
    response: Vec<FixtureItem>,
}

#[derive(Debug, Deserialize)]
struct FixtureItem {
    fixture: FixtureInfo,
    league: LeagueInfo,
    teams: TeamsInfo,
    #[serde(default)]
    goals: GoalsInfo,
}

#[derive(Debug, Deserialize)]
struct FixtureInfo {
    id: u64,
    #[serde(default)]
    date: String,
    status: StatusInfo,
}

#[derive(Debug, Deserialize)]
struct StatusInfo {
    short: String,
}

#[derive(Debug, Deserialize)]
struct LeagueInfo {
    id: u32,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TeamsInfo {
    home: TeamInfo,
    away: TeamInfo,
}

#[derive(Debug, Deserialize)]
struct TeamInfo {
    id: u32,
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct GoalsInfo {
    home: Option<u8>,
    away: Option<u8>,
}

/// Parse a `/fixtures` style body. A non-empty `errors` field is a failure.
pub fn parse_fixtures_json(raw: &str) -> Result<Vec<Match>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let data: FixturesResponse = serde_json::from_str(trimmed).context("invalid fixtures json")?;
    if has_errors(&data.errors) {
        return Err(anyhow!("provider error: {}", data.errors));
    }

    Ok(data
        .response
        .into_iter()
        .map(|item| Match {
            id: item.fixture.id,
            kickoff: normalize_utc_time(&item.fixture.date).unwrap_or_default(),
            status: MatchStatus::from_code(&item.fixture.status.short),
            league: LeagueRef {
                id: item.league.id,
                name: item.league.name,
            },
            home: TeamRef {
                id: item.teams.home.id,
                name: item.teams.home.name,
            },
            away: TeamRef {
                id: item.teams.away.id,
                name: item.teams.away.name,
            },
            home_goals: item.goals.home,
            away_goals: item.goals.away,
        })
        .collect())
}

fn has_errors(errors: &Value) -> bool {
    match errors {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

fn normalize_utc_time(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(minutes) = trimmed.get(..16) {
        return Some(minutes.to_string());
    }
    Some(trimmed.replace(' ', "T"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_shapes_are_detected() {
        assert!(!has_errors(&Value::Null));
        assert!(!has_errors(&serde_json::json!([])));
        assert!(!has_errors(&serde_json::json!({})));
        assert!(has_errors(&serde_json::json!({"requests": "limit reached"})));
        assert!(has_errors(&serde_json::json!(["bad"])));
    }

    #[test]
    fn kickoff_is_trimmed_to_minutes() {
        assert_eq!(
            normalize_utc_time("2026-10-17T19:00:00+00:00").as_deref(),
            Some("2026-10-17T19:00")
        );
        assert!(normalize_utc_time(" ").is_none());
    }
}
