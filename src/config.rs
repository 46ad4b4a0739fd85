use std::env;
use std::time::Duration;

use crate::ranker::DEFAULT_HIGH_CONFIDENCE;

pub const DEFAULT_API_BASE_URL: &str = "https://v3.football.api-sports.io";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
    pub enrich_batch_size: usize,
    pub fetch_parallelism: usize,
    pub form_matches: usize,
    pub h2h_matches: usize,
    pub high_confidence: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(600),
            enrich_batch_size: 8,
            fetch_parallelism: 6,
            form_matches: 5,
            h2h_matches: 5,
            high_confidence: DEFAULT_HIGH_CONFIDENCE,
        }
    }
}

impl Config {
    /// Load `.env.local` and `.env` if present, then read the environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let number = |key: &str, default: u64, lo: u64, hi: u64| {
            lookup(key)
                .and_then(|val| val.trim().parse::<u64>().ok())
                .unwrap_or(default)
                .clamp(lo, hi)
        };

        Self {
            api_base_url: lookup("API_FOOTBALL_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(d.api_base_url),
            api_key: lookup("API_FOOTBALL_KEY")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            request_timeout: Duration::from_secs(number("HTTP_TIMEOUT_SECS", 10, 2, 60)),
            cache_ttl: Duration::from_secs(number("CACHE_TTL_SECS", 600, 0, 86_400)),
            enrich_batch_size: number("ENRICH_BATCH_SIZE", 8, 1, 64) as usize,
            fetch_parallelism: number("FETCH_PARALLELISM", 6, 2, 32) as usize,
            form_matches: number("FORM_MATCHES", 5, 1, 20) as usize,
            h2h_matches: number("H2H_MATCHES", 5, 1, 20) as usize,
            high_confidence: number("HIGH_CONFIDENCE", d.high_confidence as u64, 0, 100) as f64,
        }
    }
}
