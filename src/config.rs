// src/config.rs
use log::warn;
use std::env;

use crate::errors::ReportError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_MATURITY: &str = "10 Yr";
const DEFAULT_LOOKBACK_DAYS: i64 = 7;
const DEFAULT_NARRATIVE_URL: &str =
    "https://www.edwardjones.ca/ca-en/market-news-insights/stock-market-news/daily-market-recap";
const DEFAULT_NARRATIVE_SELECTOR: &str = "section.w-full";

/// Runtime settings, read once at startup and passed by reference into the
/// pipeline. The completion-endpoint credential lives here rather than in
/// process-wide state.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub model: String,
    pub maturity: String,
    pub lookback_days: i64,
    pub narrative_url: String,
    pub narrative_selector: String,
    pub open_after_render: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ReportError> {
        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ReportError::Authentication("OPENAI_API_KEY is not set".to_string()))?;
        if openai_api_key.trim().is_empty() {
            return Err(ReportError::Authentication(
                "OPENAI_API_KEY is empty".to_string(),
            ));
        }

        let lookback_days = match env::var("REPORT_LOOKBACK_DAYS") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(
                    "REPORT_LOOKBACK_DAYS={} is not a number, defaulting to {}",
                    raw, DEFAULT_LOOKBACK_DAYS
                );
                DEFAULT_LOOKBACK_DAYS
            }),
            Err(_) => DEFAULT_LOOKBACK_DAYS,
        };

        Ok(Config {
            openai_api_key,
            openai_base_url: env_or("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            model: env_or("REPORT_MODEL", DEFAULT_MODEL),
            maturity: env_or("REPORT_MATURITY", DEFAULT_MATURITY),
            lookback_days,
            narrative_url: env_or("REPORT_NARRATIVE_URL", DEFAULT_NARRATIVE_URL),
            narrative_selector: env_or("REPORT_NARRATIVE_SELECTOR", DEFAULT_NARRATIVE_SELECTOR),
            open_after_render: env::var("REPORT_OPEN").map(|v| v == "1").unwrap_or(false),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
