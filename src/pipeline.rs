// src/pipeline.rs
use chrono::Utc;
use chrono_tz::America::New_York;
use log::info;
use std::env;
use std::path::PathBuf;

use crate::config::Config;
use crate::errors::ReportError;
use crate::report;
use crate::services::analysis::AnalysisClient;
use crate::services::narrative::{self, SelectorExtractor};
use crate::services::treasury;

/// Run the full pipeline once: fetch the yield history, scrape the narrative,
/// generate the explanation, render and write the report. Returns the path of
/// the written file. Any failure aborts the run; nothing is retried.
pub async fn run(config: &Config) -> Result<PathBuf, ReportError> {
    // One run date on the US market calendar drives both the lookback window
    // and the report label, so a near-midnight-UTC run stays consistent
    let report_date = Utc::now().with_timezone(&New_York).date_naive();

    let series =
        treasury::fetch_yield_history(&config.maturity, config.lookback_days, report_date).await?;
    let movement = series.movement_bps();
    info!(
        "Movement: {:.1} bps ({} -> {})",
        movement,
        series.previous().close,
        series.latest().close
    );

    let http = narrative::http_client()?;
    let extractor = SelectorExtractor::new(config.narrative_selector.as_str());
    let narrative_text =
        narrative::fetch_narrative(&http, &config.narrative_url, &extractor).await?;

    let client = AnalysisClient::new(config)?;
    let analysis = client.explain(movement, &narrative_text).await?;

    let html = report::render(
        series.previous(),
        series.latest(),
        movement,
        &config.maturity,
        &analysis,
        report_date,
    );
    let filename = report::report_filename(report_date);
    let cwd = env::current_dir()?;
    let path = report::write_report(&cwd, &filename, &html)?;

    if config.open_after_render {
        report::open_report(&path);
    }

    Ok(path)
}
