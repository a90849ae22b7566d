// src/services/treasury.rs
use chrono::{Datelike, Duration, NaiveDate};
use csv::Reader;
use log::info;
use reqwest;

use crate::errors::ReportError;
use crate::models::{YieldSample, YieldSeries};

fn csv_url(year: i32) -> String {
    format!(
        "https://home.treasury.gov/resource-center/data-chart-center/interest-rates/\
daily-treasury-rates.csv/{year}/all?_format=csv\
&field_tdr_date_value={year}\
&type=daily_treasury_yield_curve",
        year = year
    )
}

/// Parse the daily yield-curve CSV into samples for one maturity column,
/// keeping rows on or after `cutoff`, ordered most-recent-last.
pub fn parse_yield_csv(
    csv_text: &str,
    maturity: &str,
    cutoff: NaiveDate,
) -> Result<Vec<YieldSample>, ReportError> {
    let mut rdr = Reader::from_reader(csv_text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| ReportError::DataUnavailable(e.to_string()))?
        .clone();
    let idx_date = headers
        .iter()
        .position(|h| h.trim() == "Date")
        .ok_or_else(|| ReportError::DataUnavailable("no 'Date' column in yield CSV".to_string()))?;
    let idx_close = headers
        .iter()
        .position(|h| h.trim() == maturity)
        .ok_or_else(|| {
            ReportError::DataUnavailable(format!("no '{}' column in yield CSV", maturity))
        })?;

    let mut samples = Vec::new();
    for record in rdr.records() {
        let row = record.map_err(|e| ReportError::DataUnavailable(e.to_string()))?;
        let date_cell = row
            .get(idx_date)
            .ok_or_else(|| ReportError::DataUnavailable("missing 'Date' field".to_string()))?
            .trim();
        let date = NaiveDate::parse_from_str(date_cell, "%m/%d/%Y").map_err(|e| {
            ReportError::DataUnavailable(format!("bad date '{}': {}", date_cell, e))
        })?;
        if date < cutoff {
            continue;
        }

        let cell = row
            .get(idx_close)
            .ok_or_else(|| {
                ReportError::DataUnavailable(format!("missing '{}' field", maturity))
            })?
            .trim();
        // The curve CSV leaves cells blank for maturities not yet published
        if cell.is_empty() || cell == "N/A" {
            continue;
        }
        let close = cell.parse::<f64>().map_err(|e| {
            ReportError::DataUnavailable(format!("bad '{}' value '{}': {}", maturity, cell, e))
        })?;
        samples.push(YieldSample { date, close });
    }

    // Rows come most-recent-first; callers want most-recent-last
    samples.sort_by_key(|s| s.date);
    Ok(samples)
}

/// Whether the current-year CSV left the window too short to compute a
/// movement and the prior year's file can still contribute rows.
fn window_needs_prior_year(samples: &[YieldSample], cutoff: NaiveDate, today: NaiveDate) -> bool {
    samples.len() < 2 && cutoff.year() < today.year()
}

/// Merge prior-year rows with current-year rows, keeping most-recent-last.
fn merge_years(prior: Vec<YieldSample>, current: Vec<YieldSample>) -> Vec<YieldSample> {
    let mut merged = prior;
    merged.extend(current);
    merged.sort_by_key(|s| s.date);
    merged
}

async fn fetch_year(
    year: i32,
    maturity: &str,
    cutoff: NaiveDate,
) -> Result<Vec<YieldSample>, ReportError> {
    let url = csv_url(year);
    info!("Fetching daily yield CSV from URL: {}", url);

    let csv_text = reqwest::get(&url)
        .await
        .map_err(|e| ReportError::DataUnavailable(e.to_string()))?
        .text()
        .await
        .map_err(|e| ReportError::DataUnavailable(e.to_string()))?;

    parse_yield_csv(&csv_text, maturity, cutoff)
}

/// Fetch daily closes for one maturity via the Treasury CSV endpoint, looking
/// back `lookback_days` from `today` (the run date on the market calendar).
pub async fn fetch_yield_history(
    maturity: &str,
    lookback_days: i64,
    today: NaiveDate,
) -> Result<YieldSeries, ReportError> {
    let cutoff = today - Duration::days(lookback_days);

    let mut samples = fetch_year(today.year(), maturity, cutoff).await?;

    // Early in January the current-year CSV may not cover the window yet
    if window_needs_prior_year(&samples, cutoff, today) {
        info!(
            "Only {} row(s) in the {} CSV, pulling {} as well",
            samples.len(),
            today.year(),
            today.year() - 1
        );
        let prior = fetch_year(today.year() - 1, maturity, cutoff).await?;
        samples = merge_years(prior, samples);
    }

    if samples.is_empty() {
        return Err(ReportError::DataUnavailable(
            "no data rows in yield CSV".to_string(),
        ));
    }

    let series = YieldSeries::new(samples)?;
    info!(
        "Fetched {} daily closes, latest {} = {}",
        series.samples().len(),
        series.latest().date,
        series.latest().close
    );
    Ok(series)
}
