// src/report.rs
use chrono::NaiveDate;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::errors::ReportError;
use crate::models::YieldSample;

/// Render the complete report document: date-stamped heading, yield-summary
/// card (yields to 2 decimals, movement to 1) and the analysis card embedding
/// the validated list markup. Deterministic for fixed inputs.
pub fn render(
    previous: &YieldSample,
    latest: &YieldSample,
    movement_bps: f64,
    maturity: &str,
    analysis: &str,
    date: NaiveDate,
) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <link href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css" rel="stylesheet">
    <title>AI Treasury Bond Market Report</title>
</head>
<body>
    <div class="container mt-5">
        <h2 class="mb-4">Market Report - {heading_date}</h2>

        <div class="card">
            <div class="card-header">
                <h3>{maturity} Treasury Rate</h3>
            </div>
            <div class="card-body">
                <p><strong>Previous Close:</strong> <span class="badge bg-secondary">{previous:.2}%</span></p>
                <p><strong>Today's Close:</strong> <span class="badge bg-primary">{latest:.2}%</span></p>
                <p><strong>Movement:</strong> <span class="badge bg-info">{movement:.1} bps</span></p>
            </div>
        </div>

        <div class="card mt-4">
            <div class="card-header">
                <h3>Analysis</h3>
            </div>
            <div class="card-body">
                {analysis}
            </div>
        </div>
    </div>
</body>
</html>
"#,
        heading_date = date.format("%B %d"),
        maturity = maturity,
        previous = previous.close,
        latest = latest.close,
        movement = movement_bps,
        analysis = analysis,
    )
}

/// Filename for the run date. Two runs on the same day produce the same name,
/// so the second overwrites the first.
pub fn report_filename(date: NaiveDate) -> String {
    format!("Morning Market Report - {}.html", date.format("%B %d"))
}

/// Persist the document into `dir`, replacing any same-day report.
pub fn write_report(dir: &Path, filename: &str, html: &str) -> Result<PathBuf, ReportError> {
    let path = dir.join(filename);
    fs::write(&path, html)?;
    info!("Report written to {}", path.display());
    Ok(path)
}

/// Post-render convenience hook: open the report in the default viewer.
/// Best-effort and platform-dependent; failures are logged, never fatal.
pub fn open_report(path: &Path) {
    #[cfg(target_os = "windows")]
    let spawned = Command::new("cmd").args(["/C", "start", ""]).arg(path).spawn();
    #[cfg(target_os = "macos")]
    let spawned = Command::new("open").arg(path).spawn();
    #[cfg(all(unix, not(target_os = "macos")))]
    let spawned = Command::new("xdg-open").arg(path).spawn();

    if let Err(e) = spawned {
        warn!("Could not open {} in a viewer: {}", path.display(), e);
    }
}
