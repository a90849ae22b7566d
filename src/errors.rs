// src/errors.rs
use thiserror::Error;

/// Unified error type for the report pipeline. Every variant is terminal:
/// the run aborts and the message is surfaced to the operator.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The market data provider returned an empty or malformed series.
    #[error("market data unavailable: {0}")]
    DataUnavailable(String),

    /// Fewer than 2 closing values came back, so no movement can be computed.
    #[error("insufficient history: need at least 2 closes, got {0}")]
    InsufficientHistory(usize),

    /// Network or timeout failure while fetching the narrative page.
    #[error("failed to fetch narrative page: {0}")]
    Fetch(String),

    /// The narrative selector matched nothing usable on the page.
    #[error("narrative extraction failed: {0}")]
    Extraction(String),

    /// Missing or rejected completion-endpoint credential.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Completion endpoint failure. Status 0 means the request never got a
    /// response (transport error).
    #[error("completion endpoint error (status {status}): {detail}")]
    Upstream { status: u16, detail: String },

    /// Provider throttled the request. No retry is attempted.
    #[error("completion endpoint rate limited the request")]
    RateLimit,

    /// The model response did not contain the required list markup.
    #[error("model output is not well-formed list markup: {0}")]
    MalformedAnalysis(String),

    /// Filesystem failure while writing the report.
    #[error("failed to write report: {0}")]
    Write(#[from] std::io::Error),
}
