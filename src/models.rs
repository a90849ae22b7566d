// src/models.rs
use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::ReportError;

/// One daily closing value of the tracked yield.
#[derive(Debug, Clone, PartialEq)]
pub struct YieldSample {
    pub date: NaiveDate,
    pub close: f64,
}

/// Ordered daily closes, most recent last. Holds at least 2 samples so a
/// day-over-day movement can always be computed.
#[derive(Debug, Clone)]
pub struct YieldSeries {
    samples: Vec<YieldSample>,
}

impl YieldSeries {
    pub fn new(samples: Vec<YieldSample>) -> Result<Self, ReportError> {
        if samples.len() < 2 {
            return Err(ReportError::InsufficientHistory(samples.len()));
        }
        Ok(YieldSeries { samples })
    }

    pub fn samples(&self) -> &[YieldSample] {
        &self.samples
    }

    pub fn latest(&self) -> &YieldSample {
        // len >= 2 guaranteed by new()
        &self.samples[self.samples.len() - 1]
    }

    pub fn previous(&self) -> &YieldSample {
        &self.samples[self.samples.len() - 2]
    }

    /// Day-over-day movement in basis points: (latest - previous) * 100.
    pub fn movement_bps(&self) -> f64 {
        (self.latest().close - self.previous().close) * 100.0
    }
}

/// Payload embedded in the user message sent to the completion endpoint.
/// Field names match the shape the system prompt announces to the model.
#[derive(Debug, Serialize)]
pub struct AnalysisRequest {
    #[serde(rename = "Rate_Movement")]
    pub rate_movement: f64,
    #[serde(rename = "Market_Data")]
    pub market_data: String,
}
