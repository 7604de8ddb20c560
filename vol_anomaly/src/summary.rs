use serde::Serialize;

use crate::error::{PipelineError, Result};
use crate::simulation::PathEnsemble;
use crate::stats;

/// Default lower percentile band
pub const LOW_PERCENTILE: f64 = 5.0;
/// Default upper percentile band
pub const HIGH_PERCENTILE: f64 = 95.0;

/// Per-step statistics of a simulated ensemble
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathSummary {
    /// Price every path starts from
    pub anchor: f64,
    /// Cross-run mean per step
    pub expected_path: Vec<f64>,
    /// Lower percentile per step
    pub low_band: Vec<f64>,
    /// Upper percentile per step
    pub high_band: Vec<f64>,
    /// Percentile level of `low_band`
    pub low_percentile: f64,
    /// Percentile level of `high_band`
    pub high_percentile: f64,
}

/// Headline numbers at the end of the horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TerminalOutlook {
    pub anchor: f64,
    pub expected: f64,
    pub low: f64,
    pub high: f64,
}

impl PathSummary {
    pub fn len(&self) -> usize {
        self.expected_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expected_path.is_empty()
    }

    /// Expected price and band edges at the last step
    pub fn terminal(&self) -> Option<TerminalOutlook> {
        Some(TerminalOutlook {
            anchor: self.anchor,
            expected: *self.expected_path.last()?,
            low: *self.low_band.last()?,
            high: *self.high_band.last()?,
        })
    }

    /// Coverage of the band in percent (90 for 5/95)
    pub fn coverage(&self) -> f64 {
        self.high_percentile - self.low_percentile
    }
}

/// Summarise with the default 5th / 95th percentile bands
pub fn summarize(ensemble: &PathEnsemble) -> Result<PathSummary> {
    summarize_with(ensemble, LOW_PERCENTILE, HIGH_PERCENTILE)
}

/// Summarise with custom percentile bands, `0 <= low < high <= 100`
///
/// Percentiles interpolate linearly between order statistics
/// (see [`stats::percentile_sorted`]).
pub fn summarize_with(ensemble: &PathEnsemble, low: f64, high: f64) -> Result<PathSummary> {
    if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
        return Err(PipelineError::InvalidParameters(format!(
            "percentile bands must satisfy 0 <= low < high <= 100, got {} and {}",
            low, high
        )));
    }
    if ensemble.path_count() == 0 || ensemble.steps() == 0 {
        return Err(PipelineError::InsufficientData {
            required: 1,
            actual: 0,
        });
    }

    let steps = ensemble.steps();
    let mut expected_path = Vec::with_capacity(steps);
    let mut low_band = Vec::with_capacity(steps);
    let mut high_band = Vec::with_capacity(steps);

    for step in 0..steps {
        let mut row = ensemble.row(step);
        expected_path.push(stats::mean(&row));
        row.sort_by(|a, b| a.total_cmp(b));
        low_band.push(stats::percentile_sorted(&row, low));
        high_band.push(stats::percentile_sorted(&row, high));
    }

    Ok(PathSummary {
        anchor: ensemble.anchor(),
        expected_path,
        low_band,
        high_band,
        low_percentile: low,
        high_percentile: high,
    })
}
