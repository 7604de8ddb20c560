use serde::Serialize;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::series::{ReturnSeries, PERCENT};
use crate::stats;

/// Verdict of comparing forecast volatility with the rolling baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyAssessment {
    /// Forecast next-period volatility, as a fraction
    pub current_volatility: f64,
    /// Baseline volatility scaled by the multiplier, as a fraction
    pub threshold: f64,
    /// `current_volatility > threshold`
    pub is_anomalous: bool,
}

impl AnomalyAssessment {
    /// How far above (positive) or below the threshold the forecast sits, as a ratio
    pub fn excess_ratio(&self) -> Option<f64> {
        if self.threshold > 0.0 {
            Some(self.current_volatility / self.threshold - 1.0)
        } else {
            None
        }
    }
}

/// Flags forecast volatility that exceeds a scaled rolling baseline
#[derive(Debug, Clone, Copy)]
pub struct AnomalyDetector {
    window: usize,
    multiplier: f64,
}

impl AnomalyDetector {
    pub fn new(window: usize, multiplier: f64) -> Result<Self> {
        if window == 0 {
            return Err(PipelineError::InvalidParameters(
                "rolling window must be >= 1".to_string(),
            ));
        }
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(PipelineError::InvalidParameters(format!(
                "threshold multiplier must be >= 1.0, got {}",
                multiplier
            )));
        }
        Ok(AnomalyDetector { window, multiplier })
    }

    /// Baseline threshold: mean rolling sample std of the returns, de-scaled and multiplied
    pub fn threshold(&self, returns: &ReturnSeries) -> Result<f64> {
        let rolled = stats::rolling_std(returns.values(), self.window);
        if rolled.is_empty() {
            return Err(PipelineError::InsufficientWindow {
                window: self.window,
                available: returns.len(),
            });
        }
        Ok(stats::mean(&rolled) / PERCENT * self.multiplier)
    }

    /// Compare a volatility forecast against the baseline
    ///
    /// Equality is not anomalous: the threshold is a floor that must be
    /// strictly exceeded.
    pub fn assess(&self, current_volatility: f64, returns: &ReturnSeries) -> Result<AnomalyAssessment> {
        let threshold = self.threshold(returns)?;
        let is_anomalous = current_volatility > threshold;
        debug!(
            current_volatility,
            threshold,
            window = self.window,
            multiplier = self.multiplier,
            "Assessed volatility against rolling baseline"
        );
        Ok(AnomalyAssessment {
            current_volatility,
            threshold,
            is_anomalous,
        })
    }
}
