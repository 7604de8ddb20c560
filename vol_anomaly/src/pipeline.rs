use serde::Serialize;
use tracing::{debug, info, warn};

use crate::anomaly::{AnomalyAssessment, AnomalyDetector};
use crate::error::{PipelineError, Result};
use crate::garch::{GarchModel, VolatilityForecast};
use crate::params::PipelineConfig;
use crate::series::{PriceSeries, ReturnSeries};
use crate::simulation::{PathEnsemble, PathSimulator, SimulationParams};
use crate::summary::{summarize, PathSummary};

/// What happened after the assessment
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Projection {
    /// Volatility was within range; nothing was simulated
    Skipped,
    /// Volatility was anomalous and the ensemble was produced
    Simulated {
        ensemble: PathEnsemble,
        summary: PathSummary,
    },
    /// Volatility was anomalous but the simulation stage failed
    Failed { error: String },
}

/// Everything one run produces
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Number of returns the assessment was built from
    pub return_count: usize,
    /// Mean return, as a fraction
    pub mean_return: f64,
    /// Rolling window used for the baseline
    pub window: usize,
    pub forecast: VolatilityForecast,
    pub assessment: AnomalyAssessment,
    pub projection: Projection,
    /// Error behind `Projection::Failed`, kept typed for callers
    #[serde(skip)]
    pub projection_error: Option<PipelineError>,
}

impl Report {
    /// Summary of the simulated ensemble, when one was produced
    pub fn summary(&self) -> Option<&PathSummary> {
        match &self.projection {
            Projection::Simulated { summary, .. } => Some(summary),
            _ => None,
        }
    }

    pub fn ensemble(&self) -> Option<&PathEnsemble> {
        match &self.projection {
            Projection::Simulated { ensemble, .. } => Some(ensemble),
            _ => None,
        }
    }

    /// The assessment plus optional summary
    pub fn outcome(&self) -> (AnomalyAssessment, Option<&PathSummary>) {
        (self.assessment, self.summary())
    }
}

/// Run the whole pipeline once on a price history
///
/// prices → returns → GARCH forecast → anomaly assessment → (if anomalous)
/// simulated ensemble → summary. Any failure before the assessment is
/// returned as an error; a failure in the simulation stage is reported in
/// the `Report` next to the assessment that triggered it.
pub fn compute(prices: &PriceSeries, config: PipelineConfig) -> Result<Report> {
    config.validate()?;

    let returns = ReturnSeries::from_prices(prices)?;
    let window = config.window();
    if returns.len() < window {
        return Err(PipelineError::InsufficientWindow {
            window,
            available: returns.len(),
        });
    }
    debug!(
        returns = returns.len(),
        interval = %config.interval,
        window,
        "Computed return series"
    );

    let forecast = GarchModel::new(config.fit_floor(), config.fit.clone()).fit(&returns)?;

    let detector = AnomalyDetector::new(window, config.threshold_multiplier)?;
    let assessment = detector.assess(forecast.current_volatility, &returns)?;
    info!(
        current_volatility = assessment.current_volatility,
        threshold = assessment.threshold,
        anomalous = assessment.is_anomalous,
        "Volatility assessment"
    );

    let mean_return = returns.mean_fraction();
    let (projection, projection_error) = if assessment.is_anomalous {
        match project(prices, &config, mean_return, forecast.current_volatility) {
            Ok((ensemble, summary)) => (Projection::Simulated { ensemble, summary }, None),
            Err(e) => {
                warn!(error = %e, "Simulation skipped after anomalous assessment");
                (
                    Projection::Failed {
                        error: e.to_string(),
                    },
                    Some(e),
                )
            }
        }
    } else {
        (Projection::Skipped, None)
    };

    Ok(Report {
        return_count: returns.len(),
        mean_return,
        window,
        forecast,
        assessment,
        projection,
        projection_error,
    })
}

fn project(
    prices: &PriceSeries,
    config: &PipelineConfig,
    mean_return: f64,
    volatility: f64,
) -> Result<(PathEnsemble, PathSummary)> {
    let anchor = prices
        .last()
        .map(|p| p.price)
        .ok_or(PipelineError::InsufficientData {
            required: 1,
            actual: 0,
        })?;

    let params = SimulationParams {
        anchor,
        steps: config.horizon_steps,
        paths: config.path_count,
        mean_return,
        volatility,
    };
    let ensemble = PathSimulator::new()
        .seed_opt(config.seed)
        .num_threads(config.num_threads)
        .max_cells(config.max_ensemble_cells)
        .simulate(&params)?;
    let summary = summarize(&ensemble)?;
    Ok((ensemble, summary))
}
