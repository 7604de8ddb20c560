use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Sampling frequency of the incoming price series
///
/// Only used to pick the default rolling window and the minimum history
/// required by the volatility model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplingInterval {
    SubHourly,
    Hourly,
    #[default]
    Daily,
}

impl SamplingInterval {
    /// Default baseline window, in periods
    pub fn default_window(&self) -> usize {
        match self {
            SamplingInterval::SubHourly => 12,
            SamplingInterval::Hourly => 24,
            SamplingInterval::Daily => 30,
        }
    }

    /// Default number of returns the GARCH fit needs
    pub fn min_observations(&self) -> usize {
        match self {
            SamplingInterval::SubHourly => 60,
            SamplingInterval::Hourly => 48,
            SamplingInterval::Daily => 30,
        }
    }
}

impl std::fmt::Display for SamplingInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SamplingInterval::SubHourly => write!(f, "sub-hourly"),
            SamplingInterval::Hourly => write!(f, "hourly"),
            SamplingInterval::Daily => write!(f, "daily"),
        }
    }
}

/// Settings for the maximum-likelihood simplex search
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Iteration cap before the fit is declared unconverged
    pub max_iterations: usize,
    /// Spread of the simplex objective values that counts as converged
    pub tolerance: f64,
    /// Simplex size, in unconstrained coordinates, that counts as converged
    pub x_tolerance: f64,
    /// Returns whose sample variance is at most this fraction of their mean
    /// square are treated as having no variance, and forecast zero volatility.
    /// Relative, so it does not depend on the scale of the returns.
    pub degenerate_tolerance: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            max_iterations: 5000,
            tolerance: 1e-9,
            x_tolerance: 1e-6,
            degenerate_tolerance: 1e-12,
        }
    }
}

/// Everything one pipeline run needs, passed by value into `compute`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of future periods to simulate (rows of the ensemble, anchor included)
    pub horizon_steps: usize,
    /// Number of simulated paths
    pub path_count: usize,
    /// Anomaly sensitivity; the baseline volatility is scaled by this
    pub threshold_multiplier: f64,
    /// Baseline window override; defaults to the interval's window
    pub rolling_window: Option<usize>,
    /// Sampling frequency of the input series
    pub interval: SamplingInterval,
    /// GARCH history floor override; defaults to the interval's floor
    pub min_observations: Option<usize>,
    /// Fixed seed for the simulation; `None` draws one from the OS
    pub seed: Option<u64>,
    /// Upper bound on horizon_steps × path_count
    pub max_ensemble_cells: usize,
    /// Size of the simulation worker pool; `None` uses rayon's global pool
    pub num_threads: Option<usize>,
    pub fit: FitOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            horizon_steps: 30,         // One month of daily steps
            path_count: 1000,          // Ensemble size
            threshold_multiplier: 1.5, // 50% above baseline volatility
            rolling_window: None,
            interval: SamplingInterval::Daily,
            min_observations: None,
            seed: None,
            max_ensemble_cells: 10_000_000,
            num_threads: None,
            fit: FitOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Hourly preset: one day ahead with a one-day baseline
    pub fn hourly() -> Self {
        PipelineConfig {
            horizon_steps: 24,
            interval: SamplingInterval::Hourly,
            ..Self::default()
        }
    }

    /// Sub-hourly preset: a short horizon with a tight baseline
    pub fn sub_hourly() -> Self {
        PipelineConfig {
            horizon_steps: 12,
            interval: SamplingInterval::SubHourly,
            ..Self::default()
        }
    }

    /// Same configuration with a fixed simulation seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Rolling window actually used by the anomaly detector
    pub fn window(&self) -> usize {
        self.rolling_window
            .unwrap_or_else(|| self.interval.default_window())
    }

    /// Minimum return count required by the volatility model
    pub fn fit_floor(&self) -> usize {
        self.min_observations
            .unwrap_or_else(|| self.interval.min_observations())
    }

    /// Check the settings that gate the assessment itself
    ///
    /// Simulation settings are checked by the simulator so that a bad
    /// horizon or path count never hides a valid assessment.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold_multiplier.is_finite() || self.threshold_multiplier < 1.0 {
            return Err(PipelineError::InvalidParameters(format!(
                "threshold_multiplier must be >= 1.0, got {}",
                self.threshold_multiplier
            )));
        }
        if self.window() == 0 {
            return Err(PipelineError::InvalidParameters(
                "rolling_window must be >= 1".to_string(),
            ));
        }
        if self.fit_floor() < 2 {
            return Err(PipelineError::InvalidParameters(format!(
                "min_observations must be >= 2, got {}",
                self.fit_floor()
            )));
        }
        if self.fit.max_iterations == 0
            || !(self.fit.tolerance > 0.0)
            || !(self.fit.x_tolerance > 0.0)
        {
            return Err(PipelineError::InvalidParameters(
                "fit options need max_iterations >= 1 and positive tolerances".to_string(),
            ));
        }
        if !(self.fit.degenerate_tolerance >= 0.0 && self.fit.degenerate_tolerance < 1.0) {
            return Err(PipelineError::InvalidParameters(format!(
                "degenerate_tolerance must be in [0, 1), got {}",
                self.fit.degenerate_tolerance
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_drives_window_and_floor() {
        let daily = PipelineConfig::default();
        assert_eq!(daily.window(), 30);
        assert_eq!(daily.fit_floor(), 30);

        let hourly = PipelineConfig::hourly();
        assert_eq!(hourly.window(), 24);
        assert_eq!(hourly.fit_floor(), 48);

        let overridden = PipelineConfig {
            rolling_window: Some(10),
            min_observations: Some(5),
            ..PipelineConfig::sub_hourly()
        };
        assert_eq!(overridden.window(), 10);
        assert_eq!(overridden.fit_floor(), 5);
    }

    #[test]
    fn multiplier_below_one_is_rejected() {
        let config = PipelineConfig {
            threshold_multiplier: 0.9,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidParameters(_))
        ));
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = PipelineConfig {
            rolling_window: Some(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_simulation_settings_do_not_fail_validation() {
        let config = PipelineConfig {
            horizon_steps: 0,
            path_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            path_count = 250
            interval = "hourly"

            [fit]
            max_iterations = 800
            "#,
        )
        .unwrap();

        assert_eq!(config.path_count, 250);
        assert_eq!(config.horizon_steps, 30);
        assert_eq!(config.interval, SamplingInterval::Hourly);
        assert_eq!(config.window(), 24);
        assert_eq!(config.fit.max_iterations, 800);
        assert_eq!(config.fit.tolerance, 1e-9);
        assert_eq!(config.fit.x_tolerance, 1e-6);
        assert_eq!(config.fit.degenerate_tolerance, 1e-12);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn out_of_range_fit_tolerances_are_rejected() {
        for fit in [
            FitOptions {
                x_tolerance: 0.0,
                ..FitOptions::default()
            },
            FitOptions {
                degenerate_tolerance: 1.0,
                ..FitOptions::default()
            },
            FitOptions {
                degenerate_tolerance: f64::NAN,
                ..FitOptions::default()
            },
        ] {
            let config = PipelineConfig {
                fit,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(PipelineError::InvalidParameters(_))
            ));
        }
    }
}
