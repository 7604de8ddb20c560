//! Monte Carlo projection of future prices
//!
//! Paths follow a discretised geometric Brownian motion:
//!
//!   S(t) = S(t-1) × exp(μ - σ²/2 + σ × Z(t)),   Z(t) ~ N(0, 1)
//!
//! with μ and σ held constant over the whole horizon. The volatility is not
//! re-forecast inside the horizon.
//!
//! # Determinism
//!
//! The ensemble is seeded once. Path `i` draws from its own generator seeded
//! with the `i`-th SplitMix64 output for `base_seed`, so results depend only on
//! the seed and never on the number of worker threads or the order in which
//! paths finish. Neighbouring base seeds share no paths.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};

/// Inputs of one projection
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationParams {
    /// Anchor price S0, the last observed price
    pub anchor: f64,
    /// Rows of the ensemble, anchor included
    pub steps: usize,
    /// Columns of the ensemble
    pub paths: usize,
    /// Per-period mean return, as a fraction
    pub mean_return: f64,
    /// Per-period volatility, as a fraction
    pub volatility: f64,
}

impl SimulationParams {
    /// Log-price drift per step, μ - σ²/2
    pub fn drift(&self) -> f64 {
        self.mean_return - 0.5 * self.volatility.powi(2)
    }

    fn validate(&self, max_cells: usize) -> Result<()> {
        if !self.anchor.is_finite() || self.anchor <= 0.0 {
            return Err(PipelineError::InvalidParameters(format!(
                "anchor price must be positive, got {}",
                self.anchor
            )));
        }
        if self.steps < 1 {
            return Err(PipelineError::InvalidParameters(
                "horizon must be at least one step".to_string(),
            ));
        }
        if self.paths < 1 {
            return Err(PipelineError::InvalidParameters(
                "path count must be at least one".to_string(),
            ));
        }
        if !self.volatility.is_finite() || self.volatility < 0.0 {
            return Err(PipelineError::InvalidParameters(format!(
                "volatility must be non-negative, got {}",
                self.volatility
            )));
        }
        if !self.mean_return.is_finite() {
            return Err(PipelineError::InvalidParameters(
                "mean return must be finite".to_string(),
            ));
        }
        match self.steps.checked_mul(self.paths) {
            Some(cells) if cells <= max_cells => Ok(()),
            _ => Err(PipelineError::InvalidParameters(format!(
                "{} steps × {} paths exceeds the cap of {} simulated prices",
                self.steps, self.paths, max_cells
            ))),
        }
    }
}

/// Simulated prices: `steps` rows by `path_count` columns
///
/// Stored path-major, one contiguous vector per simulated run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathEnsemble {
    steps: usize,
    base_seed: u64,
    paths: Vec<Vec<f64>>,
}

impl PathEnsemble {
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }

    /// Seed the ensemble was generated from; replaying it reproduces the paths
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// One simulated run (a column)
    pub fn path(&self, run: usize) -> &[f64] {
        &self.paths[run]
    }

    pub fn paths(&self) -> &[Vec<f64>] {
        &self.paths
    }

    /// Price of `run` at `step`
    pub fn value(&self, step: usize, run: usize) -> f64 {
        self.paths[run][step]
    }

    /// Cross-section of all runs at `step` (a row)
    pub fn row(&self, step: usize) -> Vec<f64> {
        self.paths.iter().map(|path| path[step]).collect()
    }

    /// Anchor price shared by every path
    pub fn anchor(&self) -> f64 {
        self.paths.first().map(|p| p[0]).unwrap_or(f64::NAN)
    }
}

/// Generates independent price paths in parallel
#[derive(Debug, Clone)]
pub struct PathSimulator {
    seed: Option<u64>,
    num_threads: Option<usize>,
    max_cells: usize,
}

impl Default for PathSimulator {
    fn default() -> Self {
        PathSimulator {
            seed: None,
            num_threads: None,
            max_cells: 10_000_000,
        }
    }
}

impl PathSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the ensemble seed for reproducible output
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Fix the ensemble seed, or leave it to OS entropy
    pub fn seed_opt(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Set number of threads (defaults to rayon's global pool)
    pub fn num_threads(mut self, n: Option<usize>) -> Self {
        self.num_threads = n;
        self
    }

    /// Cap on steps × paths
    pub fn max_cells(mut self, cells: usize) -> Self {
        self.max_cells = cells;
        self
    }

    /// Simulate every path, or fail without producing any
    pub fn simulate(&self, params: &SimulationParams) -> Result<PathEnsemble> {
        params.validate(self.max_cells)?;

        let base_seed = self.seed.unwrap_or_else(|| rand::rng().random());
        let drift = params.drift();

        let pool = match self.num_threads {
            Some(0) => {
                return Err(PipelineError::InvalidParameters(
                    "num_threads must be at least one".to_string(),
                ))
            }
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| {
                        PipelineError::InvalidParameters(format!("cannot build worker pool: {}", e))
                    })?,
            ),
            None => None,
        };

        let execute = || {
            (0..params.paths)
                .into_par_iter()
                .map(|run| {
                    let mut rng = StdRng::seed_from_u64(path_seed(base_seed, run as u64));
                    simulate_path(params, drift, &mut rng)
                })
                .collect::<Vec<Vec<f64>>>()
        };

        let paths = match pool {
            Some(pool) => pool.install(execute),
            None => execute(),
        };

        if paths
            .iter()
            .flatten()
            .any(|price| !price.is_finite() || *price <= 0.0)
        {
            return Err(PipelineError::InvalidParameters(
                "simulated prices left the representable range; volatility too large".to_string(),
            ));
        }

        info!(
            steps = params.steps,
            paths = params.paths,
            base_seed,
            "Simulated price ensemble"
        );
        debug!(drift, volatility = params.volatility, "Ensemble dynamics");

        Ok(PathEnsemble {
            steps: params.steps,
            base_seed,
            paths,
        })
    }
}

/// SplitMix64 output number `run` for state `base`
fn path_seed(base: u64, run: u64) -> u64 {
    let mut z = base.wrapping_add(0x9E37_79B9_7F4A_7C15_u64.wrapping_mul(run.wrapping_add(1)));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn simulate_path<R: Rng>(params: &SimulationParams, drift: f64, rng: &mut R) -> Vec<f64> {
    let mut path = Vec::with_capacity(params.steps);
    let mut price = params.anchor;
    path.push(price);
    for _ in 1..params.steps {
        let z: f64 = StandardNormal.sample(rng);
        price *= (drift + params.volatility * z).exp();
        path.push(price);
    }
    path
}
