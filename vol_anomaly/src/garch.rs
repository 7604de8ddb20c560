use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::optimize::{Minimum, NelderMead};
use crate::params::FitOptions;
use crate::series::{ReturnSeries, PERCENT};
use crate::stats;

/// Decay of the exponentially weighted backcast that seeds the recursion
const BACKCAST_DECAY: f64 = 0.94;
/// Number of leading residuals the backcast looks at
const BACKCAST_SPAN: usize = 75;
/// Restarts from the current optimum before the fit gives up improving
const MAX_RESTARTS: usize = 10;

/// GARCH(1,1) parameters with a constant mean
///
///   r(t)  = mu + ε(t)
///   σ²(t) = ω + α × ε²(t-1) + β × σ²(t-1)
///
/// Returns are in percent, so `omega` is in percent² units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GarchParams {
    /// Constant conditional mean (mu)
    pub mu: f64,
    /// Baseline variance (ω)
    pub omega: f64,
    /// Shock coefficient (α)
    pub alpha: f64,
    /// Variance persistence coefficient (β)
    pub beta: f64,
}

impl GarchParams {
    /// α + β, the rate at which shocks to variance decay
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// Long-run variance ω / (1 - α - β)
    pub fn unconditional_variance(&self) -> f64 {
        let gap = 1.0 - self.persistence();
        if gap.abs() < 1e-10 {
            return self.omega;
        }
        self.omega / gap
    }

    /// Non-negative coefficients with a covariance-stationary recursion
    pub fn is_admissible(&self) -> bool {
        self.omega.is_finite()
            && self.omega > 0.0
            && self.alpha >= 0.0
            && self.beta >= 0.0
            && self.persistence() < 1.0
    }

    /// Map an unconstrained vector onto the admissible region
    ///
    /// `x = [m, ln ω, a, b]`, with the mean centred on `centre` and measured in
    /// units of `scale`. α = a² / (1 + a² + b²) and β = b² / (1 + a² + b²), so
    /// both stay non-negative with a sum below one, and α = 0 or β = 0 sit at
    /// the finite coordinate 0 where the simplex can still move.
    fn from_unconstrained(x: &[f64], centre: f64, scale: f64) -> Self {
        let (a2, b2) = (x[2] * x[2], x[3] * x[3]);
        let denom = 1.0 + a2 + b2;
        GarchParams {
            mu: centre + scale * x[0],
            omega: x[1].exp(),
            alpha: a2 / denom,
            beta: b2 / denom,
        }
    }

    fn to_unconstrained(&self, centre: f64, scale: f64) -> Vec<f64> {
        let rest = (1.0 - self.alpha - self.beta).max(1e-12);
        vec![
            (self.mu - centre) / scale,
            self.omega.ln(),
            (self.alpha.max(0.0) / rest).sqrt(),
            (self.beta.max(0.0) / rest).sqrt(),
        ]
    }
}

/// Exponentially weighted mean of the leading squared residuals
fn backcast(residuals: &[f64]) -> f64 {
    let span = residuals.len().min(BACKCAST_SPAN);
    let mut weighted = 0.0;
    let mut total = 0.0;
    let mut w = 1.0;
    for e in &residuals[..span] {
        weighted += w * e * e;
        total += w;
        w *= BACKCAST_DECAY;
    }
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

/// Run the variance recursion over a return series
///
/// `variances[t]` is the conditional variance of `returns[t]`, in percent².
pub fn conditional_variances(params: &GarchParams, returns: &[f64]) -> Vec<f64> {
    let residuals: Vec<f64> = returns.iter().map(|r| r - params.mu).collect();
    filter_residuals(params, &residuals)
}

fn filter_residuals(params: &GarchParams, residuals: &[f64]) -> Vec<f64> {
    let seed = backcast(residuals);
    let mut variances = Vec::with_capacity(residuals.len());
    let mut prev_variance = seed;
    let mut prev_shock_sq = seed;
    for e in residuals {
        let variance = params.omega + params.alpha * prev_shock_sq + params.beta * prev_variance;
        variances.push(variance);
        prev_variance = variance;
        prev_shock_sq = e * e;
    }
    variances
}

/// Gaussian negative log-likelihood of the returns under `params`
///
/// Returns +∞ for inadmissible parameters or any non-positive variance.
pub fn negative_log_likelihood(params: &GarchParams, returns: &[f64]) -> f64 {
    if !params.is_admissible() {
        return f64::INFINITY;
    }
    let ln_2pi = (2.0 * std::f64::consts::PI).ln();
    let variances = conditional_variances(params, returns);
    let mut total = 0.0;
    for (r, var) in returns.iter().zip(&variances) {
        if !(*var > 0.0) || !var.is_finite() {
            return f64::INFINITY;
        }
        let e = r - params.mu;
        total += 0.5 * (ln_2pi + var.ln() + e * e / var);
    }
    total
}

/// One-step-ahead volatility forecast plus the in-sample conditional path
#[derive(Debug, Clone, Serialize)]
pub struct VolatilityForecast {
    /// Next-period conditional standard deviation, as a fraction
    pub current_volatility: f64,
    /// Next-period conditional variance, in percent²
    pub next_variance: f64,
    /// In-sample conditional standard deviation per return, as a fraction
    pub conditional_volatility: Vec<f64>,
    /// Fitted parameters
    pub params: GarchParams,
    /// Maximised log-likelihood; `None` for zero-variance input
    pub log_likelihood: Option<f64>,
    /// Simplex iterations spent on the fit
    pub iterations: usize,
}

impl VolatilityForecast {
    /// Variance forecast `h` periods ahead, in percent²
    ///
    /// Decays geometrically from the one-step forecast toward the long-run
    /// variance at rate α + β.
    pub fn forecast_variance(&self, h: usize) -> f64 {
        if h <= 1 {
            return self.next_variance;
        }
        let long_run = self.params.unconditional_variance();
        long_run + self.params.persistence().powf((h - 1) as f64) * (self.next_variance - long_run)
    }

    /// Volatility forecast `h` periods ahead, as a fraction
    pub fn forecast_volatility(&self, h: usize) -> f64 {
        self.forecast_variance(h).max(0.0).sqrt() / PERCENT
    }

    fn degenerate(mean: f64, len: usize) -> Self {
        VolatilityForecast {
            current_volatility: 0.0,
            next_variance: 0.0,
            conditional_volatility: vec![0.0; len],
            params: GarchParams {
                mu: mean,
                omega: 0.0,
                alpha: 0.0,
                beta: 0.0,
            },
            log_likelihood: None,
            iterations: 0,
        }
    }
}

/// Maximum-likelihood GARCH(1,1) estimator
///
/// Refit from scratch on every call; nothing is carried between series.
#[derive(Debug, Clone)]
pub struct GarchModel {
    /// Minimum number of returns accepted
    min_observations: usize,
    options: FitOptions,
}

/// Starting (α, β) pairs; the simplex runs from each and keeps the best optimum
const STARTING_POINTS: [(f64, f64); 7] = [
    (0.05, 0.90),
    (0.10, 0.80),
    (0.10, 0.88),
    (0.20, 0.70),
    (0.03, 0.95),
    (0.05, 0.50),
    (0.15, 0.05),
];

/// Whether the returns carry no measurable variance
///
/// The sample variance is compared with the mean square of the returns, so
/// the verdict is the same at any return scale. All-zero returns are
/// degenerate.
fn is_degenerate(values: &[f64], tolerance: f64) -> bool {
    let sd = stats::sample_std(values);
    let mean_square = values.iter().map(|r| r * r).sum::<f64>() / values.len() as f64;
    sd * sd <= tolerance * mean_square
}

impl GarchModel {
    pub fn new(min_observations: usize, options: FitOptions) -> Self {
        GarchModel {
            min_observations,
            options,
        }
    }

    /// Fit to the returns and forecast one step ahead
    pub fn fit(&self, returns: &ReturnSeries) -> Result<VolatilityForecast> {
        let values = returns.values();
        let floor = self.min_observations.max(2);
        if values.len() < floor {
            return Err(PipelineError::InsufficientData {
                required: floor,
                actual: values.len(),
            });
        }
        if let Some(i) = values.iter().position(|r| !r.is_finite()) {
            return Err(PipelineError::ModelFitFailure(format!(
                "return at index {} is not finite",
                i
            )));
        }

        let mean = stats::mean(values);
        let sd = stats::sample_std(values);
        let variance = sd * sd;
        if is_degenerate(values, self.options.degenerate_tolerance) {
            warn!(
                returns = values.len(),
                variance,
                tolerance = self.options.degenerate_tolerance,
                "Return variance is below the relative degeneracy tolerance; forecasting zero volatility"
            );
            return Ok(VolatilityForecast::degenerate(mean, values.len()));
        }

        let objective = |x: &[f64]| {
            let params = GarchParams::from_unconstrained(x, mean, sd);
            negative_log_likelihood(&params, values)
        };

        let simplex = NelderMead::new(self.options.max_iterations, self.options.tolerance)
            .with_x_tolerance(self.options.x_tolerance);
        let mut iterations = 0;

        let mut best: Option<Minimum> = None;
        for &(alpha, beta) in &STARTING_POINTS {
            let start = GarchParams {
                mu: mean,
                omega: variance * (1.0 - alpha - beta),
                alpha,
                beta,
            };
            let run = simplex.minimize(&objective, &start.to_unconstrained(mean, sd));
            iterations += run.iterations;
            if run.converged
                && run.value.is_finite()
                && best.as_ref().map_or(true, |b| run.value < b.value)
            {
                best = Some(run);
            }
        }
        let Some(mut polished) = best else {
            return Err(PipelineError::ModelFitFailure(format!(
                "likelihood search did not converge from any starting point within {} iterations",
                self.options.max_iterations
            )));
        };

        // A fresh simplex around the optimum until the likelihood stops improving
        for _ in 0..MAX_RESTARTS {
            let restart = simplex.minimize(&objective, &polished.point);
            iterations += restart.iterations;
            if !restart.converged {
                return Err(PipelineError::ModelFitFailure(format!(
                    "restarted likelihood search did not converge within {} iterations",
                    self.options.max_iterations
                )));
            }
            let gain = polished.value - restart.value;
            if gain > 0.0 {
                polished = restart;
            }
            if gain <= self.options.tolerance * (1.0 + polished.value.abs()) {
                break;
            }
        }

        if !polished.value.is_finite() {
            return Err(PipelineError::ModelFitFailure(
                "log-likelihood is not finite at the optimum".to_string(),
            ));
        }

        let params = GarchParams::from_unconstrained(&polished.point, mean, sd);
        let residuals: Vec<f64> = values.iter().map(|r| r - params.mu).collect();
        let variances = filter_residuals(&params, &residuals);

        let (last_variance, last_residual) = match (variances.last(), residuals.last()) {
            (Some(v), Some(e)) => (*v, *e),
            _ => return Err(PipelineError::ModelFitFailure("empty variance path".to_string())),
        };
        let next_variance =
            params.omega + params.alpha * last_residual * last_residual + params.beta * last_variance;

        if variances.iter().any(|v| !v.is_finite() || *v < 0.0)
            || !next_variance.is_finite()
            || next_variance < 0.0
        {
            return Err(PipelineError::ModelFitFailure(
                "fitted recursion produced an invalid variance".to_string(),
            ));
        }

        debug!(
            mu = params.mu,
            omega = params.omega,
            alpha = params.alpha,
            beta = params.beta,
            iterations,
            "GARCH(1,1) fit converged"
        );

        Ok(VolatilityForecast {
            current_volatility: next_variance.sqrt() / PERCENT,
            next_variance,
            conditional_volatility: variances.iter().map(|v| v.sqrt() / PERCENT).collect(),
            params,
            log_likelihood: Some(-polished.value),
            iterations,
        })
    }
}

/// GARCH(1,1) return generator with known parameters
///
/// Produces percent returns whose conditional variance follows the same
/// recursion the estimator fits, so fitted parameters can be checked
/// against the truth.
#[derive(Debug, Clone)]
pub struct GarchProcess {
    /// Current conditional variance σ²
    variance: f64,
    /// Previous shock ε(t-1)
    prev_shock: f64,
    params: GarchParams,
}

impl GarchProcess {
    /// Create a new process initialized at the unconditional variance
    pub fn new(params: GarchParams) -> Self {
        let variance = params.unconditional_variance();
        GarchProcess {
            variance,
            prev_shock: 0.0,
            params,
        }
    }

    /// Draw the next return and advance the variance
    pub fn next<R: Rng>(&mut self, rng: &mut R) -> f64 {
        let xi: f64 = StandardNormal.sample(rng);
        let shock = self.variance.sqrt() * xi;
        self.prev_shock = shock;

        // s²(t+1) = ω + α × ε²(t) + β × s²(t)
        self.variance = self.params.omega
            + self.params.alpha * self.prev_shock.powi(2)
            + self.params.beta * self.variance;

        self.params.mu + shock
    }

    /// Draw `n` consecutive returns
    pub fn sample<R: Rng>(&mut self, n: usize, rng: &mut R) -> Vec<f64> {
        (0..n).map(|_| self.next(rng)).collect()
    }

    /// Conditional variance of the next draw
    pub fn variance(&self) -> f64 {
        self.variance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Normal, StudentT};

    fn clustered() -> GarchParams {
        GarchParams {
            mu: 0.05,
            omega: 0.1,
            alpha: 0.10,
            beta: 0.85,
        }
    }

    fn model() -> GarchModel {
        GarchModel::new(30, FitOptions::default())
    }

    #[test]
    fn unconditional_variance_matches_formula() {
        // 0.1 / (1 - 0.95) = 2
        assert_relative_eq!(clustered().unconditional_variance(), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn unconstrained_map_stays_admissible() {
        for x in [
            [0.0, -30.0, 40.0, 40.0],
            [5.0, 3.0, -40.0, 0.0],
            [-2.0, 0.0, 0.0, 50.0],
        ] {
            let p = GarchParams::from_unconstrained(&x, 0.0, 1.0);
            assert!(p.alpha >= 0.0 && p.beta >= 0.0);
            assert!(p.persistence() <= 1.0);
            assert!(p.omega > 0.0);
        }

        let p = clustered();
        let back = GarchParams::from_unconstrained(&p.to_unconstrained(0.0, 2.0), 0.0, 2.0);
        assert_relative_eq!(back.alpha, p.alpha, epsilon = 1e-12);
        assert_relative_eq!(back.beta, p.beta, epsilon = 1e-12);
        assert_relative_eq!(back.omega, p.omega, epsilon = 1e-12);
        assert_relative_eq!(back.mu, p.mu, epsilon = 1e-12);
    }

    #[test]
    fn zero_coefficients_map_to_finite_coordinates() {
        let flat = GarchParams {
            mu: 0.0,
            omega: 1.0,
            alpha: 0.0,
            beta: 0.0,
        };
        let x = flat.to_unconstrained(0.0, 1.0);
        assert!(x.iter().all(|v| v.is_finite()));
        assert_eq!(x[2], 0.0);
        assert_eq!(x[3], 0.0);

        // Stepping away from the boundary moves α off zero again
        let moved = GarchParams::from_unconstrained(&[0.0, 0.0, 0.5, 0.0], 0.0, 1.0);
        assert!(moved.alpha > 0.1);
    }

    #[test]
    fn shock_raises_next_variance() {
        let p = clustered();
        let mut returns = vec![0.05; 40];
        let calm = conditional_variances(&p, &returns);
        returns.push(8.0);
        returns.push(0.05);
        let shocked = conditional_variances(&p, &returns);
        assert!(shocked[41] > calm[39] * 5.0);
    }

    #[test]
    fn inadmissible_params_have_infinite_cost() {
        let explosive = GarchParams {
            alpha: 0.6,
            beta: 0.6,
            ..clustered()
        };
        assert_eq!(negative_log_likelihood(&explosive, &[1.0, -1.0]), f64::INFINITY);
    }

    #[test]
    fn process_produces_positive_variance() {
        let mut process = GarchProcess::new(clustered());
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            process.next(&mut rng);
            assert!(process.variance() > 0.0);
        }
    }

    #[test]
    fn process_is_deterministic_with_seed() {
        let mut a = GarchProcess::new(clustered());
        let mut b = GarchProcess::new(clustered());
        let mut rng_a = StdRng::seed_from_u64(123);
        let mut rng_b = StdRng::seed_from_u64(123);
        assert_eq!(a.sample(50, &mut rng_a), b.sample(50, &mut rng_b));
    }

    #[test]
    fn fit_recovers_persistence_of_simulated_series() {
        let truth = clustered();
        let mut rng = StdRng::seed_from_u64(7);
        let returns = GarchProcess::new(truth).sample(2000, &mut rng);

        let forecast = model().fit(&ReturnSeries::from_percent(returns)).unwrap();
        let fitted = forecast.params;

        assert!(fitted.is_admissible());
        assert!(
            fitted.persistence() > 0.85 && fitted.persistence() < 1.0,
            "persistence {}",
            fitted.persistence()
        );
        assert!(fitted.alpha > 0.03 && fitted.alpha < 0.25, "alpha {}", fitted.alpha);
        assert!(forecast.log_likelihood.is_some());
    }

    #[test]
    fn fitted_optimum_beats_starting_points() {
        let mut rng = StdRng::seed_from_u64(11);
        let returns = GarchProcess::new(clustered()).sample(500, &mut rng);
        let forecast = model().fit(&ReturnSeries::from_percent(returns.clone())).unwrap();

        let fitted_cost = negative_log_likelihood(&forecast.params, &returns);
        let mean = stats::mean(&returns);
        let var = stats::sample_std(&returns).powi(2);
        for (alpha, beta) in STARTING_POINTS {
            let start = GarchParams {
                mu: mean,
                omega: var * (1.0 - alpha - beta),
                alpha,
                beta,
            };
            assert!(fitted_cost <= negative_log_likelihood(&start, &returns) + 1e-9);
        }
    }

    /// Heavy-tailed returns: Student-t with 3 degrees of freedom, scaled by 3
    fn student_t_returns(seed: u64, n: usize) -> Vec<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let t = StudentT::new(3.0).unwrap();
        (0..n).map(|_| 3.0 * t.sample(&mut rng)).collect()
    }

    /// Lowest cost over a brute-force (α, β, ω) grid with the mean at the sample mean
    fn grid_optimum(returns: &[f64]) -> f64 {
        let mean = stats::mean(returns);
        let variance = stats::sample_std(returns).powi(2);
        let mut best = f64::INFINITY;
        for i in 0..=25 {
            let alpha = i as f64 * 0.02;
            for j in 0..=49 {
                let beta = j as f64 * 0.02;
                if alpha + beta >= 0.995 {
                    continue;
                }
                for scale in [0.25, 0.5, 0.75, 1.0, 1.5, 2.0, 3.0] {
                    let params = GarchParams {
                        mu: mean,
                        omega: variance * (1.0 - alpha - beta).max(0.01) * scale,
                        alpha,
                        beta,
                    };
                    best = best.min(negative_log_likelihood(&params, returns));
                }
            }
        }
        best
    }

    #[test]
    fn fit_matches_grid_optimum_on_heavy_tailed_returns() {
        for seed in [5, 37] {
            let returns = student_t_returns(seed, 250);
            let forecast = model()
                .fit(&ReturnSeries::from_percent(returns.clone()))
                .unwrap();
            let fitted = negative_log_likelihood(&forecast.params, &returns);
            let grid = grid_optimum(&returns);

            assert!(
                fitted <= grid + 1e-3,
                "seed {}: fitted cost {} vs grid {} (alpha {}, beta {})",
                seed,
                fitted,
                grid,
                forecast.params.alpha,
                forecast.params.beta
            );
            assert_relative_eq!(
                forecast.log_likelihood.unwrap(),
                -fitted,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn fit_matches_grid_optimum_on_short_garch_series() {
        for seed in [21, 35] {
            let mut rng = StdRng::seed_from_u64(seed);
            let returns = GarchProcess::new(clustered()).sample(250, &mut rng);
            let forecast = model()
                .fit(&ReturnSeries::from_percent(returns.clone()))
                .unwrap();
            let fitted = negative_log_likelihood(&forecast.params, &returns);
            assert!(fitted <= grid_optimum(&returns) + 1e-3, "seed {}", seed);
        }
    }

    #[test]
    fn forecast_is_non_negative_and_aligned() {
        let mut rng = StdRng::seed_from_u64(3);
        let returns = GarchProcess::new(clustered()).sample(300, &mut rng);
        let forecast = model().fit(&ReturnSeries::from_percent(returns)).unwrap();

        assert!(forecast.current_volatility >= 0.0);
        assert_eq!(forecast.conditional_volatility.len(), 300);
        assert!(forecast
            .conditional_volatility
            .iter()
            .all(|v| v.is_finite() && *v > 0.0));
        assert_relative_eq!(
            forecast.current_volatility,
            forecast.next_variance.sqrt() / 100.0,
            epsilon = 1e-15
        );
    }

    #[test]
    fn multi_step_forecast_reverts_to_long_run() {
        let mut rng = StdRng::seed_from_u64(5);
        let returns = GarchProcess::new(clustered()).sample(800, &mut rng);
        let forecast = model().fit(&ReturnSeries::from_percent(returns)).unwrap();

        assert_eq!(forecast.forecast_variance(1), forecast.next_variance);
        let long_run = forecast.params.unconditional_variance();
        let near = (forecast.forecast_variance(2) - long_run).abs();
        let far = (forecast.forecast_variance(200) - long_run).abs();
        assert!(far <= near);
    }

    #[test]
    fn very_long_horizon_settles_at_long_run_variance() {
        let forecast = VolatilityForecast {
            current_volatility: 0.03,
            next_variance: 9.0,
            conditional_volatility: vec![0.02, 0.03],
            params: clustered(),
            log_likelihood: None,
            iterations: 0,
        };
        let long_run = clustered().unconditional_variance();
        for h in [1usize << 20, usize::MAX / 2 + 1, usize::MAX] {
            let v = forecast.forecast_variance(h);
            assert!(v.is_finite());
            assert_relative_eq!(v, long_run, epsilon = 1e-12);
        }
    }

    #[test]
    fn constant_returns_forecast_zero() {
        let returns = ReturnSeries::from_percent(vec![1.0; 60]);
        let forecast = model().fit(&returns).unwrap();
        assert_eq!(forecast.current_volatility, 0.0);
        assert!(forecast.conditional_volatility.iter().all(|v| *v == 0.0));
        assert!(forecast.log_likelihood.is_none());
    }

    #[test]
    fn degeneracy_is_relative_to_return_scale() {
        let tol = FitOptions::default().degenerate_tolerance;
        let mut rng = StdRng::seed_from_u64(4);
        let returns = GarchProcess::new(clustered()).sample(100, &mut rng);

        for scale in [1.0, 1e-7, 1e6] {
            let scaled: Vec<f64> = returns.iter().map(|r| r * scale).collect();
            assert!(!is_degenerate(&scaled, tol), "scale {}", scale);
        }
        assert!(is_degenerate(&[1.0; 50], tol));
        assert!(is_degenerate(&[0.0; 50], tol));
        assert!(is_degenerate(&[1e-9; 50], tol));
    }

    #[test]
    fn tiny_but_real_variance_is_fitted() {
        let mut rng = StdRng::seed_from_u64(6);
        let noise = Normal::new(0.0, 1e-7).unwrap();
        let returns: Vec<f64> = (0..200).map(|_| noise.sample(&mut rng)).collect();

        let forecast = model().fit(&ReturnSeries::from_percent(returns)).unwrap();
        assert!(forecast.log_likelihood.is_some());
        assert!(forecast.current_volatility > 0.0);
        assert!(forecast.current_volatility < 1e-8);
    }

    #[test]
    fn short_series_is_insufficient() {
        let returns = ReturnSeries::from_percent(vec![1.0, -1.0, 0.5]);
        assert_eq!(
            model().fit(&returns).unwrap_err(),
            PipelineError::InsufficientData {
                required: 30,
                actual: 3
            }
        );
    }

    #[test]
    fn non_finite_return_fails_fit() {
        let mut values = vec![0.5, -0.5];
        values.extend(std::iter::repeat(0.25).take(40));
        values[10] = f64::NAN;
        let err = model().fit(&ReturnSeries::from_percent(values)).unwrap_err();
        assert!(matches!(err, PipelineError::ModelFitFailure(_)));
    }

    #[test]
    fn starved_optimizer_fails_fit() {
        let mut rng = StdRng::seed_from_u64(9);
        let returns = GarchProcess::new(clustered()).sample(200, &mut rng);
        let starved = GarchModel::new(
            30,
            FitOptions {
                max_iterations: 2,
                tolerance: 1e-12,
                ..FitOptions::default()
            },
        );
        let err = starved.fit(&ReturnSeries::from_percent(returns)).unwrap_err();
        assert!(matches!(err, PipelineError::ModelFitFailure(_)));
    }
}
