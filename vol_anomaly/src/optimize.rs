//! Derivative-free minimisation used by the likelihood fit
//!
//! A plain Nelder-Mead simplex. The GARCH objective is cheap to evaluate
//! and only four-dimensional, so a gradient-free search is accurate enough
//! and never needs a Hessian to stay well conditioned.

/// Outcome of a simplex search
#[derive(Debug, Clone)]
pub struct Minimum {
    /// Best point found
    pub point: Vec<f64>,
    /// Objective value at `point`
    pub value: f64,
    /// Iterations used
    pub iterations: usize,
    /// Whether the simplex collapsed below both tolerances before the iteration cap
    pub converged: bool,
}

/// Nelder-Mead simplex minimiser
#[derive(Debug, Clone)]
pub struct NelderMead {
    max_iterations: usize,
    tolerance: f64,
    /// Largest vertex distance from the best vertex that counts as collapsed
    x_tolerance: f64,
}

/// Edge length of the initial simplex along each axis
const INITIAL_STEP: f64 = 0.5;

// Standard reflection / expansion / contraction / shrink coefficients
const REFLECT: f64 = 1.0;
const EXPAND: f64 = 2.0;
const CONTRACT: f64 = 0.5;
const SHRINK: f64 = 0.5;

impl NelderMead {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        NelderMead {
            max_iterations,
            tolerance,
            x_tolerance: 1e-8,
        }
    }

    pub fn with_x_tolerance(mut self, x_tolerance: f64) -> Self {
        self.x_tolerance = x_tolerance;
        self
    }


    /// Minimise `f` starting from `start`
    ///
    /// NaN objective values are treated as +∞ so that infeasible regions
    /// are simply never accepted.
    pub fn minimize<F>(&self, f: F, start: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let eval = |x: &[f64]| {
            let v = f(x);
            if v.is_nan() {
                f64::INFINITY
            } else {
                v
            }
        };

        let dim = start.len();
        let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(dim + 1);
        simplex.push(start.to_vec());
        for i in 0..dim {
            let mut vertex = start.to_vec();
            vertex[i] += INITIAL_STEP;
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            // Order vertices best to worst
            let mut order: Vec<usize> = (0..=dim).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            simplex = order.iter().map(|&i| simplex[i].clone()).collect();
            values = order.iter().map(|&i| values[i]).collect();

            let best = values[0];
            let worst = values[dim];
            // A flat objective alone is not enough: the vertices must also have met
            if best.is_finite()
                && (worst - best).abs() <= self.tolerance * (1.0 + best.abs())
                && self.simplex_size(&simplex) <= self.x_tolerance * (1.0 + max_abs(&simplex[0]))
            {
                converged = true;
                break;
            }
            iterations += 1;

            // Centroid of all vertices except the worst
            let mut centroid = vec![0.0; dim];
            for vertex in &simplex[..dim] {
                for (c, x) in centroid.iter_mut().zip(vertex) {
                    *c += x / dim as f64;
                }
            }

            let toward = |coef: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(&simplex[dim])
                    .map(|(c, w)| c + coef * (c - w))
                    .collect()
            };

            let reflected = toward(REFLECT);
            let f_reflected = eval(&reflected);

            if f_reflected < values[0] {
                let expanded = toward(EXPAND);
                let f_expanded = eval(&expanded);
                if f_expanded < f_reflected {
                    simplex[dim] = expanded;
                    values[dim] = f_expanded;
                } else {
                    simplex[dim] = reflected;
                    values[dim] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[dim - 1] {
                simplex[dim] = reflected;
                values[dim] = f_reflected;
                continue;
            }

            // Contract toward the better of the worst vertex and its reflection
            let (contracted, f_contracted) = if f_reflected < values[dim] {
                let outside = toward(CONTRACT * REFLECT);
                let v = eval(&outside);
                (outside, v)
            } else {
                let inside = toward(-CONTRACT);
                let v = eval(&inside);
                (inside, v)
            };

            if f_contracted < values[dim].min(f_reflected) {
                simplex[dim] = contracted;
                values[dim] = f_contracted;
                continue;
            }

            // Shrink everything toward the best vertex
            let best_vertex = simplex[0].clone();
            for i in 1..=dim {
                for (x, b) in simplex[i].iter_mut().zip(&best_vertex) {
                    *x = b + SHRINK * (*x - b);
                }
                values[i] = eval(&simplex[i]);
            }
        }

        let best_idx = (0..=dim)
            .min_by(|&a, &b| values[a].total_cmp(&values[b]))
            .unwrap_or(0);

        Minimum {
            point: simplex[best_idx].clone(),
            value: values[best_idx],
            iterations,
            converged,
        }
    }

    /// Largest coordinate distance of any vertex from the first (best) one
    fn simplex_size(&self, simplex: &[Vec<f64>]) -> f64 {
        simplex[1..]
            .iter()
            .flat_map(|v| v.iter().zip(&simplex[0]).map(|(x, b)| (x - b).abs()))
            .fold(0.0, f64::max)
    }
}

fn max_abs(x: &[f64]) -> f64 {
    x.iter().fold(0.0, |m, v| m.max(v.abs()))
}
