// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Optimisers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Gradient-based and least-squares optimisers.
//!
//! - [`Adam`]: first-order optimiser for the GP likelihood (Keras update rule).
//! - [`central_gradient`]: finite-difference gradient, one rayon task per
//!   coordinate.
//! - [`curve_fit`]: bounded Levenberg-Marquardt for small nonlinear models.

use crate::linalg::{cholesky, cholesky_solve};
use geostat_types::constants::{ADAM_BETA1, ADAM_BETA2, ADAM_EPSILON};
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::{Array1, Array2};
use rayon::prelude::*;

/// Adam with bias-corrected learning rate and epsilon added to √v̂.
#[derive(Debug, Clone)]
pub struct Adam {
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
    m: Vec<f64>,
    v: Vec<f64>,
    t: usize,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Adam {
            learning_rate,
            beta1: ADAM_BETA1,
            beta2: ADAM_BETA2,
            epsilon: ADAM_EPSILON,
            m: Vec::new(),
            v: Vec::new(),
            t: 0,
        }
    }

    /// Number of updates applied so far.
    pub fn iterations(&self) -> usize {
        self.t
    }

    /// Apply one descent step in place.
    pub fn step(&mut self, params: &mut [f64], grads: &[f64]) -> GeostatResult<()> {
        if params.len() != grads.len() {
            return Err(GeostatError::shape("Adam::step", params.len(), grads.len()));
        }
        if self.m.len() != params.len() {
            self.m = vec![0.0; params.len()];
            self.v = vec![0.0; params.len()];
            self.t = 0;
        }
        self.t += 1;
        let t = self.t as i32;
        let lr_t = self.learning_rate * (1.0 - self.beta2.powi(t)).sqrt()
            / (1.0 - self.beta1.powi(t));

        for (i, (p, &g)) in params.iter_mut().zip(grads).enumerate() {
            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * g;
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * g * g;
            *p -= lr_t * self.m[i] / (self.v[i].sqrt() + self.epsilon);
        }
        Ok(())
    }
}

/// Central finite-difference gradient of `f` at `x`.
///
/// The step for coordinate k is `h · max(1, |x_k|)`. Coordinates are
/// evaluated in parallel; the first error encountered is returned.
pub fn central_gradient<F>(f: F, x: &[f64], h: f64) -> GeostatResult<Vec<f64>>
where
    F: Fn(&[f64]) -> GeostatResult<f64> + Sync,
{
    if !h.is_finite() || h <= 0.0 {
        return Err(GeostatError::ConfigError(
            "gradient step must be finite and > 0".to_string(),
        ));
    }
    (0..x.len())
        .into_par_iter()
        .map(|k| {
            let step = h * x[k].abs().max(1.0);
            let mut xp = x.to_vec();
            let mut xm = x.to_vec();
            xp[k] += step;
            xm[k] -= step;
            Ok((f(&xp)? - f(&xm)?) / (2.0 * step))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct CurveFitConfig {
    pub max_iterations: usize,
    /// Relative decrease of the squared residual below which the fit stops.
    pub tolerance: f64,
    /// Relative forward-difference step for the Jacobian.
    pub fd_step: f64,
    /// Initial Levenberg-Marquardt damping.
    pub lambda: f64,
}

impl Default for CurveFitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 400,
            tolerance: 1e-12,
            fd_step: 1e-8,
            lambda: 1e-3,
        }
    }
}

fn validate_curve_fit_config(config: &CurveFitConfig) -> GeostatResult<()> {
    if config.max_iterations == 0 {
        return Err(GeostatError::ConfigError(
            "curve_fit.max_iterations must be >= 1".to_string(),
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(GeostatError::ConfigError(
            "curve_fit.tolerance must be finite and > 0".to_string(),
        ));
    }
    if !config.fd_step.is_finite() || config.fd_step <= 0.0 {
        return Err(GeostatError::ConfigError(
            "curve_fit.fd_step must be finite and > 0".to_string(),
        ));
    }
    if !config.lambda.is_finite() || config.lambda <= 0.0 {
        return Err(GeostatError::ConfigError(
            "curve_fit.lambda must be finite and > 0".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct CurveFitResult {
    pub params: Vec<f64>,
    /// Root-mean-square residual at `params`.
    pub residual: f64,
    pub iterations: usize,
    pub converged: bool,
    pub residual_history: Vec<f64>,
}

const MAX_LAMBDA: f64 = 1e12;
const MAX_DAMPING_RETRIES: usize = 12;

fn sum_sq_residual<F>(model: &F, x: &[f64], y: &[f64], p: &[f64]) -> f64
where
    F: Fn(f64, &[f64]) -> f64,
{
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = yi - model(xi, p);
            r * r
        })
        .sum()
}

fn clamp_into(p: &mut [f64], lower: &[f64], upper: &[f64]) {
    for ((v, &lo), &hi) in p.iter_mut().zip(lower).zip(upper) {
        *v = v.clamp(lo, hi);
    }
}

/// Fit `model(x, p)` to `y` by bounded Levenberg-Marquardt.
///
/// The Jacobian is a forward difference that steps inward at an upper
/// bound. Each trial point is projected into `[lower, upper]`.
pub fn curve_fit<F>(
    model: F,
    x: &[f64],
    y: &[f64],
    p0: &[f64],
    lower: &[f64],
    upper: &[f64],
    config: &CurveFitConfig,
) -> GeostatResult<CurveFitResult>
where
    F: Fn(f64, &[f64]) -> f64,
{
    if x.is_empty() || y.is_empty() {
        return Err(GeostatError::ConfigError(
            "curve_fit requires non-empty data".to_string(),
        ));
    }
    if x.len() != y.len() {
        return Err(GeostatError::ConfigError(format!(
            "Length mismatch: x={}, y={}",
            x.len(),
            y.len()
        )));
    }
    let n_params = p0.len();
    if n_params == 0 || lower.len() != n_params || upper.len() != n_params {
        return Err(GeostatError::shape(
            "curve_fit bounds",
            n_params,
            format!("lower {} / upper {}", lower.len(), upper.len()),
        ));
    }
    for k in 0..n_params {
        if lower[k] >= upper[k] || !(lower[k]..=upper[k]).contains(&p0[k]) {
            return Err(GeostatError::ConfigError(format!(
                "curve_fit: p0[{k}] = {} outside bounds [{}, {}]",
                p0[k], lower[k], upper[k]
            )));
        }
    }
    validate_curve_fit_config(config)?;

    let n = x.len();
    let mut p = p0.to_vec();
    let mut cost = sum_sq_residual(&model, x, y, &p);
    if !cost.is_finite() {
        return Err(GeostatError::SolverDiverged {
            iteration: 0,
            message: "curve_fit: non-finite residual at p0".to_string(),
        });
    }
    let mut lambda = config.lambda;
    let mut residual_history = Vec::with_capacity(config.max_iterations + 1);
    residual_history.push((cost / n as f64).sqrt());
    let mut converged = false;
    let mut iter_done = 0;

    for iter in 0..config.max_iterations {
        iter_done = iter + 1;
        if cost == 0.0 {
            converged = true;
            break;
        }

        let base: Vec<f64> = x.iter().map(|&xi| model(xi, &p)).collect();
        let mut jac = Array2::zeros((n, n_params));
        for k in 0..n_params {
            let mut h = config.fd_step * p[k].abs().max(1.0);
            if p[k] + h > upper[k] {
                h = -h;
            }
            let mut pp = p.clone();
            pp[k] += h;
            for i in 0..n {
                jac[[i, k]] = (model(x[i], &pp) - base[i]) / h;
            }
        }
        let resid = Array1::from_iter(y.iter().zip(&base).map(|(yi, fi)| yi - fi));
        let jtj = jac.t().dot(&jac);
        let jtr = jac.t().dot(&resid);

        // Parameters held at a bound by the descent direction stay fixed.
        let free: Vec<usize> = (0..n_params)
            .filter(|&k| {
                let pinned_low = p[k] <= lower[k] && jtr[k] < 0.0;
                let pinned_high = p[k] >= upper[k] && jtr[k] > 0.0;
                !(pinned_low || pinned_high)
            })
            .collect();
        if free.is_empty() {
            converged = true;
            break;
        }
        let jtj_free = Array2::from_shape_fn((free.len(), free.len()), |(a, b)| {
            jtj[[free[a], free[b]]]
        });
        let jtr_free = Array1::from_iter(free.iter().map(|&k| jtr[k]));

        let mut accepted = false;
        for _ in 0..MAX_DAMPING_RETRIES {
            let mut damped = jtj_free.clone();
            for a in 0..free.len() {
                damped[[a, a]] += lambda * jtj_free[[a, a]].max(1e-12);
            }
            let reduced = match cholesky(&damped) {
                Ok(l) => cholesky_solve(&l, jtr_free.view()),
                Err(_) => {
                    lambda *= 10.0;
                    continue;
                }
            };
            let mut step = vec![0.0; n_params];
            for (a, &k) in free.iter().enumerate() {
                step[k] = reduced[a];
            }

            let mut trial: Vec<f64> = p.iter().zip(&step).map(|(a, d)| a + d).collect();
            clamp_into(&mut trial, lower, upper);
            let trial_cost = sum_sq_residual(&model, x, y, &trial);

            if trial_cost.is_finite() && trial_cost < cost {
                let decrease = (cost - trial_cost) / cost;
                p = trial;
                cost = trial_cost;
                lambda = (lambda / 10.0).max(1e-12);
                accepted = true;
                if decrease < config.tolerance {
                    converged = true;
                }
                break;
            }
            lambda *= 10.0;
            if lambda > MAX_LAMBDA {
                break;
            }
        }
        residual_history.push((cost / n as f64).sqrt());

        // No damping level improves the fit: local minimum within bounds.
        if !accepted {
            converged = true;
            break;
        }
        if converged {
            break;
        }
    }

    Ok(CurveFitResult {
        params: p,
        residual: (cost / n as f64).sqrt(),
        iterations: iter_done,
        converged,
        residual_history,
    })
}
