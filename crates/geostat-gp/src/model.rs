// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Model
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! A GP together with parameter values, optional posterior samples and the
//! observations it was conditioned on.
//!
//! Hyperparameters are fitted by maximum likelihood (Adam on finite-difference
//! gradients in the unconstrained coordinates) or sampled with replica-exchange
//! Metropolis. Prediction is the standard GP conditional, batched over the
//! prediction locations and run in parallel.

use crate::gp::{categories_or_default, Gp};
use crate::param::{ParameterSamples, ParameterSpace, Parameters};
use geostat_math::linalg::{cholesky, cholesky_solve, cholesky_solve_matrix};
use geostat_math::optim::{central_gradient, Adam};
use geostat_types::config::{FitConfig, McmcConfig, PredictConfig, Reduce};
use geostat_types::constants::{FD_STEP, FIT_REPORT_BLOCKS};
use geostat_types::data::Observations;
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::{s, Array1, Array2, Array3, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Exp1, StandardNormal};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Progress of a fit block.
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    pub iter: usize,
    pub ll: f64,
    pub reg: f64,
    /// Seconds since the fit started.
    pub elapsed: f64,
    pub parameters: Parameters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum McmcPhase {
    Burnin,
    Sampling,
}

impl fmt::Display for McmcPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McmcPhase::Burnin => write!(f, "BURNIN"),
            McmcPhase::Sampling => write!(f, "SAMPLING"),
        }
    }
}

/// Progress of one sampler interval.
#[derive(Debug, Clone, Serialize)]
pub struct McmcReport {
    pub phase: McmcPhase,
    /// Steps completed in the current phase.
    pub step: usize,
    /// Metropolis acceptance rate over the interval, per replica (β = 1 first).
    pub acceptance: Vec<f64>,
    /// 5th, 50th and 95th percentiles of the draws so far (sampling only).
    pub percentiles: Option<[Parameters; 3]>,
}

#[derive(Debug, Clone, Serialize)]
pub enum ProgressReport {
    Fit(FitReport),
    Mcmc(McmcReport),
}

pub type ReportFn = Arc<dyn Fn(&ProgressReport) + Send + Sync>;

/// Marginal mean and variance at each prediction location.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub mean: Array1<f64>,
    pub var: Array1<f64>,
}

/// Joint mean `[N, 2]` and covariance `[N, 2, 2]` of location pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct PairPrediction {
    pub mean: Array2<f64>,
    pub cov: Array3<f64>,
}

#[derive(Clone)]
pub struct Model {
    pub gp: Gp,
    pub parameters: Parameters,
    pub samples: Option<ParameterSamples>,
    pub data: Option<Observations>,
    pub verbose: bool,
    report: Option<ReportFn>,
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("gp", &self.gp)
            .field("parameters", &self.parameters)
            .field("samples", &self.samples.as_ref().map(ParameterSamples::len))
            .field("data", &self.data.as_ref().map(Observations::len))
            .field("verbose", &self.verbose)
            .finish()
    }
}

/// Factorised training covariance shared by every prediction batch.
struct Conditioned<'a> {
    data: &'a Observations,
    cats1: Vec<usize>,
    ids1: Vec<usize>,
    l: Array2<f64>,
    alpha: Array1<f64>,
}

/// Posterior of one batch: mean, prior covariance `A₂₂`, cross covariance
/// `A₁₂` and `A₁₁⁻¹ A₁₂`.
struct BatchPosterior {
    mean: Array1<f64>,
    a22: Array2<f64>,
    a12: Array2<f64>,
    k: Array2<f64>,
}

impl Model {
    pub fn new(gp: impl Into<Gp>) -> Self {
        Model {
            gp: gp.into(),
            parameters: Parameters::new(),
            samples: None,
            data: None,
            verbose: true,
            report: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters.merge(&parameters);
        self
    }

    pub fn set(mut self, name: &str, value: f64) -> Self {
        self.parameters.set(name, value);
        self
    }

    pub fn with_report<F>(mut self, f: F) -> Self
    where
        F: Fn(&ProgressReport) + Send + Sync + 'static,
    {
        self.report = Some(Arc::new(f));
        self
    }

    /// Attach observations without fitting, for prediction at the current
    /// parameters.
    pub fn with_data(mut self, data: Observations) -> Self {
        self.data = Some(data);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check that every parameter the GP uses is present and in bounds.
    pub fn build(self) -> GeostatResult<Self> {
        self.space()?;
        Ok(self)
    }

    pub fn space(&self) -> GeostatResult<ParameterSpace> {
        ParameterSpace::check(&self.gp.vars(), &self.parameters)
    }

    fn surface(&self, space: &ParameterSpace, underlying: &[f64]) -> Parameters {
        let mut p = self.parameters.clone();
        p.merge(&space.to_surface(underlying));
        p
    }

    fn check_observations(&self, obs: &Observations) -> GeostatResult<()> {
        if let Some(cats) = &obs.cats {
            if cats.len() != obs.len() {
                return Err(GeostatError::shape("observation categories", obs.len(), cats.len()));
            }
        }
        Ok(())
    }

    fn emit(&self, report: ProgressReport) {
        if let Some(f) = &self.report {
            f(&report);
        }
    }

    /// Maximum-likelihood fit. Returns a new model with the fitted
    /// parameters and the observations attached.
    pub fn fit(&self, obs: &Observations, config: &FitConfig) -> GeostatResult<Model> {
        config.validate()?;
        self.check_observations(obs)?;
        let space = self.space()?;
        let reg_weight = config.reg.unwrap_or(0.0);

        let loss = |u: &[f64]| -> GeostatResult<f64> {
            let p = self.surface(&space, u);
            let ll = self.gp.log_likelihood(obs, &p)?;
            let reg = if reg_weight > 0.0 { self.gp.reg(&p)? } else { 0.0 };
            Ok(-ll + reg_weight * reg)
        };

        let mut u = space.to_underlying(&self.parameters)?;
        let mut adam = Adam::new(config.step_size);
        let start = Instant::now();
        let mut j = 0;

        for block in 0..FIT_REPORT_BLOCKS {
            let end = (block + 1) * config.iters / FIT_REPORT_BLOCKS;
            while j < end {
                let grads = central_gradient(&loss, &u, FD_STEP).map_err(|e| {
                    GeostatError::SolverDiverged {
                        iteration: j,
                        message: e.to_string(),
                    }
                })?;
                if grads.iter().any(|g| !g.is_finite()) {
                    return Err(GeostatError::SolverDiverged {
                        iteration: j,
                        message: "non-finite gradient".to_string(),
                    });
                }
                adam.step(&mut u, &grads)?;
                j += 1;
            }

            let p = self.surface(&space, &u);
            let ll = self.gp.log_likelihood(obs, &p).map_err(|e| {
                GeostatError::SolverDiverged {
                    iteration: j,
                    message: e.to_string(),
                }
            })?;
            if !ll.is_finite() {
                return Err(GeostatError::SolverDiverged {
                    iteration: j,
                    message: format!("log-likelihood is {ll}"),
                });
            }
            let reg = self.gp.reg(&p)?;
            let elapsed = start.elapsed().as_secs_f64();
            let summary = self.gp.report(&p);
            if self.verbose {
                tracing::info!(iter = j, ll, reg, elapsed, "fit {summary}");
            } else {
                tracing::debug!(iter = j, ll, reg, elapsed, "fit {summary}");
            }
            self.emit(ProgressReport::Fit(FitReport {
                iter: j,
                ll,
                reg,
                elapsed,
                parameters: p,
            }));
        }

        Ok(Model {
            parameters: self.surface(&space, &u),
            samples: None,
            data: Some(obs.clone()),
            ..self.clone()
        })
    }

    /// Replica-exchange Metropolis; seeded from `config.seed` when given.
    pub fn mcmc(&self, obs: &Observations, config: &McmcConfig) -> GeostatResult<Model> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.mcmc_with_rng(obs, config, &mut rng)
    }

    pub fn mcmc_with_rng<R: Rng>(
        &self,
        obs: &Observations,
        config: &McmcConfig,
        rng: &mut R,
    ) -> GeostatResult<Model> {
        config.validate()?;
        self.check_observations(obs)?;
        let space = self.space()?;
        let dim = space.len();
        if dim == 0 {
            return Err(GeostatError::ConfigError(
                "mcmc needs at least one named parameter".to_string(),
            ));
        }

        let target = |u: &[f64]| -> f64 {
            match self.gp.log_likelihood(obs, &self.surface(&space, u)) {
                Ok(ll) if ll.is_finite() => ll,
                _ => f64::NEG_INFINITY,
            }
        };

        let nrep = config.chains;
        let betas: Vec<f64> = (0..nrep).map(|k| 0.5_f64.powi(k as i32)).collect();
        let u0 = space.to_underlying(&self.parameters)?;
        let l0 = target(&u0);
        if !l0.is_finite() {
            return Err(GeostatError::SolverDiverged {
                iteration: 0,
                message: "initial log-likelihood is not finite".to_string(),
            });
        }
        let mut states = vec![u0; nrep];
        let mut lls = vec![l0; nrep];
        let mut accepted = vec![0usize; nrep];
        let mut draws = Array2::zeros((config.samples, dim));
        let names = space.names();
        let total = config.burnin + config.samples;

        for step in 0..total {
            let mut proposals = Vec::with_capacity(nrep);
            for (state, &beta) in states.iter().zip(&betas) {
                let scale = config.step_size / beta.sqrt();
                let e: f64 = scale * rng.sample::<f64, _>(Exp1);
                let proposal: Vec<f64> = state
                    .iter()
                    .map(|&x| {
                        if rng.gen_bool(config.move_prob) {
                            x + rng.sample::<f64, _>(StandardNormal) * e
                        } else {
                            x
                        }
                    })
                    .collect();
                proposals.push(proposal);
            }
            let proposed: Vec<f64> = proposals.par_iter().map(|u| target(u)).collect();

            for r in 0..nrep {
                if !proposed[r].is_finite() {
                    continue;
                }
                let log_alpha = betas[r] * (proposed[r] - lls[r]);
                if log_alpha >= 0.0 || rng.gen::<f64>().ln() < log_alpha {
                    states[r] = std::mem::take(&mut proposals[r]);
                    lls[r] = proposed[r];
                    accepted[r] += 1;
                }
            }

            // Alternate even and odd neighbour pairs.
            let mut i = step % 2;
            while i + 1 < nrep {
                let log_alpha = (betas[i] - betas[i + 1]) * (lls[i + 1] - lls[i]);
                if log_alpha >= 0.0 || rng.gen::<f64>().ln() < log_alpha {
                    states.swap(i, i + 1);
                    lls.swap(i, i + 1);
                }
                i += 2;
            }

            if step >= config.burnin {
                let p = space.to_surface(&states[0]);
                for (c, name) in names.iter().enumerate() {
                    draws[[step - config.burnin, c]] = p.get(name).unwrap_or(f64::NAN);
                }
            }

            if (step + 1) % config.report_interval == 0 {
                let (phase, phase_step) = if step < config.burnin {
                    (McmcPhase::Burnin, step + 1)
                } else {
                    (McmcPhase::Sampling, step + 1 - config.burnin)
                };
                let acceptance: Vec<f64> = accepted
                    .iter()
                    .map(|&a| a as f64 / config.report_interval as f64)
                    .collect();
                accepted.iter_mut().for_each(|a| *a = 0);
                let percentiles = match phase {
                    McmcPhase::Burnin => None,
                    McmcPhase::Sampling => {
                        let so_far = ParameterSamples {
                            names: names.clone(),
                            draws: draws.slice(s![..phase_step, ..]).to_owned(),
                        };
                        Some([
                            so_far.percentile(5.0),
                            so_far.percentile(50.0),
                            so_far.percentile(95.0),
                        ])
                    }
                };
                let rates: Vec<String> = acceptance.iter().map(|a| format!("{a:.2}")).collect();
                if self.verbose {
                    tracing::info!(
                        step = phase_step,
                        ll = lls[0],
                        "{phase} acceptance [{}]",
                        rates.join(", ")
                    );
                } else {
                    tracing::debug!(
                        step = phase_step,
                        ll = lls[0],
                        "{phase} acceptance [{}]",
                        rates.join(", ")
                    );
                }
                if let Some([lo, mid, hi]) = &percentiles {
                    tracing::debug!("percentiles 5% {lo} 50% {mid} 95% {hi}");
                }
                self.emit(ProgressReport::Mcmc(McmcReport {
                    phase,
                    step: phase_step,
                    acceptance,
                    percentiles,
                }));
            }
        }

        let samples = ParameterSamples { names, draws };
        let mut parameters = self.parameters.clone();
        parameters.merge(&samples.median());
        Ok(Model {
            parameters,
            samples: Some(samples),
            data: Some(obs.clone()),
            ..self.clone()
        })
    }

    /// Draw synthetic observations from the prior at `locs`.
    pub fn generate(&self, locs: Array2<f64>, cats: Option<Vec<usize>>) -> GeostatResult<Model> {
        self.generate_with_rng(locs, cats, &mut rand::thread_rng())
    }

    pub fn generate_with_rng<R: Rng>(
        &self,
        locs: Array2<f64>,
        cats: Option<Vec<usize>>,
        rng: &mut R,
    ) -> GeostatResult<Model> {
        if self.data.is_some() {
            return Err(GeostatError::ConfigError(
                "model already has data; generate from a fresh model".to_string(),
            ));
        }
        if self.samples.is_some() {
            return Err(GeostatError::ConfigError(
                "cannot generate from a model with posterior samples".to_string(),
            ));
        }
        self.space()?;
        let n = locs.nrows();
        let cat_vec = categories_or_default(cats.as_deref(), n)?;
        let ids: Vec<usize> = (0..n).collect();
        let (m, c) = self
            .gp
            .covariance(locs.view(), &cat_vec, &ids, &self.parameters)?;
        let l = cholesky(&c)?;
        let z: Array1<f64> = (0..n).map(|_| rng.sample(StandardNormal)).collect();
        let vals = m + l.dot(&z);
        let obs = match cats {
            Some(cats) => Observations::with_categories(locs, vals, cats)?,
            None => Observations::new(locs, vals)?,
        };
        Ok(Model {
            data: Some(obs),
            ..self.clone()
        })
    }

    /// Parameter sets to predict with: the point estimate, a reduced
    /// posterior, or evenly spaced posterior draws.
    fn prediction_parameters(&self, config: &PredictConfig) -> GeostatResult<Vec<Parameters>> {
        let samples = match &self.samples {
            Some(s) => s,
            None => {
                if config.subsample.is_some() || config.reduce.is_some() {
                    return Err(GeostatError::ConfigError(
                        "subsample and reduce need posterior samples".to_string(),
                    ));
                }
                return Ok(vec![self.parameters.clone()]);
            }
        };
        let merged = |p: Parameters| {
            let mut out = self.parameters.clone();
            out.merge(&p);
            out
        };
        if let Some(reduce) = config.reduce {
            let point = match reduce {
                Reduce::Median => samples.median(),
                Reduce::Mean => samples.mean(),
            };
            return Ok(vec![merged(point)]);
        }
        let total = samples.len();
        let k = config.subsample.unwrap_or(total);
        if k > total {
            return Err(GeostatError::ConfigError(format!(
                "subsample {k} exceeds the {total} posterior samples"
            )));
        }
        (0..k)
            .map(|i| {
                samples.draw(i * total / k).map(merged).ok_or_else(|| {
                    GeostatError::ConfigError(format!("posterior draw {i} is missing"))
                })
            })
            .collect()
    }

    fn condition<'a>(
        &'a self,
        data: &'a Observations,
        params: &Parameters,
    ) -> GeostatResult<Conditioned<'a>> {
        let n1 = data.len();
        let cats1 = categories_or_default(data.cats.as_deref(), n1)?;
        let ids1: Vec<usize> = (0..n1).collect();
        let (m1, a11) = self.gp.covariance(data.locs.view(), &cats1, &ids1, params)?;
        let l = cholesky(&a11)?;
        let resid = &data.vals - &m1;
        let alpha = cholesky_solve(&l, resid.view());
        Ok(Conditioned {
            data,
            cats1,
            ids1,
            l,
            alpha,
        })
    }

    fn batch_posterior(
        &self,
        cond: &Conditioned<'_>,
        locs: ArrayView2<'_, f64>,
        cats: &[usize],
        ids: &[usize],
        params: &Parameters,
    ) -> GeostatResult<BatchPosterior> {
        let m2 = self.gp.mean.evaluate(locs, cats, params)?;
        let a12 = self.gp.cross_covariance(
            cond.data.locs.view(),
            &cond.cats1,
            &cond.ids1,
            locs,
            cats,
            ids,
            params,
        )?;
        let a22 = self.gp.cross_covariance(locs, cats, ids, locs, cats, ids, params)?;
        let mean = m2 + a12.t().dot(&cond.alpha);
        let k = cholesky_solve_matrix(&cond.l, &a12);
        Ok(BatchPosterior { mean, a22, a12, k })
    }

    fn data_for_prediction(&self, locs: &Array2<f64>) -> GeostatResult<&Observations> {
        let data = self.data.as_ref().ok_or_else(|| {
            GeostatError::ConfigError(
                "model has no data; fit, sample or generate first".to_string(),
            )
        })?;
        if locs.ncols() != data.dims() {
            return Err(GeostatError::shape(
                "prediction location dimensions",
                data.dims(),
                locs.ncols(),
            ));
        }
        Ok(data)
    }

    fn batch_size(config: &PredictConfig, n1: usize) -> usize {
        config.batch_size.unwrap_or((n1 / 2).max(1))
    }

    fn predict_with(
        &self,
        data: &Observations,
        locs2: &Array2<f64>,
        cats2: &[usize],
        params: &Parameters,
        batch: usize,
    ) -> GeostatResult<(Array1<f64>, Array1<f64>)> {
        let cond = self.condition(data, params)?;
        let n1 = data.len();
        let n2 = locs2.nrows();
        let starts: Vec<usize> = (0..n2).step_by(batch).collect();
        let parts = starts
            .par_iter()
            .map(|&lo| -> GeostatResult<(Array1<f64>, Array1<f64>)> {
                let hi = (lo + batch).min(n2);
                let ids: Vec<usize> = (n1 + lo..n1 + hi).collect();
                let post = self.batch_posterior(
                    &cond,
                    locs2.slice(s![lo..hi, ..]),
                    &cats2[lo..hi],
                    &ids,
                    params,
                )?;
                let var = &post.a22.diag() - &(&post.a12 * &post.k).sum_axis(Axis(0));
                Ok((post.mean, var))
            })
            .collect::<GeostatResult<Vec<_>>>()?;

        let mut mean = Vec::with_capacity(n2);
        let mut var = Vec::with_capacity(n2);
        for (m, v) in parts {
            mean.extend(m);
            var.extend(v);
        }
        Ok((Array1::from_vec(mean), Array1::from_vec(var)))
    }

    /// Posterior mean and variance at `locs2`.
    pub fn predict(
        &self,
        locs2: &Array2<f64>,
        cats2: Option<&[usize]>,
        config: &PredictConfig,
    ) -> GeostatResult<Prediction> {
        config.validate()?;
        let data = self.data_for_prediction(locs2)?;
        let n2 = locs2.nrows();
        let cats2 = categories_or_default(cats2, n2)?;
        let batch = Self::batch_size(config, data.len());
        let sets = self.prediction_parameters(config)?;

        let results = sets
            .iter()
            .map(|p| self.predict_with(data, locs2, &cats2, p, batch))
            .collect::<GeostatResult<Vec<_>>>()?;

        if results.len() == 1 {
            let (mean, var) = results.into_iter().next().unwrap_or_default();
            return Ok(Prediction { mean, var });
        }
        let k = results.len() as f64;
        let mut mean = Array1::zeros(n2);
        let mut second = Array1::zeros(n2);
        for (m, v) in &results {
            mean += m;
            second += &(m * m + v);
        }
        mean /= k;
        second /= k;
        let var = second - &mean * &mean;
        Ok(Prediction { mean, var })
    }

    fn predict_pairs_with(
        &self,
        data: &Observations,
        first: &Array2<f64>,
        second: &Array2<f64>,
        cats: &[usize],
        params: &Parameters,
        batch: usize,
    ) -> GeostatResult<(Array2<f64>, Array3<f64>)> {
        let cond = self.condition(data, params)?;
        let n1 = data.len();
        let n = first.nrows();
        let starts: Vec<usize> = (0..n).step_by(batch).collect();
        let parts = starts
            .par_iter()
            .map(|&lo| -> GeostatResult<(Array2<f64>, Array3<f64>)> {
                let hi = (lo + batch).min(n);
                let b = hi - lo;
                let locs = ndarray::concatenate(
                    Axis(0),
                    &[first.slice(s![lo..hi, ..]), second.slice(s![lo..hi, ..])],
                )
                .map_err(|e| GeostatError::LinAlg(e.to_string()))?;
                let ids: Vec<usize> = (n1 + lo..n1 + hi)
                    .chain(n1 + n + lo..n1 + n + hi)
                    .collect();
                let pair_cats: Vec<usize> =
                    cats[lo..hi].iter().chain(&cats[lo..hi]).copied().collect();
                let post = self.batch_posterior(&cond, locs.view(), &pair_cats, &ids, params)?;
                let cov = &post.a22 - &post.a12.t().dot(&post.k);
                let mut mean = Array2::zeros((b, 2));
                let mut pair_cov = Array3::zeros((b, 2, 2));
                for j in 0..b {
                    let idx = [j, b + j];
                    for (x, &r) in idx.iter().enumerate() {
                        mean[[j, x]] = post.mean[r];
                        for (y, &c) in idx.iter().enumerate() {
                            pair_cov[[j, x, y]] = cov[[r, c]];
                        }
                    }
                }
                Ok((mean, pair_cov))
            })
            .collect::<GeostatResult<Vec<_>>>()?;

        let mut mean = Array2::zeros((n, 2));
        let mut cov = Array3::zeros((n, 2, 2));
        for (&lo, (m, c)) in starts.iter().zip(parts) {
            let hi = lo + m.nrows();
            mean.slice_mut(s![lo..hi, ..]).assign(&m);
            cov.slice_mut(s![lo..hi, .., ..]).assign(&c);
        }
        Ok((mean, cov))
    }

    /// Joint posterior of `(first[j], second[j])` for each pair `j`.
    pub fn predict_pairs(
        &self,
        first: &Array2<f64>,
        second: &Array2<f64>,
        cats: Option<&[usize]>,
        config: &PredictConfig,
    ) -> GeostatResult<PairPrediction> {
        config.validate()?;
        let data = self.data_for_prediction(first)?;
        if second.dim() != first.dim() {
            return Err(GeostatError::shape(
                "second pair locations",
                format!("{:?}", first.shape()),
                format!("{:?}", second.shape()),
            ));
        }
        let n = first.nrows();
        let cats = categories_or_default(cats, n)?;
        let batch = Self::batch_size(config, data.len());
        let sets = self.prediction_parameters(config)?;

        let results = sets
            .iter()
            .map(|p| self.predict_pairs_with(data, first, second, &cats, p, batch))
            .collect::<GeostatResult<Vec<_>>>()?;

        if results.len() == 1 {
            if let Some((mean, cov)) = results.into_iter().next() {
                return Ok(PairPrediction { mean, cov });
            }
            return Err(GeostatError::ConfigError("no parameter sets".to_string()));
        }
        let k = results.len() as f64;
        let mut mean = Array2::zeros((n, 2));
        let mut second_moment = Array3::zeros((n, 2, 2));
        for (m, c) in &results {
            mean += m;
            for j in 0..n {
                for x in 0..2 {
                    for y in 0..2 {
                        second_moment[[j, x, y]] += m[[j, x]] * m[[j, y]] + c[[j, x, y]];
                    }
                }
            }
        }
        mean /= k;
        second_moment /= k;
        for j in 0..n {
            for x in 0..2 {
                for y in 0..2 {
                    second_moment[[j, x, y]] -= mean[[j, x]] * mean[[j, y]];
                }
            }
        }
        Ok(PairPrediction {
            mean,
            cov: second_moment,
        })
    }
}
