// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Gaussian Process
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! A trend paired with a covariance kernel.

use crate::kernel::{CovContext, Kernel};
use crate::mean::Trend;
use crate::param::{Param, ParamRef, Parameters};
use geostat_math::linalg::mvn_log_pdf;
use geostat_types::data::Observations;
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::{Array1, Array2, ArrayView2};
use std::ops::Add;

#[derive(Debug, Clone)]
pub struct Gp {
    pub mean: Trend,
    pub kernel: Kernel,
}

/// Categories of `n` locations, all zero when none are given.
pub fn categories_or_default(cats: Option<&[usize]>, n: usize) -> GeostatResult<Vec<usize>> {
    match cats {
        Some(c) if c.len() != n => Err(GeostatError::shape("categories", n, c.len())),
        Some(c) => Ok(c.to_vec()),
        None => Ok(vec![0; n]),
    }
}

impl Gp {
    /// Zero-mean process.
    pub fn new(kernel: Kernel) -> Self {
        Gp {
            mean: Trend::Zero,
            kernel,
        }
    }

    pub fn with_trend(mean: Trend, kernel: Kernel) -> Self {
        Gp { mean, kernel }
    }

    /// Linear combination of latent processes, weighted per category.
    pub fn mix(inputs: Vec<Gp>, weights: Vec<Vec<Param>>) -> Self {
        let (means, kernels): (Vec<Trend>, Vec<Kernel>) =
            inputs.into_iter().map(|g| (g.mean, g.kernel)).unzip();
        Gp {
            mean: Trend::mix(means, weights.clone()),
            kernel: Kernel::mix(kernels, weights),
        }
    }

    /// Independent process per category.
    pub fn mux(inputs: Vec<Gp>) -> Self {
        let (means, kernels): (Vec<Trend>, Vec<Kernel>) =
            inputs.into_iter().map(|g| (g.mean, g.kernel)).unzip();
        Gp {
            mean: Trend::mux(means),
            kernel: Kernel::mux(kernels),
        }
    }

    pub fn vars(&self) -> Vec<ParamRef> {
        let mut out = self.mean.vars();
        out.extend(self.kernel.vars());
        out
    }

    pub fn reg(&self, params: &Parameters) -> GeostatResult<f64> {
        self.kernel.reg(params)
    }

    pub fn report(&self, params: &Parameters) -> String {
        if self.mean.is_zero() {
            self.kernel.report(params)
        } else {
            format!("{} {}", self.mean.report(params), self.kernel.report(params))
        }
    }

    /// Prior mean `[N]` and covariance `[N, N]`.
    pub fn covariance(
        &self,
        locs: ArrayView2<'_, f64>,
        cats: &[usize],
        ids: &[usize],
        params: &Parameters,
    ) -> GeostatResult<(Array1<f64>, Array2<f64>)> {
        let m = self.mean.evaluate(locs, cats, params)?;
        let ctx = CovContext::new(locs.view(), ids, cats, locs.view(), ids, cats);
        let c = self.kernel.evaluate(&ctx, params)?;
        Ok((m, c))
    }

    /// Covariance between two location sets `[N1, N2]`.
    #[allow(clippy::too_many_arguments)]
    pub fn cross_covariance(
        &self,
        locs1: ArrayView2<'_, f64>,
        cats1: &[usize],
        ids1: &[usize],
        locs2: ArrayView2<'_, f64>,
        cats2: &[usize],
        ids2: &[usize],
        params: &Parameters,
    ) -> GeostatResult<Array2<f64>> {
        if locs1.ncols() != locs2.ncols() {
            return Err(GeostatError::shape(
                "location dimensions",
                locs1.ncols(),
                locs2.ncols(),
            ));
        }
        let ctx = CovContext::new(locs1.view(), ids1, cats1, locs2.view(), ids2, cats2);
        self.kernel.evaluate(&ctx, params)
    }

    /// Log marginal likelihood of the observations.
    pub fn log_likelihood(&self, obs: &Observations, params: &Parameters) -> GeostatResult<f64> {
        let n = obs.len();
        let cats = categories_or_default(obs.cats.as_deref(), n)?;
        let ids: Vec<usize> = (0..n).collect();
        let (m, c) = self.covariance(obs.locs.view(), &cats, &ids, params)?;
        mvn_log_pdf(obs.vals.view(), m.view(), &c)
    }
}

impl Add for Gp {
    type Output = Gp;

    fn add(self, other: Gp) -> Gp {
        Gp {
            mean: self.mean + other.mean,
            kernel: self.kernel + other.kernel,
        }
    }
}

impl From<Kernel> for Gp {
    fn from(kernel: Kernel) -> Self {
        Gp::new(kernel)
    }
}
