// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Covariance Kernels
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Composable covariance kernels.
//!
//! A [`Kernel`] is a tree: leaves are covariance functions, inner nodes sum
//! (`+`), multiply (`*`), mix or multiplex their children by category.
//! Every node evaluates to an `[N1, N2]` matrix for a [`CovContext`].

use crate::featurizer::Featurize;
use crate::metric::Metric;
use crate::param::{values, Param, ParamRef, Parameters};
use geostat_math::distance::per_axis_dist2;
use geostat_math::special::erf;
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::{Array2, Array3, ArrayView2, Axis};
use std::cell::OnceCell;
use std::f64::consts::{PI, SQRT_2};
use std::ops::{Add, Mul};
use std::sync::Arc;

/// Two location sets with their global observation ids and categories.
///
/// White noise lands only where the same id appears on both sides, so a
/// training/prediction cross-covariance carries no nugget.
pub struct CovContext<'a> {
    pub locs1: ArrayView2<'a, f64>,
    pub locs2: ArrayView2<'a, f64>,
    pub ids1: &'a [usize],
    pub ids2: &'a [usize],
    pub cats1: &'a [usize],
    pub cats2: &'a [usize],
    pa_d2: OnceCell<Array3<f64>>,
}

impl<'a> CovContext<'a> {
    pub fn new(
        locs1: ArrayView2<'a, f64>,
        ids1: &'a [usize],
        cats1: &'a [usize],
        locs2: ArrayView2<'a, f64>,
        ids2: &'a [usize],
        cats2: &'a [usize],
    ) -> Self {
        debug_assert_eq!(locs1.nrows(), ids1.len());
        debug_assert_eq!(locs1.nrows(), cats1.len());
        debug_assert_eq!(locs2.nrows(), ids2.len());
        debug_assert_eq!(locs2.nrows(), cats2.len());
        CovContext {
            locs1,
            locs2,
            ids1,
            ids2,
            cats1,
            cats2,
            pa_d2: OnceCell::new(),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.locs1.nrows(), self.locs2.nrows())
    }

    /// Per-axis squared differences `[N1, N2, K]`, computed once.
    pub fn per_axis_dist2(&self) -> &Array3<f64> {
        self.pa_d2
            .get_or_init(|| per_axis_dist2(self.locs1, self.locs2))
    }
}

#[derive(Debug, Clone)]
pub enum Kernel {
    /// `α F₁ F₂ᵀ`: Gaussian prior on the coefficients of a linear trend.
    TrendPrior {
        featurizer: Arc<dyn Featurize>,
        alpha: Param,
    },
    SquaredExponential {
        sill: Param,
        range: Param,
        metric: Metric,
    },
    GammaExponential {
        sill: Param,
        range: Param,
        gamma: Param,
        metric: Metric,
    },
    /// Brownian motion along one axis, starting at `start`.
    Wiener { axis: usize, start: f64 },
    /// Squared exponential integrated twice along `axis` from `start`.
    IntSquaredExponential {
        axis: usize,
        start: f64,
        range: Param,
    },
    /// Exponential integrated twice along `axis` from `start`.
    IntExponential {
        axis: usize,
        start: f64,
        range: Param,
    },
    Noise { nugget: Param },
    Delta {
        dsill: Param,
        axes: Option<Vec<usize>>,
    },
    /// `Σ_c Cᶜ[a,b] W[cat_a, c] W[cat_b, c]`, one weight row per category.
    Mix {
        inputs: Vec<Kernel>,
        weights: Vec<Vec<Param>>,
    },
    /// Block-diagonal by category; category c uses input c.
    Mux { inputs: Vec<Kernel> },
    Stack(Vec<Kernel>),
    Product(Vec<Kernel>),
}

fn scale_to_metric(scale: Option<Vec<Param>>, metric: Option<Metric>) -> GeostatResult<Metric> {
    match (scale, metric) {
        (Some(_), Some(_)) => Err(GeostatError::ConfigError(
            "give either a scale or a metric, not both".to_string(),
        )),
        (Some(scale), None) => Ok(Metric::Euclidean { scale: Some(scale) }),
        (None, Some(metric)) => Ok(metric),
        (None, None) => Ok(Metric::euclidean()),
    }
}

impl Kernel {
    pub fn trend_prior(featurizer: impl Featurize + 'static, alpha: impl Into<Param>) -> Self {
        Kernel::TrendPrior {
            featurizer: Arc::new(featurizer),
            alpha: alpha.into(),
        }
    }

    pub fn squared_exponential(sill: impl Into<Param>, range: impl Into<Param>) -> Self {
        Kernel::SquaredExponential {
            sill: sill.into(),
            range: range.into(),
            metric: Metric::euclidean(),
        }
    }

    /// Squared exponential on a per-axis scaled Euclidean metric.
    pub fn squared_exponential_scaled<P: Into<Param>>(
        sill: impl Into<Param>,
        range: impl Into<Param>,
        scale: Vec<P>,
    ) -> Self {
        Kernel::SquaredExponential {
            sill: sill.into(),
            range: range.into(),
            metric: Metric::scaled(scale),
        }
    }

    /// Squared exponential with an optional scale or metric (at most one).
    pub fn squared_exponential_with(
        sill: impl Into<Param>,
        range: impl Into<Param>,
        scale: Option<Vec<Param>>,
        metric: Option<Metric>,
    ) -> GeostatResult<Self> {
        Ok(Kernel::SquaredExponential {
            sill: sill.into(),
            range: range.into(),
            metric: scale_to_metric(scale, metric)?,
        })
    }

    pub fn gamma_exponential(
        sill: impl Into<Param>,
        range: impl Into<Param>,
        gamma: impl Into<Param>,
    ) -> Self {
        Kernel::GammaExponential {
            sill: sill.into(),
            range: range.into(),
            gamma: gamma.into(),
            metric: Metric::euclidean(),
        }
    }

    pub fn gamma_exponential_scaled<P: Into<Param>>(
        sill: impl Into<Param>,
        range: impl Into<Param>,
        gamma: impl Into<Param>,
        scale: Vec<P>,
    ) -> Self {
        Kernel::GammaExponential {
            sill: sill.into(),
            range: range.into(),
            gamma: gamma.into(),
            metric: Metric::scaled(scale),
        }
    }

    pub fn gamma_exponential_with(
        sill: impl Into<Param>,
        range: impl Into<Param>,
        gamma: impl Into<Param>,
        scale: Option<Vec<Param>>,
        metric: Option<Metric>,
    ) -> GeostatResult<Self> {
        Ok(Kernel::GammaExponential {
            sill: sill.into(),
            range: range.into(),
            gamma: gamma.into(),
            metric: scale_to_metric(scale, metric)?,
        })
    }

    pub fn wiener(axis: usize, start: f64) -> Self {
        Kernel::Wiener { axis, start }
    }

    pub fn int_squared_exponential(axis: usize, start: f64, range: impl Into<Param>) -> Self {
        Kernel::IntSquaredExponential {
            axis,
            start,
            range: range.into(),
        }
    }

    pub fn int_exponential(axis: usize, start: f64, range: impl Into<Param>) -> Self {
        Kernel::IntExponential {
            axis,
            start,
            range: range.into(),
        }
    }

    pub fn noise(nugget: impl Into<Param>) -> Self {
        Kernel::Noise {
            nugget: nugget.into(),
        }
    }

    pub fn delta(dsill: impl Into<Param>, axes: Option<Vec<usize>>) -> Self {
        Kernel::Delta {
            dsill: dsill.into(),
            axes,
        }
    }

    pub fn mix(inputs: Vec<Kernel>, weights: Vec<Vec<Param>>) -> Self {
        Kernel::Mix { inputs, weights }
    }

    pub fn mux(inputs: Vec<Kernel>) -> Self {
        Kernel::Mux { inputs }
    }

    /// Every named-parameter use in the tree.
    pub fn vars(&self) -> Vec<ParamRef> {
        let mut out = Vec::new();
        match self {
            Kernel::TrendPrior { alpha, .. } => out.extend(alpha.positive()),
            Kernel::SquaredExponential {
                sill,
                range,
                metric,
            } => {
                out.extend(sill.positive());
                out.extend(range.positive());
                out.extend(metric.vars());
            }
            Kernel::GammaExponential {
                sill,
                range,
                gamma,
                metric,
            } => {
                out.extend(sill.positive());
                out.extend(range.positive());
                out.extend(gamma.bounded(0.0, 2.0));
                out.extend(metric.vars());
            }
            Kernel::Wiener { .. } => {}
            Kernel::IntSquaredExponential { range, .. } | Kernel::IntExponential { range, .. } => {
                out.extend(range.positive())
            }
            Kernel::Noise { nugget } => out.extend(nugget.positive()),
            Kernel::Delta { dsill, .. } => out.extend(dsill.positive()),
            Kernel::Mix { inputs, weights } => {
                out.extend(weights.iter().flatten().filter_map(Param::unbounded));
                out.extend(inputs.iter().flat_map(Kernel::vars));
            }
            Kernel::Mux { inputs } | Kernel::Stack(inputs) | Kernel::Product(inputs) => {
                out.extend(inputs.iter().flat_map(Kernel::vars));
            }
        }
        out
    }

    /// Range regulariser: sum of the ranges of stationary kernels in the tree.
    pub fn reg(&self, params: &Parameters) -> GeostatResult<f64> {
        match self {
            Kernel::SquaredExponential { range, .. } | Kernel::GammaExponential { range, .. } => {
                range.value(params)
            }
            Kernel::Mix { inputs, .. }
            | Kernel::Mux { inputs }
            | Kernel::Stack(inputs)
            | Kernel::Product(inputs) => {
                let mut total = 0.0;
                for k in inputs {
                    total += k.reg(params)?;
                }
                Ok(total)
            }
            _ => Ok(0.0),
        }
    }

    /// One-line summary such as `[sill 1.00, range 0.33]`.
    pub fn report(&self, params: &Parameters) -> String {
        match self {
            Kernel::Stack(parts) | Kernel::Product(parts) | Kernel::Mux { inputs: parts } => parts
                .iter()
                .map(|p| p.report(params))
                .collect::<Vec<_>>()
                .join(" "),
            Kernel::Mix { inputs, weights } => {
                let w: Vec<String> = weights
                    .iter()
                    .flatten()
                    .filter_map(|p| p.name())
                    .map(|name| fmt_param(name, params))
                    .collect();
                let mut out = format!("[{}]", w.join(", "));
                for k in inputs {
                    out.push(' ');
                    out.push_str(&k.report(params));
                }
                out
            }
            leaf => {
                let body: Vec<String> = leaf
                    .vars()
                    .iter()
                    .map(|v| fmt_param(&v.name, params))
                    .collect();
                format!("[{}]", body.join(", "))
            }
        }
    }

    /// Covariance matrix `[N1, N2]`.
    pub fn evaluate(&self, ctx: &CovContext<'_>, params: &Parameters) -> GeostatResult<Array2<f64>> {
        let (n1, n2) = ctx.shape();
        match self {
            Kernel::TrendPrior { featurizer, alpha } => {
                let alpha = alpha.value(params)?;
                let f1 = featurizer.features(ctx.locs1)?;
                let f2 = featurizer.features(ctx.locs2)?;
                if f1.ncols() != f2.ncols() {
                    return Err(GeostatError::shape("TrendPrior features", f1.ncols(), f2.ncols()));
                }
                Ok(f1.dot(&f2.t()) * alpha)
            }
            Kernel::SquaredExponential {
                sill,
                range,
                metric,
            } => {
                let sill = sill.value(params)?;
                let range = range.value(params)?;
                let d2 = metric.dist2(ctx, params)?;
                Ok(d2.mapv(|d| sill * (-0.5 * d / (range * range)).exp()))
            }
            Kernel::GammaExponential {
                sill,
                range,
                gamma,
                metric,
            } => {
                let sill = sill.value(params)?;
                let range = range.value(params)?;
                let gamma = gamma.value(params)?;
                let d2 = metric.dist2(ctx, params)?;
                Ok(d2.mapv(|d| {
                    let x = (d / (range * range)).max(0.0);
                    sill * (-x.powf(0.5 * gamma)).exp()
                }))
            }
            Kernel::Wiener { axis, start } => {
                let (x1, x2) = axis_offsets(ctx, *axis, *start)?;
                Ok(Array2::from_shape_fn((n1, n2), |(a, b)| x1[a].min(x2[b])))
            }
            Kernel::IntSquaredExponential { axis, start, range } => {
                let r = range.value(params)?;
                integrated(ctx, *axis, *start, |s| {
                    let u = s / (r * SQRT_2);
                    -r * r * (PI.sqrt() * u * erf(u) + (-u * u).exp())
                })
            }
            Kernel::IntExponential { axis, start, range } => {
                let r = range.value(params)?;
                integrated(ctx, *axis, *start, |s| {
                    let u = s.abs() / r;
                    -r * r * (u + (-u).exp())
                })
            }
            Kernel::Noise { nugget } => {
                let nugget = nugget.value(params)?;
                Ok(Array2::from_shape_fn((n1, n2), |(a, b)| {
                    if ctx.ids1[a] == ctx.ids2[b] {
                        nugget
                    } else {
                        0.0
                    }
                }))
            }
            Kernel::Delta { dsill, axes } => {
                let dsill = dsill.value(params)?;
                let pa = ctx.per_axis_dist2();
                let k = pa.len_of(Axis(2));
                let axes: Vec<usize> = match axes {
                    Some(axes) => {
                        if let Some(&bad) = axes.iter().find(|&&c| c >= k) {
                            return Err(GeostatError::ConfigError(format!(
                                "Delta axis {bad} out of range for {k}-dimensional locations"
                            )));
                        }
                        axes.clone()
                    }
                    None => (0..k).collect(),
                };
                Ok(Array2::from_shape_fn((n1, n2), |(a, b)| {
                    let d2: f64 = axes.iter().map(|&c| pa[[a, b, c]]).sum();
                    if d2 == 0.0 {
                        dsill
                    } else {
                        0.0
                    }
                }))
            }
            Kernel::Mix { inputs, weights } => {
                let w = weight_matrix(weights, inputs.len(), params)?;
                check_categories(ctx, w.nrows(), "Mix")?;
                let mut out = Array2::zeros((n1, n2));
                for (c, input) in inputs.iter().enumerate() {
                    let cov = input.evaluate(ctx, params)?;
                    for a in 0..n1 {
                        let wa = w[[ctx.cats1[a], c]];
                        if wa == 0.0 {
                            continue;
                        }
                        for b in 0..n2 {
                            out[[a, b]] += cov[[a, b]] * wa * w[[ctx.cats2[b], c]];
                        }
                    }
                }
                Ok(out)
            }
            Kernel::Mux { inputs } => {
                check_categories(ctx, inputs.len(), "Mux")?;
                let mut out = Array2::zeros((n1, n2));
                for (c, input) in inputs.iter().enumerate() {
                    let idx1: Vec<usize> = (0..n1).filter(|&a| ctx.cats1[a] == c).collect();
                    let idx2: Vec<usize> = (0..n2).filter(|&b| ctx.cats2[b] == c).collect();
                    if idx1.is_empty() || idx2.is_empty() {
                        continue;
                    }
                    let locs1 = ctx.locs1.select(Axis(0), &idx1);
                    let locs2 = ctx.locs2.select(Axis(0), &idx2);
                    let ids1: Vec<usize> = idx1.iter().map(|&a| ctx.ids1[a]).collect();
                    let ids2: Vec<usize> = idx2.iter().map(|&b| ctx.ids2[b]).collect();
                    let cats1 = vec![c; idx1.len()];
                    let cats2 = vec![c; idx2.len()];
                    let sub = CovContext::new(
                        locs1.view(),
                        &ids1,
                        &cats1,
                        locs2.view(),
                        &ids2,
                        &cats2,
                    );
                    let block = input.evaluate(&sub, params)?;
                    for (i, &a) in idx1.iter().enumerate() {
                        for (j, &b) in idx2.iter().enumerate() {
                            out[[a, b]] = block[[i, j]];
                        }
                    }
                }
                Ok(out)
            }
            Kernel::Stack(parts) => {
                let mut out = Array2::zeros((n1, n2));
                for part in parts {
                    out += &part.evaluate(ctx, params)?;
                }
                Ok(out)
            }
            Kernel::Product(parts) => {
                let mut out = Array2::ones((n1, n2));
                for part in parts {
                    out *= &part.evaluate(ctx, params)?;
                }
                Ok(out)
            }
        }
    }
}

fn fmt_param(name: &str, params: &Parameters) -> String {
    match params.get(name) {
        Some(v) => format!("{name} {v:4.2}"),
        None => format!("{name} ?"),
    }
}

fn axis_offsets(ctx: &CovContext<'_>, axis: usize, start: f64) -> GeostatResult<(Vec<f64>, Vec<f64>)> {
    let k = ctx.locs1.ncols();
    if axis >= k || axis >= ctx.locs2.ncols() {
        return Err(GeostatError::ConfigError(format!(
            "kernel axis {axis} out of range for {k}-dimensional locations"
        )));
    }
    let x1 = ctx.locs1.column(axis).iter().map(|x| x - start).collect();
    let x2 = ctx.locs2.column(axis).iter().map(|x| x - start).collect();
    Ok((x1, x2))
}

/// `k(x₁, x₂) = g(x₁ − x₂) − g(−x₂) − g(x₁) + g(0)` for offsets from `start`.
fn integrated(
    ctx: &CovContext<'_>,
    axis: usize,
    start: f64,
    g: impl Fn(f64) -> f64,
) -> GeostatResult<Array2<f64>> {
    let (x1, x2) = axis_offsets(ctx, axis, start)?;
    let g0 = g(0.0);
    let g1: Vec<f64> = x1.iter().map(|&x| g(x)).collect();
    let g2: Vec<f64> = x2.iter().map(|&x| g(-x)).collect();
    Ok(Array2::from_shape_fn((x1.len(), x2.len()), |(a, b)| {
        g(x1[a] - x2[b]) - g2[b] - g1[a] + g0
    }))
}

fn weight_matrix(
    weights: &[Vec<Param>],
    n_inputs: usize,
    params: &Parameters,
) -> GeostatResult<Array2<f64>> {
    let mut w = Array2::zeros((weights.len(), n_inputs));
    for (i, row) in weights.iter().enumerate() {
        if row.len() != n_inputs {
            return Err(GeostatError::ConfigError(format!(
                "Mix weight row {i} has {} entries for {n_inputs} inputs",
                row.len()
            )));
        }
        for (j, v) in values(row, params)?.into_iter().enumerate() {
            w[[i, j]] = v;
        }
    }
    Ok(w)
}

pub(crate) fn check_categories(ctx: &CovContext<'_>, limit: usize, what: &str) -> GeostatResult<()> {
    let max = ctx.cats1.iter().chain(ctx.cats2).copied().max();
    match max {
        Some(m) if m >= limit => Err(GeostatError::ConfigError(format!(
            "{what}: category {m} out of range, {limit} available"
        ))),
        _ => Ok(()),
    }
}

impl Add for Kernel {
    type Output = Kernel;

    fn add(self, other: Kernel) -> Kernel {
        let mut parts = match self {
            Kernel::Stack(parts) => parts,
            k => vec![k],
        };
        match other {
            Kernel::Stack(more) => parts.extend(more),
            k => parts.push(k),
        }
        Kernel::Stack(parts)
    }
}

impl Mul for Kernel {
    type Output = Kernel;

    fn mul(self, other: Kernel) -> Kernel {
        let mut parts = match self {
            Kernel::Product(parts) => parts,
            k => vec![k],
        };
        match other {
            Kernel::Product(more) => parts.extend(more),
            k => parts.push(k),
        }
        Kernel::Product(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::featurizer::Featurizer;
    use geostat_math::linalg::cholesky;
    use ndarray::{array, Array2};

    struct Fixture {
        locs: Array2<f64>,
        ids: Vec<usize>,
        cats: Vec<usize>,
    }

    impl Fixture {
        fn new(locs: Array2<f64>) -> Self {
            let n = locs.nrows();
            Fixture {
                locs,
                ids: (0..n).collect(),
                cats: vec![0; n],
            }
        }

        fn with_cats(mut self, cats: Vec<usize>) -> Self {
            self.cats = cats;
            self
        }

        fn ctx(&self) -> CovContext<'_> {
            CovContext::new(
                self.locs.view(),
                &self.ids,
                &self.cats,
                self.locs.view(),
                &self.ids,
                &self.cats,
            )
        }
    }

    fn line(n: usize) -> Array2<f64> {
        Array2::from_shape_fn((n, 2), |(i, c)| if c == 0 { 0.3 * i as f64 } else { 0.0 })
    }

    fn p() -> Parameters {
        Parameters::new()
            .with("sill", 2.0)
            .with("range", 0.5)
            .with("gamma", 1.0)
            .with("nugget", 0.1)
    }

    #[test]
    fn test_squared_exponential_values() {
        let fx = Fixture::new(array![[0.0, 0.0], [1.0, 0.0]]);
        let k = Kernel::squared_exponential("sill", "range");
        let c = k.evaluate(&fx.ctx(), &p()).unwrap();
        assert!((c[[0, 0]] - 2.0).abs() < 1e-12);
        assert!((c[[0, 1]] - 2.0 * (-0.5_f64 / 0.25).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_gamma_exponential_gamma_one_is_exponential() {
        let fx = Fixture::new(array![[0.0, 0.0], [1.0, 0.0]]);
        let k = Kernel::gamma_exponential("sill", "range", "gamma");
        let c = k.evaluate(&fx.ctx(), &p()).unwrap();
        assert!((c[[0, 1]] - 2.0 * (-2.0_f64).exp()).abs() < 1e-12);
        let vars: Vec<_> = k.vars().into_iter().map(|v| v.name).collect();
        assert_eq!(vars, vec!["sill", "range", "gamma"]);
    }

    #[test]
    fn test_noise_uses_ids() {
        let locs = array![[0.0], [0.0], [1.0]];
        let ids1 = [0, 1, 2];
        let ids2 = [2, 3, 4];
        let cats = [0, 0, 0];
        let ctx = CovContext::new(locs.view(), &ids1, &cats, locs.view(), &ids2, &cats);
        let c = Kernel::noise("nugget").evaluate(&ctx, &p()).unwrap();
        assert_eq!(c[[2, 0]], 0.1);
        assert_eq!(c.sum(), 0.1);
    }

    #[test]
    fn test_delta_axes() {
        let fx = Fixture::new(array![[0.0, 0.0, 1.0], [0.0, 0.0, 2.0], [1.0, 0.0, 1.0]]);
        let k = Kernel::delta(0.5, Some(vec![0, 1]));
        let c = k.evaluate(&fx.ctx(), &p()).unwrap();
        assert_eq!(c[[0, 1]], 0.5);
        assert_eq!(c[[0, 2]], 0.0);
        let all = Kernel::delta(0.5, None).evaluate(&fx.ctx(), &p()).unwrap();
        assert_eq!(all[[0, 1]], 0.0);
        assert_eq!(all[[1, 1]], 0.5);
        assert!(Kernel::delta(0.5, Some(vec![3])).evaluate(&fx.ctx(), &p()).is_err());
    }

    #[test]
    fn test_wiener_is_min() {
        let fx = Fixture::new(array![[1.0], [3.0]]);
        let c = Kernel::wiener(0, 0.5).evaluate(&fx.ctx(), &p()).unwrap();
        assert_eq!(c, array![[0.5, 0.5], [0.5, 2.5]]);
    }

    #[test]
    fn test_integrated_kernels_vanish_at_start_and_are_psd() {
        let fx = Fixture::new(line(12));
        for k in [
            Kernel::int_squared_exponential(0, 0.0, "range"),
            Kernel::int_exponential(0, 0.0, "range"),
        ] {
            let c = k.evaluate(&fx.ctx(), &p()).unwrap();
            // First location sits at the start: zero variance.
            assert!(c[[0, 0]].abs() < 1e-12);
            assert!(c[[0, 5]].abs() < 1e-12);
            for i in 0..12 {
                for j in 0..12 {
                    assert!((c[[i, j]] - c[[j, i]]).abs() < 1e-10);
                }
            }
            let mut jittered = c.slice(ndarray::s![1.., 1..]).to_owned();
            let top = jittered.diag().iter().fold(0.0_f64, |a, &v| a.max(v));
            for i in 0..11 {
                jittered[[i, i]] += 1e-6 * top;
            }
            assert!(cholesky(&jittered).is_ok());
        }
    }

    #[test]
    fn test_int_squared_exponential_small_separation_limit() {
        // For x ≪ range the integrand is ≈ 1, so k(x, x) ≈ x².
        let fx = Fixture::new(array![[0.01]]);
        let params = Parameters::new().with("range", 10.0);
        let c = Kernel::int_squared_exponential(0, 0.0, "range")
            .evaluate(&fx.ctx(), &params)
            .unwrap();
        assert!((c[[0, 0]] - 1e-4).abs() < 1e-8, "k = {}", c[[0, 0]]);
    }

    #[test]
    fn test_trend_prior() {
        let fx = Fixture::new(array![[1.0], [2.0]]);
        let k = Kernel::trend_prior(Featurizer::new(|x| vec![1.0, x[0]]), 3.0);
        let c = k.evaluate(&fx.ctx(), &p()).unwrap();
        assert_eq!(c, array![[6.0, 9.0], [9.0, 15.0]]);
    }

    #[test]
    fn test_add_and_mul_flatten() {
        let k = Kernel::noise(1.0) + Kernel::noise(2.0) + Kernel::noise(3.0);
        assert!(matches!(&k, Kernel::Stack(parts) if parts.len() == 3));
        let m = Kernel::wiener(0, 0.0) * Kernel::noise(1.0) * Kernel::noise(2.0);
        assert!(matches!(&m, Kernel::Product(parts) if parts.len() == 3));
    }

    #[test]
    fn test_product_multiplies() {
        let fx = Fixture::new(array![[1.0], [3.0]]);
        let k = Kernel::wiener(0, 0.0) * Kernel::squared_exponential(2.0, 1.0);
        let c = k.evaluate(&fx.ctx(), &p()).unwrap();
        assert!((c[[1, 1]] - 6.0).abs() < 1e-12);
        assert!((c[[0, 1]] - 2.0 * (-2.0_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_mux_is_block_diagonal_without_sorting() {
        let fx = Fixture::new(array![[0.0], [0.0], [1.0], [1.0]]).with_cats(vec![1, 0, 1, 0]);
        let k = Kernel::mux(vec![Kernel::squared_exponential(1.0, 1.0), Kernel::noise(5.0)]);
        let c = k.evaluate(&fx.ctx(), &p()).unwrap();
        // Different categories never covary.
        assert_eq!(c[[0, 1]], 0.0);
        // Category 1 is pure noise.
        assert_eq!(c[[0, 0]], 5.0);
        assert_eq!(c[[0, 2]], 0.0);
        // Category 0 is the squared exponential.
        assert!((c[[1, 3]] - (-0.5_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_mix_weights() {
        let fx = Fixture::new(array![[0.0], [0.0]]).with_cats(vec![0, 1]);
        let k = Kernel::mix(
            vec![Kernel::squared_exponential(1.0, 1.0), Kernel::squared_exponential(4.0, 1.0)],
            vec![
                vec![Param::from(1.0), Param::from(0.0)],
                vec![Param::from("w"), Param::from(1.0)],
            ],
        );
        let params = Parameters::new().with("w", -0.5);
        let c = k.evaluate(&fx.ctx(), &params).unwrap();
        assert!((c[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((c[[0, 1]] + 0.5).abs() < 1e-12);
        assert!((c[[1, 1]] - (0.25 + 4.0)).abs() < 1e-12);
        assert_eq!(k.vars()[0].name, "w");
    }

    #[test]
    fn test_category_out_of_range() {
        let fx = Fixture::new(array![[0.0], [1.0]]).with_cats(vec![0, 2]);
        let k = Kernel::mux(vec![Kernel::noise(1.0), Kernel::noise(1.0)]);
        assert!(matches!(
            k.evaluate(&fx.ctx(), &p()),
            Err(GeostatError::ConfigError(_))
        ));
    }

    #[test]
    fn test_reg_and_report() {
        let k = Kernel::squared_exponential("sill", "range")
            + Kernel::gamma_exponential(1.0, 2.0, "gamma")
            + Kernel::noise("nugget");
        assert!((k.reg(&p()).unwrap() - 2.5).abs() < 1e-12);
        assert_eq!(
            k.report(&p()),
            "[sill 2.00, range 0.50] [gamma 1.00] [nugget 0.10]"
        );
    }

    #[test]
    fn test_scale_and_metric_conflict() {
        let err = Kernel::squared_exponential_with(
            1.0,
            1.0,
            Some(vec![Param::from(1.0)]),
            Some(Metric::euclidean()),
        );
        assert!(matches!(err, Err(GeostatError::ConfigError(_))));
    }
}
