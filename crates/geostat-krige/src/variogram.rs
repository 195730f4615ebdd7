// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Variograms
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Empirical variograms and parametric variogram models.
//!
//! The cloud holds every pairwise (lag, semivariance) point; binning
//! averages it over equal-width lag bins up to the cutoff. Models are fitted
//! by bounded least squares with every parameter kept above
//! `VARIOGRAM_PARAM_FLOOR`.

use geostat_math::distance::pdist;
use geostat_math::optim::{curve_fit, CurveFitConfig, CurveFitResult};
use geostat_math::stats::{binned_statistic, Statistic};
use geostat_types::config::VariogramKind;
use geostat_types::constants::VARIOGRAM_PARAM_FLOOR;
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::{ArrayView1, ArrayView2};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariogramModel {
    /// `slope·h + nugget`
    Linear,
    /// `sill(1 − e^{−(h/range)²}) + nugget`
    Gaussian,
    /// `sill(3h/2r − h³/2r³) + nugget` up to the range, `sill + nugget` beyond
    Spherical,
}

impl From<VariogramKind> for VariogramModel {
    fn from(kind: VariogramKind) -> Self {
        match kind {
            VariogramKind::Linear => VariogramModel::Linear,
            VariogramKind::Gaussian => VariogramModel::Gaussian,
            VariogramKind::Spherical => VariogramModel::Spherical,
        }
    }
}

impl fmt::Display for VariogramModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariogramModel::Linear => "linear",
            VariogramModel::Gaussian => "gaussian",
            VariogramModel::Spherical => "spherical",
        };
        write!(f, "{name}")
    }
}

impl VariogramModel {
    pub fn param_names(&self) -> &'static [&'static str] {
        match self {
            VariogramModel::Linear => &["slope", "nugget"],
            VariogramModel::Gaussian | VariogramModel::Spherical => &["range", "sill", "nugget"],
        }
    }

    pub fn n_params(&self) -> usize {
        self.param_names().len()
    }

    pub fn has_range(&self) -> bool {
        !matches!(self, VariogramModel::Linear)
    }

    pub fn check_params(&self, params: &[f64]) -> GeostatResult<()> {
        if params.len() != self.n_params() {
            return Err(GeostatError::ConfigError(format!(
                "{self} variogram takes {} parameters, got {}",
                self.n_params(),
                params.len()
            )));
        }
        Ok(())
    }

    /// Semivariance at lag `h`.
    ///
    /// # Panics
    ///
    /// If `params` does not hold exactly `n_params()` values. Use
    /// [`check_params`](Self::check_params) on untrusted input first.
    pub fn evaluate(&self, h: f64, params: &[f64]) -> f64 {
        debug_assert_eq!(params.len(), self.n_params(), "{self} variogram parameters");
        match self {
            VariogramModel::Linear => params[0] * h + params[1],
            VariogramModel::Gaussian => {
                let (range, sill, nugget) = (params[0], params[1], params[2]);
                let x = h / range;
                sill * (1.0 - (-x * x).exp()) + nugget
            }
            VariogramModel::Spherical => {
                let (range, sill, nugget) = (params[0], params[1], params[2]);
                if h <= range {
                    let x = h / range;
                    sill * (1.5 * x - 0.5 * x * x * x) + nugget
                } else {
                    sill + nugget
                }
            }
        }
    }

    /// `sill + nugget` for models that level off.
    ///
    /// # Panics
    ///
    /// As [`evaluate`](Self::evaluate), on a parameter count other than
    /// `n_params()`.
    pub fn full_sill(&self, params: &[f64]) -> Option<f64> {
        debug_assert_eq!(params.len(), self.n_params(), "{self} variogram parameters");
        match self {
            VariogramModel::Linear => None,
            _ => Some(params[1] + params[2]),
        }
    }
}

/// Half the diagonal of the x/y bounding box of `locs`. One-dimensional
/// locations use half their extent.
pub fn cutoff_distance(locs: ArrayView2<'_, f64>) -> GeostatResult<f64> {
    if locs.nrows() == 0 || locs.ncols() == 0 {
        return Err(GeostatError::shape(
            "cutoff_distance",
            "[n >= 1, k >= 1]",
            format!("{:?}", locs.shape()),
        ));
    }
    let extent = |c: usize| {
        let col = locs.column(c);
        let lo = col.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = col.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        hi - lo
    };
    let a = extent(0);
    let b = if locs.ncols() > 1 { extent(1) } else { 0.0 };
    Ok(0.5 * (a * a + b * b).sqrt())
}

/// Every pairwise lag and semivariance `½ (uᵢ − uⱼ)²`, `i < j`.
#[derive(Debug, Clone)]
pub struct VariogramCloud {
    pub lags: Vec<f64>,
    pub semivariance: Vec<f64>,
}

impl VariogramCloud {
    pub fn new(locs: ArrayView2<'_, f64>, vals: ArrayView1<'_, f64>) -> GeostatResult<Self> {
        let n = locs.nrows();
        if vals.len() != n {
            return Err(GeostatError::shape("VariogramCloud values", n, vals.len()));
        }
        if n < 2 {
            return Err(GeostatError::ConfigError(
                "a variogram needs at least two observations".to_string(),
            ));
        }
        let lags = pdist(locs).to_vec();
        let mut semivariance = Vec::with_capacity(lags.len());
        for i in 0..n {
            for j in (i + 1)..n {
                let d = vals[i] - vals[j];
                semivariance.push(0.5 * d * d);
            }
        }
        Ok(VariogramCloud { lags, semivariance })
    }

    pub fn len(&self) -> usize {
        self.lags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lags.is_empty()
    }

    /// Points with lag strictly below `cutoff`.
    pub fn within(&self, cutoff: f64) -> (Vec<f64>, Vec<f64>) {
        self.lags
            .iter()
            .zip(&self.semivariance)
            .filter(|(h, _)| **h < cutoff)
            .map(|(&h, &g)| (h, g))
            .unzip()
    }
}

/// Binned variogram: mean semivariance per lag bin on `[min lag, cutoff]`
/// and pair counts over the full lag range.
#[derive(Debug, Clone)]
pub struct BinnedVariogram {
    pub centers: Vec<f64>,
    /// Mean semivariance; NaN for empty bins.
    pub means: Vec<f64>,
    pub edges: Vec<f64>,
    pub count_centers: Vec<f64>,
    pub counts: Vec<f64>,
}

impl BinnedVariogram {
    pub fn new(cloud: &VariogramCloud, bins: usize, cutoff: f64) -> GeostatResult<Self> {
        if cloud.is_empty() {
            return Err(GeostatError::ConfigError(
                "cannot bin an empty variogram cloud".to_string(),
            ));
        }
        let min_lag = cloud.lags.iter().copied().fold(f64::INFINITY, f64::min);
        if cutoff <= min_lag {
            return Err(GeostatError::ConfigError(format!(
                "cutoff {cutoff} is not above the smallest lag {min_lag}"
            )));
        }
        let means = binned_statistic(
            &cloud.lags,
            &cloud.semivariance,
            bins,
            Some((min_lag, cutoff)),
            Statistic::Mean,
        )?;
        let counts = binned_statistic(
            &cloud.lags,
            &cloud.semivariance,
            bins,
            None,
            Statistic::Count,
        )?;
        Ok(BinnedVariogram {
            centers: means.centers(),
            means: means.statistic,
            edges: means.edges,
            count_centers: counts.centers(),
            counts: counts.statistic,
        })
    }

    /// Centres and means of the non-empty bins.
    pub fn valid(&self) -> (Vec<f64>, Vec<f64>) {
        self.centers
            .iter()
            .zip(&self.means)
            .filter(|(_, m)| m.is_finite())
            .map(|(&c, &m)| (c, m))
            .unzip()
    }
}

/// What a variogram model is fitted to.
#[derive(Debug, Clone, Copy)]
pub enum Empirical<'a> {
    Cloud(&'a VariogramCloud),
    Binned(&'a BinnedVariogram),
}

fn min_max(v: &[f64]) -> (f64, f64) {
    v.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)))
}

/// Starting point for the least-squares fit, before clamping.
fn initial_guess(model: VariogramModel, lags: &[f64], gammas: &[f64], offset: f64) -> Vec<f64> {
    let (lag_lo, lag_hi) = min_max(lags);
    let (g_lo, g_hi) = min_max(gammas);
    if model.has_range() {
        vec![0.25 * lag_hi, g_hi - g_lo, g_lo + offset]
    } else {
        vec![(lag_hi - lag_lo) / (g_hi - g_lo), g_lo + offset]
    }
}

/// Fit `model` to a cloud (lags below `cutoff` only) or to the non-empty
/// bins of a binned variogram.
pub fn fit_variogram(
    model: VariogramModel,
    data: Empirical<'_>,
    cutoff: f64,
) -> GeostatResult<CurveFitResult> {
    let (x, y, p0) = match data {
        Empirical::Cloud(cloud) => {
            let p0 = initial_guess(model, &cloud.lags, &cloud.semivariance, VARIOGRAM_PARAM_FLOOR);
            let (x, y) = cloud.within(cutoff);
            (x, y, p0)
        }
        Empirical::Binned(binned) => {
            let (x, y) = binned.valid();
            let p0 = initial_guess(model, &x, &y, 0.0);
            (x, y, p0)
        }
    };
    if x.is_empty() {
        return Err(GeostatError::ConfigError(format!(
            "no variogram points to fit below cutoff {cutoff}"
        )));
    }

    let k = model.n_params();
    let lower = vec![VARIOGRAM_PARAM_FLOOR; k];
    let upper = vec![f64::INFINITY; k];
    let p0: Vec<f64> = p0
        .into_iter()
        .map(|p| if p.is_finite() { p.max(VARIOGRAM_PARAM_FLOOR) } else { 1.0 })
        .collect();

    curve_fit(
        |h, p| model.evaluate(h, p),
        &x,
        &y,
        &p0,
        &lower,
        &upper,
        &CurveFitConfig::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2};

    #[test]
    fn test_model_values() {
        let g = VariogramModel::Gaussian;
        assert_eq!(g.evaluate(0.0, &[1.0, 2.0, 0.5]), 0.5);
        assert!((g.evaluate(1.0, &[1.0, 2.0, 0.5]) - (2.0 * (1.0 - (-1.0_f64).exp()) + 0.5)).abs() < 1e-12);

        let s = VariogramModel::Spherical;
        assert!((s.evaluate(1.0, &[2.0, 1.0, 0.0]) - (0.75 - 0.0625)).abs() < 1e-12);
        assert_eq!(s.evaluate(2.0, &[2.0, 1.0, 0.1]), 1.1);
        assert_eq!(s.evaluate(5.0, &[2.0, 1.0, 0.1]), 1.1);

        assert_eq!(VariogramModel::Linear.evaluate(3.0, &[2.0, 1.0]), 7.0);
        assert_eq!(VariogramModel::Linear.full_sill(&[2.0, 1.0]), None);
        assert_eq!(g.full_sill(&[1.0, 2.0, 0.5]), Some(2.5));
    }

    #[test]
    fn test_param_names() {
        assert_eq!(VariogramModel::Gaussian.param_names(), &["range", "sill", "nugget"]);
        assert_eq!(VariogramModel::Linear.n_params(), 2);
        assert!(VariogramModel::Spherical.check_params(&[1.0, 1.0]).is_err());
        assert!(VariogramModel::Spherical.check_params(&[1.0, 1.0, 0.0]).is_ok());
    }

    #[test]
    #[should_panic]
    fn test_evaluate_rejects_short_parameters() {
        VariogramModel::Gaussian.evaluate(1.0, &[1.0, 1.0]);
    }

    #[test]
    #[should_panic]
    fn test_full_sill_rejects_short_parameters() {
        VariogramModel::Spherical.full_sill(&[1.0]);
    }

    #[test]
    fn test_cutoff_is_half_bbox_diagonal() {
        let locs = array![[0.0, 0.0], [6.0, 1.0], [3.0, 8.0]];
        assert!((cutoff_distance(locs.view()).unwrap() - 5.0).abs() < 1e-12);
        assert_eq!(cutoff_distance(array![[1.0], [5.0]].view()).unwrap(), 2.0);
        assert!(cutoff_distance(Array2::<f64>::zeros((3, 0)).view()).is_err());
    }

    #[test]
    fn test_cloud_pairs() {
        let locs = array![[0.0, 0.0], [3.0, 4.0], [0.0, 1.0]];
        let vals = array![1.0, 3.0, 0.0];
        let cloud = VariogramCloud::new(locs.view(), vals.view()).unwrap();
        assert_eq!(cloud.lags.len(), 3);
        assert!((cloud.lags[0] - 5.0).abs() < 1e-12);
        assert_eq!(cloud.semivariance, vec![2.0, 0.5, 4.5]);
        let (h, _) = cloud.within(2.0);
        assert_eq!(h, vec![1.0]);
    }

    fn gaussian_cloud() -> VariogramCloud {
        // Noise-free semivariances from a known gaussian model.
        let params = [3.0, 2.0, 0.2];
        let lags: Vec<f64> = (1..200).map(|i| i as f64 * 0.05).collect();
        let semivariance = lags
            .iter()
            .map(|&h| VariogramModel::Gaussian.evaluate(h, &params))
            .collect();
        VariogramCloud { lags, semivariance }
    }

    #[test]
    fn test_fit_cloud_recovers_gaussian() {
        let cloud = gaussian_cloud();
        let fit = fit_variogram(VariogramModel::Gaussian, Empirical::Cloud(&cloud), 8.0).unwrap();
        assert!((fit.params[0] - 3.0).abs() < 1e-3, "{:?}", fit.params);
        assert!((fit.params[1] - 2.0).abs() < 1e-3);
        assert!((fit.params[2] - 0.2).abs() < 1e-3);
    }

    #[test]
    fn test_fit_binned_linear() {
        let lags: Vec<f64> = (1..=100).map(|i| i as f64 * 0.1).collect();
        let semivariance = lags.iter().map(|h| 0.5 * h + 0.3).collect();
        let cloud = VariogramCloud { lags, semivariance };
        let binned = BinnedVariogram::new(&cloud, 10, 10.0).unwrap();
        let fit = fit_variogram(VariogramModel::Linear, Empirical::Binned(&binned), 10.0).unwrap();
        // Bin centres sit within half a lag step of the mean lag per bin.
        assert!((fit.params[0] - 0.5).abs() < 0.02, "{:?}", fit.params);
        assert!((fit.params[1] - 0.3).abs() < 0.05);
    }

    #[test]
    fn test_binned_counts_cover_all_lags() {
        let locs = Array2::from_shape_fn((10, 2), |(i, c)| if c == 0 { i as f64 } else { 0.0 });
        let vals = Array1::from_shape_fn(10, |i| (i % 3) as f64);
        let cloud = VariogramCloud::new(locs.view(), vals.view()).unwrap();
        let binned = BinnedVariogram::new(&cloud, 4, 4.0).unwrap();
        assert_eq!(binned.means.len(), 4);
        assert_eq!(binned.counts.iter().sum::<f64>(), 45.0);
        assert!(binned.edges[0] == 1.0 && binned.edges[4] == 4.0);
        assert!(BinnedVariogram::new(&cloud, 4, 0.5).is_err());
    }

    #[test]
    fn test_fit_floor_keeps_parameters_positive() {
        // Flat semivariance: the sill wants to be zero.
        let cloud = VariogramCloud {
            lags: (1..50).map(|i| i as f64).collect(),
            semivariance: vec![1.0; 49],
        };
        let fit = fit_variogram(VariogramModel::Spherical, Empirical::Cloud(&cloud), 100.0).unwrap();
        assert!(fit.params.iter().all(|&p| p >= VARIOGRAM_PARAM_FLOOR));
    }
}
