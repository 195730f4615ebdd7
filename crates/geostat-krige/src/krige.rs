// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Kriging
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ordinary and universal kriging on a fitted variogram.
//!
//! The kriging system in semivariance form:
//!
//! ```text
//! [ −Γ₁₁  1  F₁ ] [λ]   [ −γ₁₂ ]
//! [  1ᵀ   0  0  ] [μ] = [  1   ]
//! [  F₁ᵀ  0  0  ] [ν]   [  F₂  ]
//! ```
//!
//! with `Γ₁₁` zeroed on its diagonal. The estimate is `uᵀλ` and the kriging
//! variance `−Σ x ⊙ b`. Without a drift featurizer the `F` blocks vanish
//! (ordinary kriging). A drift that contains a constant feature duplicates
//! the unbiasedness row and makes the system singular.

use geostat_math::grid::{convex_hull_grid, GridPoint};
use crate::variogram::{
    cutoff_distance, fit_variogram, BinnedVariogram, Empirical, VariogramCloud, VariogramModel,
};
use geostat_gp::featurizer::Featurize;
use geostat_gp::model::Prediction;
use geostat_math::distance::cdist;
use geostat_math::linalg::lu_solve;
use geostat_math::optim::CurveFitResult;
use geostat_math::projection::Projector;
use geostat_math::stats;
use geostat_types::config::{Cutoff, KrigeConfig};
use geostat_types::data::Observations;
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::{Array1, Array2, ArrayView2};
use rayon::prelude::*;
use std::sync::Arc;

/// Leave-in residuals of the kriging estimate at the training locations.
#[derive(Debug, Clone)]
pub struct ResidualStats {
    pub residuals: Array1<f64>,
    pub mean: f64,
    pub std: f64,
    pub skew: f64,
    /// Excess kurtosis.
    pub kurt: f64,
}

#[derive(Debug, Clone)]
pub struct Krige {
    config: KrigeConfig,
    model: VariogramModel,
    projector: Option<Projector>,
    raw_locs: Array2<f64>,
    locs: Array2<f64>,
    vals: Array1<f64>,
    cutoff: f64,
    params: Vec<f64>,
    cloud: VariogramCloud,
    binned: Option<BinnedVariogram>,
    fit: Option<CurveFitResult>,
    drift: Option<Arc<dyn Featurize>>,
}

impl Krige {
    /// Build the empirical variogram of `(locs, vals)` and fit or accept
    /// the variogram parameters.
    pub fn new(locs: Array2<f64>, vals: Array1<f64>, config: KrigeConfig) -> GeostatResult<Self> {
        config.validate()?;
        let obs = Observations::new(locs, vals)?;
        let model = VariogramModel::from(config.variogram);

        let projector = config
            .projection
            .as_ref()
            .map(Projector::from_config)
            .transpose()?;
        let locs = match &projector {
            Some(p) => p.project(&obs.locs)?,
            None => obs.locs.clone(),
        };

        let cutoff = match config.cutoff {
            Cutoff::Auto => cutoff_distance(locs.view())?,
            Cutoff::Distance(d) => d,
        };
        let cloud = VariogramCloud::new(locs.view(), obs.vals.view())?;
        let binned = config
            .bins
            .map(|bins| BinnedVariogram::new(&cloud, bins, cutoff))
            .transpose()?;

        let (params, fit) = match &config.params {
            Some(p) => {
                model.check_params(p)?;
                (p.clone(), None)
            }
            None => {
                let data = match &binned {
                    Some(b) => Empirical::Binned(b),
                    None => Empirical::Cloud(&cloud),
                };
                let fit = fit_variogram(model, data, cutoff)?;
                (fit.params.clone(), Some(fit))
            }
        };

        let krige = Krige {
            model,
            projector,
            raw_locs: obs.locs,
            locs,
            vals: obs.vals,
            cutoff,
            params,
            cloud,
            binned,
            fit,
            drift: None,
            config,
        };
        if krige.config.verbose {
            krige.log_summary();
        }
        Ok(krige)
    }

    /// Universal kriging with drift features of the (projected) locations.
    pub fn with_drift(mut self, drift: impl Featurize + 'static) -> Self {
        self.drift = Some(Arc::new(drift));
        self
    }

    fn log_summary(&self) {
        tracing::info!(
            model = %self.model,
            cutoff = %format!("{:.2}", self.cutoff),
            pairs = self.cloud.len(),
            fitted = self.fit.is_some(),
            "variogram"
        );
        for (name, value) in self.model.param_names().iter().zip(&self.params) {
            tracing::info!(parameter = *name, value = %format!("{value:.5}"), "variogram");
        }
        if let Some(full) = self.model.full_sill(&self.params) {
            tracing::info!(full_sill = %format!("{full:.5}"), "variogram");
        }
        if let Some(fit) = &self.fit {
            tracing::debug!(
                iterations = fit.iterations,
                converged = fit.converged,
                residual = fit.residual,
                "variogram fit"
            );
        }
    }

    pub fn parameters(&self) -> &[f64] {
        &self.params
    }

    pub fn model(&self) -> VariogramModel {
        self.model
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn cloud(&self) -> &VariogramCloud {
        &self.cloud
    }

    pub fn binned(&self) -> Option<&BinnedVariogram> {
        self.binned.as_ref()
    }

    /// Least-squares result when the parameters were fitted.
    pub fn fit_result(&self) -> Option<&CurveFitResult> {
        self.fit.as_ref()
    }

    /// Training locations after projection.
    pub fn projected_locations(&self) -> ArrayView2<'_, f64> {
        self.locs.view()
    }

    pub fn projector(&self) -> Option<&Projector> {
        self.projector.as_ref()
    }

    fn drift_features(&self, locs: ArrayView2<'_, f64>) -> GeostatResult<Option<Array2<f64>>> {
        self.drift.as_ref().map(|d| d.features(locs)).transpose()
    }

    /// Kriging mean and variance at `locs2`, given in the same coordinates
    /// as the training locations.
    pub fn predict(&self, locs2: &Array2<f64>) -> GeostatResult<Prediction> {
        if locs2.ncols() != self.raw_locs.ncols() {
            return Err(GeostatError::shape(
                "Krige::predict location dimensions",
                self.raw_locs.ncols(),
                locs2.ncols(),
            ));
        }
        let x2 = match &self.projector {
            Some(p) => p.project(locs2)?,
            None => locs2.clone(),
        };
        let n1 = self.locs.nrows();
        let n2 = x2.nrows();

        let f1 = self.drift_features(self.locs.view())?;
        let f2 = self.drift_features(x2.view())?;
        let nf = f1.as_ref().map_or(0, |f| f.ncols());
        if let Some(f2) = &f2 {
            if f2.ncols() != nf {
                return Err(GeostatError::shape("drift features", nf, f2.ncols()));
            }
        }
        let size = n1 + 1 + nf;

        let model = self.model;
        let params = &self.params;
        let gamma = |h: f64| model.evaluate(h, params);

        let mut a = Array2::<f64>::zeros((size, size));
        let d1 = cdist(self.locs.view(), self.locs.view());
        for i in 0..n1 {
            for j in 0..n1 {
                if i != j {
                    a[[i, j]] = -gamma(d1[[i, j]]);
                }
            }
            a[[n1, i]] = 1.0;
            a[[i, n1]] = 1.0;
        }
        if let Some(f1) = &f1 {
            for i in 0..n1 {
                for k in 0..nf {
                    a[[n1 + 1 + k, i]] = f1[[i, k]];
                    a[[i, n1 + 1 + k]] = f1[[i, k]];
                }
            }
        }

        let d2 = cdist(self.locs.view(), x2.view());
        let columns: Vec<Vec<f64>> = (0..n2)
            .into_par_iter()
            .map(|j| (0..n1).map(|i| -gamma(d2[[i, j]])).collect())
            .collect();
        let mut b = Array2::<f64>::zeros((size, n2));
        for (j, col) in columns.iter().enumerate() {
            for (i, &v) in col.iter().enumerate() {
                b[[i, j]] = v;
            }
            b[[n1, j]] = 1.0;
            if let Some(f2) = &f2 {
                for k in 0..nf {
                    b[[n1 + 1 + k, j]] = f2[[j, k]];
                }
            }
        }

        let x = lu_solve(&a, &b)?;
        let lambda = x.slice(ndarray::s![..n1, ..]);
        let mean = self.vals.dot(&lambda);
        let var = (&x * &b).sum_axis(ndarray::Axis(0)).mapv(|v| -v);
        Ok(Prediction { mean, var })
    }

    /// Prediction lattice clipped to the convex hull of `(lon, lat)`,
    /// projected with this model's projector when it has one.
    pub fn convex_hull_grid(
        &self,
        spacing: usize,
        lon: &[f64],
        lat: &[f64],
        z: Option<&[f64]>,
    ) -> GeostatResult<Vec<GridPoint>> {
        convex_hull_grid(spacing, lon, lat, z, self.projector.as_ref())
    }

    /// Residuals of predicting the training values at their own locations.
    pub fn stats(&self) -> GeostatResult<ResidualStats> {
        let pred = self.predict(&self.raw_locs)?;
        let residuals = &self.vals - &pred.mean;
        let r = residuals.to_vec();
        let out = ResidualStats {
            mean: stats::mean(&r),
            std: stats::std(&r),
            skew: stats::skewness(&r),
            kurt: stats::kurtosis(&r),
            residuals,
        };
        if self.config.verbose {
            tracing::info!(
                mean = %format!("{:.3e}", out.mean),
                std = %format!("{:.3}", out.std),
                skew = %format!("{:.3}", out.skew),
                kurt = %format!("{:.3}", out.kurt),
                "residuals"
            );
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geostat_gp::featurizer::Featurizer;
    use geostat_types::config::{ProjectionConfig, VariogramKind};
    use ndarray::array;

    fn quiet(variogram: VariogramKind, params: Option<Vec<f64>>) -> KrigeConfig {
        KrigeConfig {
            variogram,
            params,
            verbose: false,
            ..KrigeConfig::default()
        }
    }

    fn field() -> (Array2<f64>, Array1<f64>) {
        let mut locs = Array2::zeros((25, 2));
        let mut vals = Array1::zeros(25);
        for i in 0..5 {
            for j in 0..5 {
                let r = i * 5 + j;
                let (x, y) = (i as f64, j as f64 * 1.3 + 0.1 * i as f64);
                locs[[r, 0]] = x;
                locs[[r, 1]] = y;
                vals[r] = (0.7 * x).sin() + 0.3 * y;
            }
        }
        (locs, vals)
    }

    #[test]
    fn test_ordinary_kriging_interpolates_without_nugget() {
        let (locs, vals) = field();
        let k = Krige::new(
            locs.clone(),
            vals.clone(),
            quiet(VariogramKind::Linear, Some(vec![1.0, 0.0])),
        )
        .unwrap();
        let pred = k.predict(&locs).unwrap();
        for i in 0..vals.len() {
            assert!((pred.mean[i] - vals[i]).abs() < 1e-8, "row {i}");
            assert!(pred.var[i].abs() < 1e-8);
        }
    }

    #[test]
    fn test_weights_sum_to_one() {
        // A constant field is reproduced exactly anywhere.
        let (locs, _) = field();
        let vals = Array1::from_elem(locs.nrows(), 4.2);
        let k = Krige::new(
            locs,
            vals,
            quiet(VariogramKind::Gaussian, Some(vec![2.0, 1.0, 0.1])),
        )
        .unwrap();
        let pred = k.predict(&array![[1.5, 2.5], [10.0, -3.0]]).unwrap();
        assert!(pred.mean.iter().all(|m| (m - 4.2).abs() < 1e-8));
        assert!(pred.var.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_variance_grows_away_from_data() {
        let (locs, vals) = field();
        let k = Krige::new(locs, vals, quiet(VariogramKind::Spherical, Some(vec![3.0, 1.0, 0.0])))
            .unwrap();
        let pred = k.predict(&array![[2.0, 2.0], [30.0, 30.0]]).unwrap();
        assert!(pred.var[0] < pred.var[1]);
    }

    #[test]
    fn test_universal_kriging_reproduces_linear_trend() {
        let (locs, _) = field();
        let vals = locs.column(0).mapv(|x| 2.0 * x) + &locs.column(1);
        let k = Krige::new(locs, vals, quiet(VariogramKind::Linear, Some(vec![1.0, 0.0])))
            .unwrap()
            .with_drift(Featurizer::new(|x| vec![x[0], x[1]]));
        let pred = k.predict(&array![[7.0, 1.0], [-2.0, 4.0]]).unwrap();
        assert!((pred.mean[0] - 15.0).abs() < 1e-6, "{}", pred.mean[0]);
        assert!((pred.mean[1] - 0.0).abs() < 1e-6, "{}", pred.mean[1]);
    }

    #[test]
    fn test_fitted_parameters_and_accessors() {
        let (locs, vals) = field();
        let k = Krige::new(locs, vals, quiet(VariogramKind::Gaussian, None)).unwrap();
        assert_eq!(k.parameters().len(), 3);
        assert!(k.parameters().iter().all(|&p| p >= 1e-6));
        assert!(k.fit_result().is_some());
        assert_eq!(k.cloud().len(), 25 * 24 / 2);
        assert!(k.binned().is_none());
        let expected = cutoff_distance(k.projected_locations()).unwrap();
        assert_eq!(k.cutoff(), expected);
    }

    #[test]
    fn test_binned_fit() {
        let (locs, vals) = field();
        let config = KrigeConfig {
            bins: Some(6),
            ..quiet(VariogramKind::Spherical, None)
        };
        let k = Krige::new(locs, vals, config).unwrap();
        assert_eq!(k.binned().unwrap().means.len(), 6);
        assert_eq!(k.parameters().len(), 3);
    }

    #[test]
    fn test_parameter_count_checked() {
        let (locs, vals) = field();
        let err = Krige::new(locs, vals, quiet(VariogramKind::Gaussian, Some(vec![1.0, 2.0])));
        assert!(matches!(err, Err(GeostatError::ConfigError(_))));
    }

    #[test]
    fn test_predict_dimension_mismatch() {
        let (locs, vals) = field();
        let k = Krige::new(locs, vals, quiet(VariogramKind::Linear, Some(vec![1.0, 0.0]))).unwrap();
        assert!(k.predict(&array![[1.0, 2.0, 3.0]]).is_err());
    }

    #[test]
    fn test_stats_zero_residuals_without_nugget() {
        let (locs, vals) = field();
        let k = Krige::new(locs, vals, quiet(VariogramKind::Linear, Some(vec![0.5, 0.0]))).unwrap();
        let s = k.stats().unwrap();
        assert_eq!(s.residuals.len(), 25);
        assert!(s.mean.abs() < 1e-8);
        assert!(s.std < 1e-8);
    }

    #[test]
    fn test_projected_kriging() {
        let locs = array![
            [-121.0, 36.0],
            [-120.0, 36.2],
            [-119.5, 37.0],
            [-120.5, 37.5],
            [-121.2, 36.9],
        ];
        let vals = array![1.0, 2.0, 3.0, 2.5, 1.5];
        let config = KrigeConfig {
            projection: Some(ProjectionConfig {
                units: geostat_types::config::DistanceUnits::Kilometers,
                ..ProjectionConfig::default()
            }),
            ..quiet(VariogramKind::Linear, Some(vec![0.01, 0.0]))
        };
        let k = Krige::new(locs.clone(), vals.clone(), config).unwrap();
        // Projected extent is on the order of a few hundred kilometres.
        assert!(k.cutoff() > 50.0 && k.cutoff() < 500.0, "{}", k.cutoff());
        let pred = k.predict(&locs).unwrap();
        for i in 0..5 {
            assert!((pred.mean[i] - vals[i]).abs() < 1e-8);
        }
        let grid = k.convex_hull_grid(6, &[-121.0, -119.5, -120.5], &[36.0, 37.0, 37.5], None).unwrap();
        assert!(grid.iter().all(|g| g.projected.is_some()));
    }
}
