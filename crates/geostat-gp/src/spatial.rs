// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Spatial GP
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Ready-made GP for lon/lat(/depth) data.
//!
//! A stationary covariance on projected coordinates, a trend prior over a
//! constant plus optional user features, and a nugget. Fitting and
//! prediction go through [`Model`].

use crate::featurizer::{FeatureFn, Featurizer};
use crate::gp::Gp;
use crate::kernel::Kernel;
use crate::model::{Model, Prediction};
use crate::param::Parameters;
use geostat_math::grid::{convex_hull_grid, GridPoint};
use geostat_math::projection::Projector;
use geostat_types::config::{CovarianceKind, FitConfig, PredictConfig, SpatialGpConfig};
use geostat_types::data::Observations;
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::{Array1, Array2};

/// `covariance + TrendPrior(1 ⊕ featurization, alpha) + Noise("nugget")`.
pub fn spatial_gp(covariance: CovarianceKind, alpha: f64, featurization: Option<FeatureFn>) -> Gp {
    let stationary = match covariance {
        CovarianceKind::SquaredExponential => Kernel::squared_exponential("sill", "range"),
        CovarianceKind::GammaExponential => Kernel::gamma_exponential("sill", "range", "gamma"),
    };
    let features = Featurizer::new(move |x: &[f64]| {
        let mut row = vec![1.0];
        if let Some(f) = &featurization {
            row.extend(f(x));
        }
        row
    });
    Gp::new(stationary + Kernel::trend_prior(features, alpha) + Kernel::noise("nugget"))
}

/// Starting point of a fit: unit range, sill and nugget (and gamma).
pub fn default_parameters(covariance: CovarianceKind) -> Parameters {
    let p = Parameters::new()
        .with("range", 1.0)
        .with("sill", 1.0)
        .with("nugget", 1.0);
    match covariance {
        CovarianceKind::SquaredExponential => p,
        CovarianceKind::GammaExponential => p.with("gamma", 1.0),
    }
}

#[derive(Debug, Clone)]
pub struct SpatialGp {
    config: SpatialGpConfig,
    projector: Option<Projector>,
    raw_dims: usize,
    locs: Array2<f64>,
    model: Model,
}

impl SpatialGp {
    /// Fit from the default starting point with a constant trend.
    pub fn fit(
        locs: Array2<f64>,
        vals: Array1<f64>,
        config: &SpatialGpConfig,
        fit_config: &FitConfig,
    ) -> GeostatResult<Self> {
        Self::fit_with(locs, vals, config, fit_config, None, Parameters::new())
    }

    /// Fit with extra trend features of the projected locations. `initial`
    /// overrides the default starting values.
    pub fn fit_with(
        locs: Array2<f64>,
        vals: Array1<f64>,
        config: &SpatialGpConfig,
        fit_config: &FitConfig,
        featurization: Option<FeatureFn>,
        initial: Parameters,
    ) -> GeostatResult<Self> {
        config.validate()?;
        let projector = config
            .projection
            .as_ref()
            .map(Projector::from_config)
            .transpose()?;
        let raw_dims = locs.ncols();
        let projected = match &projector {
            Some(p) => p.project(&locs)?,
            None => locs,
        };
        let obs = Observations::new(projected, vals)?;

        let mut parameters = default_parameters(config.covariance);
        parameters.merge(&initial);
        let model = Model::new(spatial_gp(config.covariance, config.alpha, featurization))
            .with_parameters(parameters)
            .verbose(config.verbose)
            .build()?
            .fit(&obs, fit_config)?;
        if config.verbose {
            tracing::info!(
                covariance = ?config.covariance,
                n = obs.len(),
                "spatial gp {}",
                model.gp.report(&model.parameters)
            );
        }

        Ok(SpatialGp {
            config: config.clone(),
            projector,
            raw_dims,
            locs: obs.locs,
            model,
        })
    }

    /// Posterior mean and variance at raw `locs2`, projected like training.
    pub fn predict(&self, locs2: &Array2<f64>, batch_size: Option<usize>) -> GeostatResult<Prediction> {
        if locs2.ncols() != self.raw_dims {
            return Err(GeostatError::shape(
                "SpatialGp::predict location dimensions",
                self.raw_dims,
                locs2.ncols(),
            ));
        }
        let x2 = match &self.projector {
            Some(p) => p.project(locs2)?,
            None => locs2.clone(),
        };
        let config = PredictConfig {
            batch_size,
            ..PredictConfig::default()
        };
        self.model.predict(&x2, None, &config)
    }

    pub fn convex_hull_grid(
        &self,
        spacing: usize,
        lon: &[f64],
        lat: &[f64],
        z: Option<&[f64]>,
    ) -> GeostatResult<Vec<GridPoint>> {
        convex_hull_grid(spacing, lon, lat, z, self.projector.as_ref())
    }

    pub fn parameters(&self) -> &Parameters {
        &self.model.parameters
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn config(&self) -> &SpatialGpConfig {
        &self.config
    }

    pub fn projected_locations(&self) -> &Array2<f64> {
        &self.locs
    }

    pub fn projector(&self) -> Option<&Projector> {
        self.projector.as_ref()
    }
}
