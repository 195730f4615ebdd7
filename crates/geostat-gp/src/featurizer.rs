// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Featurizers
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Location featurization (the F matrix of trends and trend priors).

use geostat_math::stats;
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::fmt;
use std::sync::Arc;

/// Maps a location row to its feature vector.
pub type FeatureFn = Arc<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>;

/// Anything that turns locations `[N, K]` into features `[N, F]`.
pub trait Featurize: Send + Sync + fmt::Debug {
    fn features(&self, locs: ArrayView2<'_, f64>) -> GeostatResult<Array2<f64>>;
}

#[derive(Clone)]
pub struct Featurizer {
    func: Option<FeatureFn>,
}

impl fmt::Debug for Featurizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.func {
            Some(_) => write!(f, "Featurizer(fn)"),
            None => write!(f, "Featurizer(none)"),
        }
    }
}

impl Featurizer {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        Featurizer {
            func: Some(Arc::new(func)),
        }
    }

    /// Zero features for every location.
    pub fn none() -> Self {
        Featurizer { func: None }
    }

    pub fn apply(&self, locs: ArrayView2<'_, f64>) -> GeostatResult<Array2<f64>> {
        let n = locs.nrows();
        let func = match &self.func {
            Some(func) => func,
            None => return Ok(Array2::zeros((n, 0))),
        };
        if n == 0 {
            return Ok(Array2::zeros((0, 0)));
        }

        let rows: Vec<Vec<f64>> = locs
            .outer_iter()
            .map(|row| match row.as_slice() {
                Some(s) => func(s),
                None => func(&row.to_vec()),
            })
            .collect();
        let width = rows[0].len();
        let mut out = Array2::zeros((n, width));
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(GeostatError::shape(
                    &format!("featurizer row {i}"),
                    width,
                    row.len(),
                ));
            }
            for (j, &v) in row.iter().enumerate() {
                out[[i, j]] = v;
            }
        }
        Ok(out)
    }
}

impl Featurize for Featurizer {
    fn features(&self, locs: ArrayView2<'_, f64>) -> GeostatResult<Array2<f64>> {
        self.apply(locs)
    }
}

/// Featurizer that standardises each feature with statistics taken from a
/// reference location set and prepends an intercept column.
#[derive(Debug, Clone)]
pub struct NormalizingFeaturizer {
    inner: Featurizer,
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl NormalizingFeaturizer {
    pub fn new<F>(func: F, locs: ArrayView2<'_, f64>) -> GeostatResult<Self>
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        Self::from_featurizer(Featurizer::new(func), locs)
    }

    pub fn from_featurizer(inner: Featurizer, locs: ArrayView2<'_, f64>) -> GeostatResult<Self> {
        if locs.nrows() == 0 {
            return Err(GeostatError::ConfigError(
                "NormalizingFeaturizer needs at least one reference location".to_string(),
            ));
        }
        let f = inner.apply(locs)?;
        let cols = f.axis_iter(Axis(1)).map(|c| c.to_vec());
        let (mean, std): (Vec<f64>, Vec<f64>) =
            cols.map(|c| (stats::mean(&c), stats::std(&c))).unzip();
        Ok(NormalizingFeaturizer {
            inner,
            mean: Array1::from_vec(mean),
            std: Array1::from_vec(std),
        })
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    /// `[1, (F - mean) / std]`; zero-variance features are only centred.
    pub fn apply(&self, locs: ArrayView2<'_, f64>) -> GeostatResult<Array2<f64>> {
        let n = locs.nrows();
        let raw = if self.mean.is_empty() {
            Array2::zeros((n, 0))
        } else {
            self.inner.apply(locs)?
        };
        if raw.ncols() != self.mean.len() {
            return Err(GeostatError::shape(
                "NormalizingFeaturizer",
                self.mean.len(),
                raw.ncols(),
            ));
        }
        let mut out = Array2::ones((n, raw.ncols() + 1));
        for j in 0..raw.ncols() {
            let sd = if self.std[j] > 0.0 { self.std[j] } else { 1.0 };
            for i in 0..n {
                out[[i, j + 1]] = (raw[[i, j]] - self.mean[j]) / sd;
            }
        }
        Ok(out)
    }
}

impl Featurize for NormalizingFeaturizer {
    fn features(&self, locs: ArrayView2<'_, f64>) -> GeostatResult<Array2<f64>> {
        self.apply(locs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_featurizer_rows() {
        let f = Featurizer::new(|x| vec![1.0, x[0], x[1], x[0] * x[1]]);
        let locs = array![[1.0, 2.0], [3.0, -1.0]];
        let out = f.apply(locs.view()).unwrap();
        assert_eq!(out.dim(), (2, 4));
        assert_eq!(out.row(1).to_vec(), vec![1.0, 3.0, -1.0, -3.0]);
    }

    #[test]
    fn test_none_has_no_columns() {
        let out = Featurizer::none().apply(array![[1.0], [2.0]].view()).unwrap();
        assert_eq!(out.dim(), (2, 0));
    }

    #[test]
    fn test_inconsistent_width_rejected() {
        let f = Featurizer::new(|x| if x[0] > 0.0 { vec![1.0] } else { vec![1.0, 2.0] });
        let err = f.apply(array![[1.0], [-1.0]].view()).unwrap_err();
        assert!(matches!(err, GeostatError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_normalizing_standardises_reference() {
        let locs = array![[0.0, 5.0], [1.0, 5.0], [2.0, 5.0], [3.0, 5.0]];
        let nf = NormalizingFeaturizer::new(|x| vec![x[0], x[1]], locs.view()).unwrap();
        let out = nf.apply(locs.view()).unwrap();
        assert_eq!(out.ncols(), 3);
        for i in 0..4 {
            assert_eq!(out[[i, 0]], 1.0);
            // Constant feature: centred, not scaled.
            assert_eq!(out[[i, 2]], 0.0);
        }
        let col: Vec<f64> = out.column(1).to_vec();
        assert!(stats::mean(&col).abs() < 1e-12);
        assert!((stats::std(&col) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_normalizing_without_features_is_intercept() {
        let locs = array![[0.0], [1.0]];
        let nf = NormalizingFeaturizer::from_featurizer(Featurizer::none(), locs.view()).unwrap();
        let out = nf.apply(array![[4.0], [5.0], [6.0]].view()).unwrap();
        assert_eq!(out, Array2::<f64>::ones((3, 1)));
    }
}
