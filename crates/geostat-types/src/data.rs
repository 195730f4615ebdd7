// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Observations
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{GeostatError, GeostatResult};
use ndarray::{Array1, Array2};

/// Point observations of a spatial field.
#[derive(Debug, Clone)]
pub struct Observations {
    pub locs: Array2<f64>,      // Locations [n, k]
    pub vals: Array1<f64>,      // Observed values [n]
    pub cats: Option<Vec<usize>>, // Category of each observation
}

impl Observations {
    pub fn new(locs: Array2<f64>, vals: Array1<f64>) -> GeostatResult<Self> {
        Self::build(locs, vals, None)
    }

    pub fn with_categories(
        locs: Array2<f64>,
        vals: Array1<f64>,
        cats: Vec<usize>,
    ) -> GeostatResult<Self> {
        Self::build(locs, vals, Some(cats))
    }

    /// Accepts values given as an `[n, 1]` column.
    pub fn from_column(locs: Array2<f64>, vals: Array2<f64>) -> GeostatResult<Self> {
        if vals.ncols() != 1 {
            return Err(GeostatError::shape(
                "observation values",
                "[n] or [n, 1]",
                format!("{:?}", vals.shape()),
            ));
        }
        let vals = vals.column(0).to_owned();
        Self::build(locs, vals, None)
    }

    fn build(
        locs: Array2<f64>,
        vals: Array1<f64>,
        cats: Option<Vec<usize>>,
    ) -> GeostatResult<Self> {
        let n = locs.nrows();
        if n == 0 {
            return Err(GeostatError::ConfigError(
                "observations require at least one location".to_string(),
            ));
        }
        if locs.ncols() == 0 {
            return Err(GeostatError::ConfigError(
                "observations require at least one coordinate axis".to_string(),
            ));
        }
        if vals.len() != n {
            return Err(GeostatError::shape("observation values", n, vals.len()));
        }
        if let Some(cats) = &cats {
            if cats.len() != n {
                return Err(GeostatError::shape("observation categories", n, cats.len()));
            }
        }
        if !locs.iter().all(|v| v.is_finite()) || !vals.iter().all(|v| v.is_finite()) {
            return Err(GeostatError::ConfigError(
                "observations contain non-finite values".to_string(),
            ));
        }
        Ok(Observations { locs, vals, cats })
    }

    pub fn len(&self) -> usize {
        self.locs.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.locs.nrows() == 0
    }

    /// Number of coordinate axes.
    pub fn dims(&self) -> usize {
        self.locs.ncols()
    }
}
