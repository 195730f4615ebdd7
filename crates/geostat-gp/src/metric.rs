// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Metrics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Squared distances used by stationary kernels.

use crate::kernel::CovContext;
use crate::param::{values, Param, ParamRef, Parameters};
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::{Array2, ArrayView2, Axis};
use std::fmt;
use std::sync::Arc;

/// Location transform for the Poincaré metric. Output row: `[z, x1, x2, ...]`.
pub type LocationTransform = Arc<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>;

#[derive(Clone)]
pub enum Metric {
    /// `d² = Σ_c Δ_c² · s_c²`, or the plain sum when unscaled.
    Euclidean { scale: Option<Vec<Param>> },
    /// Hyperbolic distance in the upper half-space with the boundary at
    /// `z = -zoff`.
    Poincare {
        xform: LocationTransform,
        zoff: Param,
        scale: Option<Vec<Param>>,
    },
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Euclidean { scale } => f.debug_struct("Euclidean").field("scale", scale).finish(),
            Metric::Poincare { zoff, scale, .. } => f
                .debug_struct("Poincare")
                .field("zoff", zoff)
                .field("scale", scale)
                .finish(),
        }
    }
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Euclidean { scale: None }
    }
}

impl Metric {
    pub fn euclidean() -> Self {
        Metric::default()
    }

    pub fn scaled<P: Into<Param>>(scale: Vec<P>) -> Self {
        Metric::Euclidean {
            scale: Some(scale.into_iter().map(Into::into).collect()),
        }
    }

    pub fn poincare<F>(xform: F, zoff: impl Into<Param>, scale: Option<Vec<Param>>) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        Metric::Poincare {
            xform: Arc::new(xform),
            zoff: zoff.into(),
            scale,
        }
    }

    pub fn vars(&self) -> Vec<ParamRef> {
        let mut out = Vec::new();
        let scale = match self {
            Metric::Euclidean { scale } => scale,
            Metric::Poincare { zoff, scale, .. } => {
                out.extend(zoff.positive());
                scale
            }
        };
        if let Some(scale) = scale {
            out.extend(scale.iter().filter_map(Param::positive));
        }
        out
    }

    /// Squared distance matrix `[N1, N2]`.
    pub fn dist2(&self, ctx: &CovContext<'_>, params: &Parameters) -> GeostatResult<Array2<f64>> {
        match self {
            Metric::Euclidean { scale: None } => Ok(ctx.per_axis_dist2().sum_axis(Axis(2))),
            Metric::Euclidean { scale: Some(scale) } => {
                let s = values(scale, params)?;
                let pa = ctx.per_axis_dist2();
                if s.len() != pa.len_of(Axis(2)) {
                    return Err(GeostatError::shape(
                        "Euclidean scale",
                        pa.len_of(Axis(2)),
                        s.len(),
                    ));
                }
                let (n1, n2, k) = pa.dim();
                Ok(Array2::from_shape_fn((n1, n2), |(a, b)| {
                    (0..k).map(|c| pa[[a, b, c]] * s[c] * s[c]).sum()
                }))
            }
            Metric::Poincare { xform, zoff, scale } => {
                let zoff = zoff.value(params)?;
                let scale = match scale {
                    Some(s) => Some(values(s, params)?),
                    None => None,
                };
                poincare_dist2(xform, zoff, scale.as_deref(), ctx.locs1, ctx.locs2)
            }
        }
    }
}

fn transform_locs(
    xform: &LocationTransform,
    locs: ArrayView2<'_, f64>,
    scale: Option<&[f64]>,
) -> GeostatResult<Array2<f64>> {
    let rows: Vec<Vec<f64>> = locs.outer_iter().map(|r| xform(&r.to_vec())).collect();
    let width = rows.first().map_or(0, Vec::len);
    if width == 0 {
        return Err(GeostatError::ConfigError(
            "Poincare transform must return at least one coordinate".to_string(),
        ));
    }
    let mut out = Array2::zeros((rows.len(), width));
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(GeostatError::shape("Poincare transform", width, row.len()));
        }
        for (j, &v) in row.iter().enumerate() {
            out[[i, j]] = v;
        }
    }
    if let Some(s) = scale {
        if s.len() != width {
            return Err(GeostatError::shape("Poincare scale", width, s.len()));
        }
        for mut row in out.outer_iter_mut() {
            for (v, sc) in row.iter_mut().zip(s) {
                *v *= sc;
            }
        }
    }
    Ok(out)
}

fn poincare_dist2(
    xform: &LocationTransform,
    zoff: f64,
    scale: Option<&[f64]>,
    locs1: ArrayView2<'_, f64>,
    locs2: ArrayView2<'_, f64>,
) -> GeostatResult<Array2<f64>> {
    let x1 = transform_locs(xform, locs1, scale)?;
    let x2 = transform_locs(xform, locs2, scale)?;
    let zoff = match scale {
        Some(s) => zoff * s[0],
        None => zoff,
    };
    let k = x1.ncols();
    if x2.ncols() != k {
        return Err(GeostatError::shape("Poincare transform", k, x2.ncols()));
    }
    Ok(Array2::from_shape_fn((x1.nrows(), x2.nrows()), |(a, b)| {
        let z1 = x1[[a, 0]] + zoff;
        let z2 = x2[[b, 0]] + zoff;
        let d2: f64 = (0..k).map(|c| (x1[[a, c]] - x2[[b, c]]).powi(2)).sum();
        let h = 2.0 * zoff * (0.5 * (d2 / (z1 * z2)).sqrt()).asinh();
        h * h
    }))
}
