// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Prediction Grids
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Regular lon/lat lattices clipped to the convex hull of a point set.

use crate::hull::{convex_hull, point_in_convex_polygon};
use crate::projection::Projector;
use geostat_types::constants::METERS_PER_KILOMETER;
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::Array2;
use rayon::prelude::*;
use serde::Serialize;

/// Projected coordinates of a grid point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProjectedPoint {
    pub xm: f64,
    pub ym: f64,
    pub xkm: f64,
    pub ykm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zkm: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPoint {
    pub lon: f64,
    pub lat: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected: Option<ProjectedPoint>,
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![lo];
    }
    let step = (hi - lo) / (n - 1) as f64;
    (0..n)
        .map(|i| if i + 1 == n { hi } else { lo + i as f64 * step })
        .collect()
}

fn bounds(v: &[f64]) -> (f64, f64) {
    v.iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)))
}

/// `spacing × spacing` lattice over the bounding box of `(lon, lat)`,
/// keeping points inside or on the convex hull. Latitude varies slowest.
/// A spacing of 1 gives the single corner `(min lon, min lat)`, kept only
/// when it lies inside or on the hull.
/// With `z`, each kept point is repeated once per depth.
pub fn convex_hull_grid(
    spacing: usize,
    lon: &[f64],
    lat: &[f64],
    z: Option<&[f64]>,
    projector: Option<&Projector>,
) -> GeostatResult<Vec<GridPoint>> {
    if spacing == 0 {
        return Err(GeostatError::ConfigError(
            "grid spacing must be >= 1".to_string(),
        ));
    }
    if lon.len() != lat.len() {
        return Err(GeostatError::shape("convex_hull_grid latitudes", lon.len(), lat.len()));
    }
    if lon.is_empty() {
        return Err(GeostatError::ConfigError(
            "convex_hull_grid requires at least one point".to_string(),
        ));
    }
    if !lon.iter().chain(lat).all(|v| v.is_finite()) {
        return Err(GeostatError::ConfigError(
            "convex_hull_grid coordinates must be finite".to_string(),
        ));
    }

    let points: Vec<[f64; 2]> = lon.iter().zip(lat).map(|(&x, &y)| [x, y]).collect();
    let hull = convex_hull(&points);
    let (lon_lo, lon_hi) = bounds(lon);
    let (lat_lo, lat_hi) = bounds(lat);
    let lons = linspace(lon_lo, lon_hi, spacing);
    let lats = linspace(lat_lo, lat_hi, spacing);

    let inside: Vec<(f64, f64)> = lats
        .par_iter()
        .flat_map_iter(|&y| {
            let hull = &hull;
            lons.iter()
                .filter(move |&&x| point_in_convex_polygon(hull, [x, y]))
                .map(move |&x| (x, y))
        })
        .collect();

    let depths: Vec<Option<f64>> = match z {
        Some(z) => z.iter().copied().map(Some).collect(),
        None => vec![None],
    };

    let mut out = Vec::with_capacity(inside.len() * depths.len());
    for &(x, y) in &inside {
        let planar = projector.map(|p| p.albers.forward(x, y));
        for &d in &depths {
            let projected = planar.map(|(xm, ym)| ProjectedPoint {
                xm,
                ym,
                xkm: xm / METERS_PER_KILOMETER,
                ykm: ym / METERS_PER_KILOMETER,
                zkm: d.map(|d| d / METERS_PER_KILOMETER),
            });
            out.push(GridPoint {
                lon: x,
                lat: y,
                z: d,
                projected,
            });
        }
    }
    tracing::debug!(
        spacing,
        kept = inside.len(),
        total = out.len(),
        "convex hull grid"
    );
    Ok(out)
}

/// Raw `[lon, lat(, z)]` rows of a grid, ready for prediction.
pub fn to_locations(grid: &[GridPoint]) -> Array2<f64> {
    let with_depth = grid.first().is_some_and(|g| g.z.is_some());
    let k = if with_depth { 3 } else { 2 };
    let mut out = Array2::zeros((grid.len(), k));
    for (i, g) in grid.iter().enumerate() {
        out[[i, 0]] = g.lon;
        out[[i, 1]] = g.lat;
        if with_depth {
            out[[i, 2]] = g.z.unwrap_or(0.0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use geostat_types::config::ProjectionConfig;

    #[test]
    fn test_square_keeps_every_lattice_point() {
        let lon = [0.0, 1.0, 1.0, 0.0];
        let lat = [0.0, 0.0, 1.0, 1.0];
        let grid = convex_hull_grid(5, &lon, &lat, None, None).unwrap();
        assert_eq!(grid.len(), 25);
        assert_eq!((grid[0].lon, grid[0].lat), (0.0, 0.0));
        assert_eq!((grid[1].lon, grid[1].lat), (0.25, 0.0));
        assert_eq!((grid[24].lon, grid[24].lat), (1.0, 1.0));
        assert!(grid.iter().all(|g| g.projected.is_none() && g.z.is_none()));
    }

    #[test]
    fn test_triangle_drops_outside_corner() {
        let lon = [0.0, 1.0, 0.0];
        let lat = [0.0, 0.0, 1.0];
        let grid = convex_hull_grid(3, &lon, &lat, None, None).unwrap();
        // 3 + 2 + 1 points on or below the hypotenuse.
        assert_eq!(grid.len(), 6);
        assert!(grid.iter().all(|g| g.lon + g.lat <= 1.0 + 1e-12));
    }

    #[test]
    fn test_depths_repeat_points() {
        let lon = [0.0, 1.0, 1.0, 0.0];
        let lat = [0.0, 0.0, 1.0, 1.0];
        let grid = convex_hull_grid(2, &lon, &lat, Some(&[10.0, 20.0, 30.0]), None).unwrap();
        assert_eq!(grid.len(), 12);
        assert_eq!(grid[0].z, Some(10.0));
        assert_eq!(grid[2].z, Some(30.0));
        assert_eq!((grid[3].lon, grid[3].z), (1.0, Some(10.0)));
        let locs = to_locations(&grid);
        assert_eq!(locs.dim(), (12, 3));
        assert_eq!(locs[[2, 2]], 30.0);
    }

    #[test]
    fn test_projected_columns() {
        let projector = Projector::from_config(&ProjectionConfig::default()).unwrap();
        let lon = [-121.0, -119.0, -120.0];
        let lat = [36.0, 36.0, 38.0];
        let grid = convex_hull_grid(4, &lon, &lat, Some(&[500.0]), Some(&projector)).unwrap();
        assert!(!grid.is_empty());
        for g in &grid {
            let p = g.projected.unwrap();
            let (xm, ym) = projector.albers.forward(g.lon, g.lat);
            assert_eq!((p.xm, p.ym), (xm, ym));
            assert!((p.xkm * 1000.0 - p.xm).abs() < 1e-6);
            assert!((p.ykm * 1000.0 - p.ym).abs() < 1e-6);
            assert_eq!(p.zkm, Some(0.5));
        }
    }

    #[test]
    fn test_single_point_lattice() {
        // The minimum corner of a triangle that contains it.
        let lon = [0.0, 2.0, 0.0];
        let lat = [0.0, 0.0, 2.0];
        let grid = convex_hull_grid(1, &lon, &lat, Some(&[5.0, 6.0]), None).unwrap();
        assert_eq!(grid.len(), 2);
        assert_eq!((grid[0].lon, grid[0].lat, grid[0].z), (0.0, 0.0, Some(5.0)));
        // The minimum corner of a triangle that does not.
        let grid = convex_hull_grid(1, &[1.0, 2.0, 0.0], &[0.0, 2.0, 2.0], None, None).unwrap();
        assert!(grid.is_empty());
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(convex_hull_grid(0, &[0.0], &[0.0], None, None).is_err());
        assert!(convex_hull_grid(3, &[0.0, 1.0], &[0.0], None, None).is_err());
        assert!(convex_hull_grid(3, &[], &[], None, None).is_err());
    }

    #[test]
    fn test_serializes_without_empty_fields() {
        let g = GridPoint {
            lon: 1.0,
            lat: 2.0,
            z: None,
            projected: None,
        };
        let json = serde_json::to_string(&g).unwrap();
        assert_eq!(json, r#"{"lon":1.0,"lat":2.0}"#);
    }
}
