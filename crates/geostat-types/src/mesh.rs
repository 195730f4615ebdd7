// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Mesh
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{GeostatError, GeostatResult};
use ndarray::{Array1, Array2};

/// Regular 2D mesh of cell centres.
/// Rows run along y, columns along x, so `slice` output is `[ny, nx]`.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub nx: usize,
    pub ny: usize,
    pub x: Array1<f64>, // Cell-centre x coordinates [nx]
    pub y: Array1<f64>, // Cell-centre y coordinates [ny]
    pub dx: f64,
    pub dy: f64,
}

impl Mesh {
    /// Build from `[x0, y0, x1, y1]` with `nx` cells along x.
    /// `ny` is chosen so that cells are as close to square as possible.
    pub fn from_bounds(bounds: [f64; 4], nx: usize) -> GeostatResult<Self> {
        let [x0, y0, x1, y1] = bounds;
        if nx == 0 {
            return Err(GeostatError::ConfigError(
                "mesh requires nx >= 1".to_string(),
            ));
        }
        if !bounds.iter().all(|b| b.is_finite()) || x1 <= x0 || y1 <= y0 {
            return Err(GeostatError::ConfigError(format!(
                "mesh bounds must satisfy x0 < x1 and y0 < y1, got {bounds:?}"
            )));
        }
        let ny = ((nx as f64) * (y1 - y0) / (x1 - x0)).round().max(1.0) as usize;
        let dx = (x1 - x0) / nx as f64;
        let dy = (y1 - y0) / ny as f64;
        let x = Array1::from_shape_fn(nx, |i| x0 + (i as f64 + 0.5) * dx);
        let y = Array1::from_shape_fn(ny, |j| y0 + (j as f64 + 0.5) * dy);
        Ok(Mesh {
            nx,
            ny,
            x,
            y,
            dx,
            dy,
        })
    }

    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All cell centres as `[ny * nx, 2]`, y outer and x inner.
    pub fn locations(&self) -> Array2<f64> {
        let mut locs = Array2::zeros((self.len(), 2));
        for j in 0..self.ny {
            for i in 0..self.nx {
                let row = j * self.nx + i;
                locs[[row, 0]] = self.x[i];
                locs[[row, 1]] = self.y[j];
            }
        }
        locs
    }

    /// Reshape values laid out like `locations()` into `(meshx, meshy, vals)`,
    /// each `[ny, nx]`.
    pub fn slice(
        &self,
        vals: &Array1<f64>,
    ) -> GeostatResult<(Array2<f64>, Array2<f64>, Array2<f64>)> {
        if vals.len() != self.len() {
            return Err(GeostatError::shape("mesh values", self.len(), vals.len()));
        }
        let meshx = Array2::from_shape_fn((self.ny, self.nx), |(_, i)| self.x[i]);
        let meshy = Array2::from_shape_fn((self.ny, self.nx), |(j, _)| self.y[j]);
        let grid = Array2::from_shape_fn((self.ny, self.nx), |(j, i)| vals[j * self.nx + i]);
        Ok((meshx, meshy, grid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_aspect_ratio() {
        let mesh = Mesh::from_bounds([0.0, 0.0, 4.0, 0.5], 160).unwrap();
        assert_eq!(mesh.nx, 160);
        assert_eq!(mesh.ny, 20);
        assert!((mesh.dx - 0.025).abs() < 1e-12);
        assert!((mesh.dy - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_mesh_cell_centres() {
        let mesh = Mesh::from_bounds([0.0, 0.0, 2.0, 1.0], 4).unwrap();
        assert!((mesh.x[0] - 0.25).abs() < 1e-12);
        assert!((mesh.x[3] - 1.75).abs() < 1e-12);
        assert!((mesh.y[1] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_locations_and_slice_agree() {
        let mesh = Mesh::from_bounds([0.0, 0.0, 3.0, 2.0], 6).unwrap();
        let locs = mesh.locations();
        assert_eq!(locs.dim(), (mesh.len(), 2));
        let vals = Array1::from_shape_fn(mesh.len(), |r| locs[[r, 0]] + 10.0 * locs[[r, 1]]);
        let (mx, my, grid) = mesh.slice(&vals).unwrap();
        for j in 0..mesh.ny {
            for i in 0..mesh.nx {
                assert!((grid[[j, i]] - (mx[[j, i]] + 10.0 * my[[j, i]])).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_slice_length_checked() {
        let mesh = Mesh::from_bounds([0.0, 0.0, 1.0, 1.0], 3).unwrap();
        assert!(mesh.slice(&Array1::zeros(5)).is_err());
    }

    #[test]
    fn test_degenerate_bounds_rejected() {
        assert!(Mesh::from_bounds([0.0, 0.0, 0.0, 1.0], 3).is_err());
        assert!(Mesh::from_bounds([0.0, 0.0, 1.0, 1.0], 0).is_err());
    }
}
