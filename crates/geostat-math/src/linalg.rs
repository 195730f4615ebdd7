// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Linear Algebra
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Dense linear algebra for covariance matrices.
//!
//! Cholesky factorisation and triangular solves for symmetric positive
//! definite systems, LU with partial pivoting for the indefinite kriging
//! systems, and the multivariate normal log density.

use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::f64::consts::PI;

/// Lower-triangular Cholesky factor L with L Lᵀ = A.
///
/// Only the lower triangle of `a` is read.
pub fn cholesky(a: &Array2<f64>) -> GeostatResult<Array2<f64>> {
    let (n, m) = a.dim();
    if n != m {
        return Err(GeostatError::shape(
            "cholesky",
            format!("[{n}, {n}]"),
            format!("[{n}, {m}]"),
        ));
    }

    let mut l = Array2::zeros((n, n));
    for j in 0..n {
        let mut diag = a[[j, j]];
        for k in 0..j {
            diag -= l[[j, k]] * l[[j, k]];
        }
        if diag <= 0.0 || !diag.is_finite() {
            return Err(GeostatError::NotPositiveDefinite { size: n });
        }
        let ljj = diag.sqrt();
        l[[j, j]] = ljj;

        for i in (j + 1)..n {
            let mut sum = a[[i, j]];
            for k in 0..j {
                sum -= l[[i, k]] * l[[j, k]];
            }
            l[[i, j]] = sum / ljj;
        }
    }
    Ok(l)
}

/// Solve L y = b for lower-triangular L.
pub fn forward_substitute(l: &Array2<f64>, b: ArrayView1<'_, f64>) -> Array1<f64> {
    let n = b.len();
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[[i, k]] * y[k];
        }
        y[i] = sum / l[[i, i]];
    }
    y
}

/// Solve Lᵀ x = y for lower-triangular L.
pub fn back_substitute(l: &Array2<f64>, y: ArrayView1<'_, f64>) -> Array1<f64> {
    let n = y.len();
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l[[k, i]] * x[k];
        }
        x[i] = sum / l[[i, i]];
    }
    x
}

/// Solve A x = b given the Cholesky factor of A.
pub fn cholesky_solve(l: &Array2<f64>, b: ArrayView1<'_, f64>) -> Array1<f64> {
    let y = forward_substitute(l, b);
    back_substitute(l, y.view())
}

/// Solve A X = B column by column given the Cholesky factor of A.
pub fn cholesky_solve_matrix(l: &Array2<f64>, b: &Array2<f64>) -> Array2<f64> {
    let mut x = Array2::zeros(b.raw_dim());
    for (col_in, mut col_out) in b.axis_iter(Axis(1)).zip(x.axis_iter_mut(Axis(1))) {
        col_out.assign(&cholesky_solve(l, col_in));
    }
    x
}

/// log det A = 2 Σ ln Lᵢᵢ.
pub fn log_det_from_cholesky(l: &Array2<f64>) -> f64 {
    2.0 * l.diag().iter().map(|d| d.ln()).sum::<f64>()
}

/// Solve the general square system A X = B by Gaussian elimination with
/// partial pivoting.
pub fn lu_solve(a: &Array2<f64>, b: &Array2<f64>) -> GeostatResult<Array2<f64>> {
    let (n, m) = a.dim();
    if n != m {
        return Err(GeostatError::shape(
            "lu_solve",
            format!("[{n}, {n}]"),
            format!("[{n}, {m}]"),
        ));
    }
    if b.nrows() != n {
        return Err(GeostatError::shape("lu_solve right-hand side", n, b.nrows()));
    }

    let mut lu = a.clone();
    let mut x = b.clone();
    let scale = a.iter().fold(0.0_f64, |acc, v| acc.max(v.abs())).max(1.0);

    for col in 0..n {
        let mut pivot = col;
        let mut best = lu[[col, col]].abs();
        for row in (col + 1)..n {
            let v = lu[[row, col]].abs();
            if v > best {
                best = v;
                pivot = row;
            }
        }
        if best <= 1e-14 * scale || !best.is_finite() {
            return Err(GeostatError::LinAlg(format!(
                "singular matrix: pivot {best:.3e} in column {col}"
            )));
        }
        if pivot != col {
            for k in 0..n {
                lu.swap([col, k], [pivot, k]);
            }
            for k in 0..x.ncols() {
                x.swap([col, k], [pivot, k]);
            }
        }

        let diag = lu[[col, col]];
        for row in (col + 1)..n {
            let factor = lu[[row, col]] / diag;
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                lu[[row, k]] -= factor * lu[[col, k]];
            }
            for k in 0..x.ncols() {
                x[[row, k]] -= factor * x[[col, k]];
            }
        }
    }

    for k in 0..x.ncols() {
        for row in (0..n).rev() {
            let mut sum = x[[row, k]];
            for j in (row + 1)..n {
                sum -= lu[[row, j]] * x[[j, k]];
            }
            x[[row, k]] = sum / lu[[row, row]];
        }
    }
    Ok(x)
}

/// Log density of a multivariate normal:
/// −½ (log det(2π C) + (u − m)ᵀ C⁻¹ (u − m)).
pub fn mvn_log_pdf(
    u: ArrayView1<'_, f64>,
    m: ArrayView1<'_, f64>,
    cov: &Array2<f64>,
) -> GeostatResult<f64> {
    let n = u.len();
    if m.len() != n || cov.nrows() != n {
        return Err(GeostatError::shape(
            "mvn_log_pdf",
            n,
            format!("mean {} / cov {}", m.len(), cov.nrows()),
        ));
    }
    let l = cholesky(cov)?;
    let diff = &u - &m;
    let z = forward_substitute(&l, diff.view());
    let quad = z.dot(&z);
    let logdet = n as f64 * (2.0 * PI).ln() + log_det_from_cholesky(&l);
    Ok(-0.5 * (logdet + quad))
}
