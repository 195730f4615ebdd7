// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Distance
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Pairwise distances between location sets.
//!
//! Conventions follow `scipy.spatial.distance`: `cdist` is the full
//! [n1, n2] matrix, `pdist` the condensed upper triangle (i < j, row-major).

use ndarray::{Array1, Array2, Array3, ArrayView2};

/// Squared coordinate differences per axis, shape [n1, n2, k].
pub fn per_axis_dist2(x1: ArrayView2<'_, f64>, x2: ArrayView2<'_, f64>) -> Array3<f64> {
    let (n1, k) = x1.dim();
    let n2 = x2.nrows();
    debug_assert_eq!(x2.ncols(), k, "per_axis_dist2 axis mismatch");
    Array3::from_shape_fn((n1, n2, k), |(a, b, c)| {
        let d = x1[[a, c]] - x2[[b, c]];
        d * d
    })
}

/// Euclidean distance matrix [n1, n2].
pub fn cdist(x1: ArrayView2<'_, f64>, x2: ArrayView2<'_, f64>) -> Array2<f64> {
    let k = x1.ncols();
    debug_assert_eq!(x2.ncols(), k, "cdist axis mismatch");
    Array2::from_shape_fn((x1.nrows(), x2.nrows()), |(a, b)| {
        let mut s = 0.0;
        for c in 0..k {
            let d = x1[[a, c]] - x2[[b, c]];
            s += d * d;
        }
        s.sqrt()
    })
}

/// Condensed Euclidean distances for all pairs i < j, length n(n-1)/2.
pub fn pdist(x: ArrayView2<'_, f64>) -> Array1<f64> {
    let n = x.nrows();
    let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let mut s = 0.0;
            for c in 0..x.ncols() {
                let d = x[[i, c]] - x[[j, c]];
                s += d * d;
            }
            out.push(s.sqrt());
        }
    }
    Array1::from_vec(out)
}

/// Check that `m` is a square matrix satisfying the triangle inequality:
/// it must equal (within tolerance) its one-step shortest-path closure
/// `min_i (m[a, i] + m[i, b])`.
pub fn is_distance_matrix(m: &Array2<f64>) -> bool {
    let (n, n2) = m.dim();
    if n != n2 {
        return false;
    }
    for a in 0..n {
        for b in 0..n {
            let mut best = f64::INFINITY;
            for i in 0..n {
                best = best.min(m[[a, i]] + m[[i, b]]);
            }
            let tol = 1e-8 + 1e-5 * best.abs();
            if (best - m[[a, b]]).abs() > tol {
                return false;
            }
        }
    }
    true
}
