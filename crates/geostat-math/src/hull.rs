// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Convex Hull
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Planar convex hull and point containment.

use std::cmp::Ordering;

const EPS: f64 = 1e-12;

fn cross(o: [f64; 2], a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - o[0]) * (b[1] - o[1]) - (a[1] - o[1]) * (b[0] - o[0])
}

/// Convex hull by Andrew's monotone chain.
///
/// Vertices are counter-clockwise without repeated or collinear points.
/// Fewer than three distinct points, or all points collinear, give a hull
/// of one or two vertices.
pub fn convex_hull(points: &[[f64; 2]]) -> Vec<[f64; 2]> {
    let mut pts: Vec<[f64; 2]> = points
        .iter()
        .copied()
        .filter(|p| p[0].is_finite() && p[1].is_finite())
        .collect();
    pts.sort_by(|a, b| {
        a[0].partial_cmp(&b[0])
            .unwrap_or(Ordering::Equal)
            .then(a[1].partial_cmp(&b[1]).unwrap_or(Ordering::Equal))
    });
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<[f64; 2]> = Vec::with_capacity(pts.len());
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<[f64; 2]> = Vec::with_capacity(pts.len());
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn on_segment(a: [f64; 2], b: [f64; 2], p: [f64; 2]) -> bool {
    let scale = 1.0 + (b[0] - a[0]).abs().max((b[1] - a[1]).abs());
    if cross(a, b, p).abs() > EPS * scale * scale {
        return false;
    }
    let (lo_x, hi_x) = (a[0].min(b[0]), a[0].max(b[0]));
    let (lo_y, hi_y) = (a[1].min(b[1]), a[1].max(b[1]));
    p[0] >= lo_x - EPS * scale
        && p[0] <= hi_x + EPS * scale
        && p[1] >= lo_y - EPS * scale
        && p[1] <= hi_y + EPS * scale
}

/// Containment test for a counter-clockwise convex polygon, boundary
/// included. Hulls of one or two vertices contain only their point or
/// segment.
pub fn point_in_convex_polygon(hull: &[[f64; 2]], p: [f64; 2]) -> bool {
    match hull.len() {
        0 => false,
        1 => (hull[0][0] - p[0]).abs() <= EPS && (hull[0][1] - p[1]).abs() <= EPS,
        2 => on_segment(hull[0], hull[1], p),
        n => (0..n).all(|i| {
            let a = hull[i];
            let b = hull[(i + 1) % n];
            let scale = 1.0 + (b[0] - a[0]).abs().max((b[1] - a[1]).abs());
            cross(a, b, p) >= -EPS * scale * scale
        }),
    }
}
