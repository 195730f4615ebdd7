// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Property-Based Tests (proptest) for geostat-types
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for geostat-types using proptest.
//!
//! Covers: Mesh construction invariants, Observations validation,
//! configuration serialization roundtrip.

use geostat_types::config::{FitConfig, GeostatConfig, McmcConfig};
use geostat_types::data::Observations;
use geostat_types::mesh::Mesh;
use ndarray::{Array1, Array2};
use proptest::prelude::*;

// ── Mesh Construction Invariants ─────────────────────────────────────

proptest! {
    /// Mesh dimensions match the locations array.
    #[test]
    fn mesh_dimensions_match(
        nx in 1usize..96,
        width in 0.5f64..10.0,
        height in 0.5f64..10.0,
    ) {
        let mesh = Mesh::from_bounds([0.0, 0.0, width, height], nx).unwrap();

        prop_assert_eq!(mesh.nx, nx);
        prop_assert!(mesh.ny >= 1);
        prop_assert_eq!(mesh.x.len(), nx);
        prop_assert_eq!(mesh.y.len(), mesh.ny);
        let locations = mesh.locations();
        prop_assert_eq!(locations.shape(), &[mesh.ny * nx, 2]);
    }

    /// Every cell centre lies strictly inside the bounds.
    #[test]
    fn mesh_centres_inside_bounds(
        nx in 1usize..64,
        x0 in -10.0f64..0.0,
        y0 in -10.0f64..0.0,
    ) {
        let (x1, y1) = (x0 + 4.0, y0 + 2.0);
        let mesh = Mesh::from_bounds([x0, y0, x1, y1], nx).unwrap();
        let locs = mesh.locations();
        for r in 0..locs.nrows() {
            prop_assert!(locs[[r, 0]] > x0 && locs[[r, 0]] < x1);
            prop_assert!(locs[[r, 1]] > y0 && locs[[r, 1]] < y1);
        }
    }

    /// x spacing is uniform and equals dx.
    #[test]
    fn mesh_uniform_spacing(nx in 2usize..64) {
        let mesh = Mesh::from_bounds([1.0, -5.0, 9.0, 5.0], nx).unwrap();
        for i in 1..nx {
            let delta = mesh.x[i] - mesh.x[i - 1];
            prop_assert!((delta - mesh.dx).abs() < 1e-12,
                "Non-uniform x spacing at {}: delta={}, dx={}", i, delta, mesh.dx);
        }
    }
}

// ── Observations Validation ──────────────────────────────────────────

proptest! {
    /// Matching shapes always validate.
    #[test]
    fn observations_accept_matching_shapes(n in 1usize..64, k in 1usize..5) {
        let locs = Array2::from_shape_fn((n, k), |(i, j)| (i * k + j) as f64);
        let vals = Array1::from_shape_fn(n, |i| i as f64 * 0.5);
        let obs = Observations::new(locs, vals).unwrap();
        prop_assert_eq!(obs.len(), n);
        prop_assert_eq!(obs.dims(), k);
    }

    /// Any length mismatch is rejected.
    #[test]
    fn observations_reject_length_mismatch(n in 2usize..64, delta in 1usize..5) {
        let locs = Array2::zeros((n, 2));
        let vals = Array1::zeros(n + delta);
        prop_assert!(Observations::new(locs, vals).is_err());
    }
}

// ── Config Roundtrip ─────────────────────────────────────────────────

proptest! {
    /// Fit and MCMC settings survive a JSON roundtrip.
    #[test]
    fn config_roundtrip(
        iters in 1usize..5000,
        step in 1e-4f64..1.0,
        blocks in 1usize..20,
        interval in 1usize..200,
    ) {
        let cfg = GeostatConfig {
            fit: FitConfig::default().with_iters(iters).with_step_size(step),
            mcmc: McmcConfig {
                samples: blocks * interval,
                burnin: interval,
                report_interval: interval,
                ..McmcConfig::default()
            },
            ..GeostatConfig::default()
        };
        prop_assert!(cfg.validate().is_ok());
        let json = serde_json::to_string(&cfg).unwrap();
        let back: GeostatConfig = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.fit.iters, iters);
        prop_assert!((back.fit.step_size - step).abs() < 1e-15);
        prop_assert_eq!(back.mcmc.samples, blocks * interval);
    }
}
