// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Diagonal jitter callers may add to near-singular covariance matrices.
pub const JITTER: f64 = 1e-6;

/// Adam first-moment decay (Keras default).
pub const ADAM_BETA1: f64 = 0.9;

/// Adam second-moment decay (Keras default).
pub const ADAM_BETA2: f64 = 0.999;

/// Adam denominator epsilon (Keras default).
pub const ADAM_EPSILON: f64 = 1e-7;

/// Central finite-difference step on underlying (unconstrained) parameters.
pub const FD_STEP: f64 = 1e-5;

/// Lower bound for every fitted variogram parameter.
pub const VARIOGRAM_PARAM_FLOOR: f64 = 1e-6;

/// Number of progress blocks a fit is split into.
pub const FIT_REPORT_BLOCKS: usize = 10;

pub const METERS_PER_KILOMETER: f64 = 1000.0;

/// GRS80 semi-major axis (m), used by NAD83.
pub const GRS80_A: f64 = 6_378_137.0;

/// GRS80 inverse flattening.
pub const GRS80_INV_F: f64 = 298.257_222_101;
