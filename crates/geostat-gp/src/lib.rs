// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Gaussian Processes
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Gaussian-process models of spatial data.
//!
//! Kernels and trends are composed into a [`gp::Gp`]; a [`model::Model`]
//! binds it to parameter values and fits, samples, generates and predicts.
//! [`spatial::SpatialGp`] packages a projected stationary GP with trend and
//! nugget for lon/lat data.

pub mod featurizer;
pub mod gp;
pub mod kernel;
pub mod mean;
pub mod metric;
pub mod model;
pub mod param;
pub mod spatial;
