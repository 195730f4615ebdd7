// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Numerical building blocks shared by the GP and kriging crates.

pub mod distance;
pub mod grid;
pub mod hull;
pub mod linalg;
pub mod optim;
pub mod projection;
pub mod special;
pub mod stats;
