// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Map Projection
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Albers equal-area conic projection on the GRS80 ellipsoid.
//!
//! Forward: Snyder (1987) eqs. 14-1 to 14-6 with 3-12 and 3-13.
//! Inverse: eqs. 14-8 to 14-11, latitude from q by iteration (3-16).

use geostat_types::config::{DistanceUnits, ProjectionConfig};
use geostat_types::constants::{GRS80_A, GRS80_INV_F, METERS_PER_KILOMETER};
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::Array2;

const INVERSE_MAX_ITER: usize = 25;
const INVERSE_TOL: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct AlbersEqualArea {
    a: f64,
    e: f64,
    e2: f64,
    lon0: f64,
    n: f64,
    c: f64,
    rho0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl AlbersEqualArea {
    /// Build from standard parallels, origin and false origin (degrees, metres).
    pub fn new(
        lat1_deg: f64,
        lat2_deg: f64,
        lat0_deg: f64,
        lon0_deg: f64,
        false_easting: f64,
        false_northing: f64,
    ) -> GeostatResult<Self> {
        if (lat1_deg + lat2_deg).abs() < 1e-10 {
            return Err(GeostatError::Projection(
                "standard parallels must not be symmetric about the equator".to_string(),
            ));
        }
        let a = GRS80_A;
        let f = 1.0 / GRS80_INV_F;
        let e2 = 2.0 * f - f * f;
        let e = e2.sqrt();

        let (phi1, phi2, phi0) = (
            lat1_deg.to_radians(),
            lat2_deg.to_radians(),
            lat0_deg.to_radians(),
        );
        let m1 = m_of(phi1, e2);
        let m2 = m_of(phi2, e2);
        let q1 = q_of(phi1, e, e2);
        let q2 = q_of(phi2, e, e2);
        let q0 = q_of(phi0, e, e2);

        let n = if (phi1 - phi2).abs() < 1e-12 {
            phi1.sin()
        } else {
            (m1 * m1 - m2 * m2) / (q2 - q1)
        };
        let c = m1 * m1 + n * q1;
        let rho0 = a * (c - n * q0).max(0.0).sqrt() / n;

        Ok(AlbersEqualArea {
            a,
            e,
            e2,
            lon0: lon0_deg.to_radians(),
            n,
            c,
            rho0,
            false_easting,
            false_northing,
        })
    }

    /// Named presets. Only `EPSG:3310` (NAD83 / California Albers) is known.
    pub fn epsg(code: &str) -> GeostatResult<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "EPSG:3310" | "3310" => Self::new(34.0, 40.5, 0.0, -120.0, 0.0, -4_000_000.0),
            other => Err(GeostatError::Projection(format!(
                "unsupported projection '{other}', expected EPSG:3310"
            ))),
        }
    }

    /// Geographic degrees to projected metres.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let phi = lat_deg.to_radians();
        let q = q_of(phi, self.e, self.e2);
        let rho = self.a * (self.c - self.n * q).max(0.0).sqrt() / self.n;
        let theta = self.n * wrap_pi(lon_deg.to_radians() - self.lon0);
        let x = rho * theta.sin() + self.false_easting;
        let y = self.rho0 - rho * theta.cos() + self.false_northing;
        (x, y)
    }

    /// Projected metres to geographic degrees.
    pub fn inverse(&self, x_m: f64, y_m: f64) -> (f64, f64) {
        let x = x_m - self.false_easting;
        let y = self.rho0 - (y_m - self.false_northing);
        let sign = self.n.signum();
        let rho = (x * x + y * y).sqrt() * sign;
        let theta = (x * sign).atan2(y * sign);
        let q = (self.c - (rho * self.n / self.a).powi(2)) / self.n;

        let mut phi = (q / 2.0).clamp(-1.0, 1.0).asin();
        for _ in 0..INVERSE_MAX_ITER {
            let s = phi.sin();
            let es = self.e * s;
            let one_minus = 1.0 - self.e2 * s * s;
            let delta = one_minus * one_minus / (2.0 * phi.cos())
                * (q / (1.0 - self.e2) - s / one_minus
                    + (1.0 / (2.0 * self.e)) * ((1.0 - es) / (1.0 + es)).ln());
            phi += delta;
            if delta.abs() < INVERSE_TOL {
                break;
            }
        }
        let lon = self.lon0 + theta / self.n;
        (wrap_pi(lon).to_degrees(), phi.to_degrees())
    }
}

fn m_of(phi: f64, e2: f64) -> f64 {
    let s = phi.sin();
    phi.cos() / (1.0 - e2 * s * s).sqrt()
}

fn q_of(phi: f64, e: f64, e2: f64) -> f64 {
    let s = phi.sin();
    let es = e * s;
    (1.0 - e2) * (s / (1.0 - e2 * s * s) - (1.0 / (2.0 * e)) * ((1.0 - es) / (1.0 + es)).ln())
}

fn wrap_pi(angle: f64) -> f64 {
    use std::f64::consts::PI;
    let mut a = angle;
    while a > PI {
        a -= 2.0 * PI;
    }
    while a < -PI {
        a += 2.0 * PI;
    }
    a
}

/// Lon/lat(/depth) → planar coordinates in the configured units.
#[derive(Debug, Clone)]
pub struct Projector {
    pub albers: AlbersEqualArea,
    pub units: DistanceUnits,
}

impl Projector {
    pub fn from_config(config: &ProjectionConfig) -> GeostatResult<Self> {
        Ok(Projector {
            albers: AlbersEqualArea::epsg(&config.epsg)?,
            units: config.units,
        })
    }

    fn unit_scale(&self) -> f64 {
        match self.units {
            DistanceUnits::Meters => 1.0,
            DistanceUnits::Kilometers => 1.0 / METERS_PER_KILOMETER,
        }
    }

    /// Project a single lon/lat pair into the configured units.
    pub fn project_point(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = self.albers.forward(lon, lat);
        let s = self.unit_scale();
        (x * s, y * s)
    }

    /// Project columns 0 and 1 (lon, lat). A third column holds depth in
    /// metres and is rescaled to the output units.
    pub fn project(&self, locs: &Array2<f64>) -> GeostatResult<Array2<f64>> {
        let k = locs.ncols();
        if !(2..=3).contains(&k) {
            return Err(GeostatError::shape("Projector::project", "2 or 3 columns", k));
        }
        let s = self.unit_scale();
        let mut out = Array2::zeros(locs.raw_dim());
        for (i, row) in locs.outer_iter().enumerate() {
            let (x, y) = self.albers.forward(row[0], row[1]);
            out[[i, 0]] = x * s;
            out[[i, 1]] = y * s;
            if k == 3 {
                out[[i, 2]] = row[2] * s;
            }
        }
        Ok(out)
    }
}
