//! Error function.
//!
//! Chebyshev fit from Numerical Recipes (erfcc, §6.2), fractional error
//! below 1.2e-7 everywhere. Used by the integrated squared-exponential
//! kernel.

/// Complementary error function erfc(x).
pub fn erfc(x: f64) -> f64 {
    let z = x.abs();
    let t = 1.0 / (1.0 + 0.5 * z);

    let poly = -1.265_512_23
        + t * (1.000_023_68
            + t * (0.374_091_96
                + t * (0.096_784_18
                    + t * (-0.186_288_06
                        + t * (0.278_868_07
                            + t * (-1.135_203_98
                                + t * (1.488_515_87
                                    + t * (-0.822_152_23 + t * 0.170_872_77))))))));

    let ans = t * (-z * z + poly).exp();
    if x >= 0.0 {
        ans
    } else {
        2.0 - ans
    }
}

/// Error function erf(x).
///
/// Matches `scipy.special.erf(x)` to ~1e-7.
pub fn erf(x: f64) -> f64 {
    1.0 - erfc(x)
}
