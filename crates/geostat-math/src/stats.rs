// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Statistics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Descriptive statistics and binning.

use geostat_types::error::{GeostatError, GeostatResult};

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (ddof = 0, numpy default).
pub fn std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mu = mean(values);
    let var = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

fn central_moment(values: &[f64], order: i32) -> f64 {
    let mu = mean(values);
    values.iter().map(|v| (v - mu).powi(order)).sum::<f64>() / values.len() as f64
}

/// Biased sample skewness `m₃ / m₂^{3/2}`.
pub fn skewness(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m2 = central_moment(values, 2);
    if m2 == 0.0 {
        return f64::NAN;
    }
    central_moment(values, 3) / m2.powf(1.5)
}

/// Biased excess kurtosis `m₄ / m₂² − 3` (Fisher).
pub fn kurtosis(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m2 = central_moment(values, 2);
    if m2 == 0.0 {
        return f64::NAN;
    }
    central_moment(values, 4) / (m2 * m2) - 3.0
}

/// Quantile with linear interpolation between order statistics
/// (`numpy.quantile` default method). `q` in [0, 1].
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Percentile, `p` in [0, 100].
pub fn percentile(values: &[f64], p: f64) -> f64 {
    quantile(values, p / 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Count,
}

/// Result of `binned_statistic`.
#[derive(Debug, Clone)]
pub struct Binned {
    pub statistic: Vec<f64>,
    /// Bin edges, length `bins + 1`.
    pub edges: Vec<f64>,
}

impl Binned {
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }
}

/// Equal-width binning of `y` by `x`, like `scipy.stats.binned_statistic`.
///
/// Bins span `range` (default: min..max of `x`); the last bin is closed on
/// the right and points outside the range are ignored. Empty bins have a
/// NaN mean and a zero count.
pub fn binned_statistic(
    x: &[f64],
    y: &[f64],
    bins: usize,
    range: Option<(f64, f64)>,
    statistic: Statistic,
) -> GeostatResult<Binned> {
    if x.len() != y.len() {
        return Err(GeostatError::shape("binned_statistic", x.len(), y.len()));
    }
    if bins == 0 {
        return Err(GeostatError::ConfigError(
            "binned_statistic requires bins >= 1".to_string(),
        ));
    }
    if x.is_empty() && range.is_none() {
        return Err(GeostatError::ConfigError(
            "binned_statistic requires data or an explicit range".to_string(),
        ));
    }

    let (mut lo, mut hi) = range.unwrap_or_else(|| {
        let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (lo, hi)
    });
    if !lo.is_finite() || !hi.is_finite() || hi < lo {
        return Err(GeostatError::ConfigError(format!(
            "binned_statistic range is invalid: [{lo}, {hi}]"
        )));
    }
    if hi == lo {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + i as f64 * width).collect();

    let mut sums = vec![0.0; bins];
    let mut counts = vec![0usize; bins];
    for (&xi, &yi) in x.iter().zip(y) {
        if xi < lo || xi > hi {
            continue;
        }
        let idx = (((xi - lo) / width).floor() as usize).min(bins - 1);
        sums[idx] += yi;
        counts[idx] += 1;
    }

    let stat = match statistic {
        Statistic::Count => counts.iter().map(|&c| c as f64).collect(),
        Statistic::Mean => sums
            .iter()
            .zip(&counts)
            .map(|(&s, &c)| if c > 0 { s / c as f64 } else { f64::NAN })
            .collect(),
    };

    Ok(Binned {
        statistic: stat,
        edges,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&v) - 5.0).abs() < 1e-12);
        assert!((std(&v) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_higher_moments() {
        let symmetric = [-2.0, -1.0, 0.0, 1.0, 2.0];
        assert!(skewness(&symmetric).abs() < 1e-12);
        // m2 = 2, m4 = 6.8
        assert!((kurtosis(&symmetric) - (6.8 / 4.0 - 3.0)).abs() < 1e-12);
        let skewed = [0.0, 0.0, 0.0, 1.0];
        assert!(skewness(&skewed) > 0.0);
        assert!(kurtosis(&[1.0, 1.0]).is_nan());
    }

    #[test]
    fn test_quantile_interpolates() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&v, 0.5) - 2.5).abs() < 1e-12);
        assert!((percentile(&v, 0.0) - 1.0).abs() < 1e-12);
        assert!((percentile(&v, 100.0) - 4.0).abs() < 1e-12);
        assert!((quantile(&[4.0, 1.0, 3.0, 2.0], 0.25) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_binned_mean_and_count() {
        let x = [0.0, 0.5, 1.0, 1.5, 2.0];
        let y = [1.0, 3.0, 10.0, 20.0, 30.0];
        let means = binned_statistic(&x, &y, 2, None, Statistic::Mean).unwrap();
        assert_eq!(means.edges.len(), 3);
        assert!((means.statistic[0] - 2.0).abs() < 1e-12);
        // 1.0 falls into the upper bin; 2.0 sits on the closed right edge.
        assert!((means.statistic[1] - 20.0).abs() < 1e-12);

        let counts = binned_statistic(&x, &y, 2, None, Statistic::Count).unwrap();
        assert_eq!(counts.statistic, vec![2.0, 3.0]);
        assert_eq!(counts.centers(), vec![0.5, 1.5]);
    }

    #[test]
    fn test_binned_range_drops_outliers_and_marks_empty() {
        let x = [0.1, 0.2, 5.0];
        let y = [1.0, 2.0, 100.0];
        let b = binned_statistic(&x, &y, 4, Some((0.0, 2.0)), Statistic::Mean).unwrap();
        assert!((b.statistic[0] - 1.5).abs() < 1e-12);
        assert!(b.statistic[1].is_nan());
        assert!(b.statistic[3].is_nan());
    }
}
