// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Parameters
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Model parameters, their bounds and the unconstrained ("underlying")
//! coordinates used by the optimiser and the sampler.
//!
//! Kernels, trends and metrics refer to parameters either by a fixed value
//! or by name. Every named use carries a bound; all uses of a name are merged
//! by [`ParameterSpace::check`].

use geostat_math::stats::{mean, percentile};
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A fixed value or a reference to a named model parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Fixed(f64),
    Named(String),
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Fixed(v)
    }
}

impl From<&str> for Param {
    fn from(name: &str) -> Self {
        Param::Named(name.to_string())
    }
}

impl From<String> for Param {
    fn from(name: String) -> Self {
        Param::Named(name)
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Fixed(v) => write!(f, "{v}"),
            Param::Named(name) => write!(f, "{name}"),
        }
    }
}

impl Param {
    pub fn name(&self) -> Option<&str> {
        match self {
            Param::Fixed(_) => None,
            Param::Named(name) => Some(name),
        }
    }

    /// Resolve against a parameter set.
    pub fn value(&self, params: &Parameters) -> GeostatResult<f64> {
        match self {
            Param::Fixed(v) => Ok(*v),
            Param::Named(name) => params.get(name).ok_or_else(|| {
                GeostatError::ParameterError(format!("Parameter `{name}` is missing"))
            }),
        }
    }

    /// Use as a positive parameter, `(0, ∞)`.
    pub fn positive(&self) -> Option<ParamRef> {
        self.with_bound(Bound::positive())
    }

    /// Use as an unbounded parameter.
    pub fn unbounded(&self) -> Option<ParamRef> {
        self.with_bound(Bound::unbounded())
    }

    /// Use as a parameter bounded to `(lo, hi)`.
    pub fn bounded(&self, lo: f64, hi: f64) -> Option<ParamRef> {
        self.with_bound(Bound { lo, hi })
    }

    fn with_bound(&self, bound: Bound) -> Option<ParamRef> {
        self.name().map(|name| ParamRef {
            name: name.to_string(),
            bound,
        })
    }
}

/// Resolve a list of parameters.
pub fn values(list: &[Param], params: &Parameters) -> GeostatResult<Vec<f64>> {
    list.iter().map(|p| p.value(params)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub lo: f64,
    pub hi: f64,
}

impl Bound {
    pub fn positive() -> Self {
        Bound {
            lo: 0.0,
            hi: f64::INFINITY,
        }
    }

    pub fn unbounded() -> Self {
        Bound {
            lo: f64::NEG_INFINITY,
            hi: f64::INFINITY,
        }
    }

    pub fn kind(&self) -> ParamKind {
        match (self.lo.is_finite(), self.hi.is_finite()) {
            (false, false) => ParamKind::Unbounded,
            (true, false) => ParamKind::LowerBounded,
            (false, true) => ParamKind::UpperBounded,
            (true, true) => ParamKind::Bounded,
        }
    }

    /// Surface value to the unconstrained coordinate.
    pub fn to_underlying(&self, v: f64) -> f64 {
        match self.kind() {
            ParamKind::Unbounded => v,
            ParamKind::LowerBounded => (v - self.lo).ln(),
            ParamKind::UpperBounded => -(self.hi - v).ln(),
            ParamKind::Bounded => {
                let t = (v - self.lo) / (self.hi - self.lo);
                (t / (1.0 - t)).ln()
            }
        }
    }

    /// Unconstrained coordinate back to the surface value.
    pub fn to_surface(&self, u: f64) -> f64 {
        match self.kind() {
            ParamKind::Unbounded => u,
            ParamKind::LowerBounded => self.lo + u.exp(),
            ParamKind::UpperBounded => self.hi - (-u).exp(),
            ParamKind::Bounded => self.lo + (self.hi - self.lo) / (1.0 + (-u).exp()),
        }
    }
}

/// Transform family implied by a [`Bound`]. `Bound::positive()` is
/// `LowerBounded` at zero (log transform).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Unbounded,
    LowerBounded,
    UpperBounded,
    Bounded,
}

/// One use of a named parameter together with the bound that use requires.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamRef {
    pub name: String,
    pub bound: Bound,
}

/// Parameter values by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    values: BTreeMap<String, f64>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Copy every value of `other` over this set.
    pub fn merge(&mut self, other: &Parameters) {
        for (k, v) in other.iter() {
            self.set(k, v);
        }
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let body: Vec<String> = self.iter().map(|(k, v)| format!("{k} {v:5.2}")).collect();
        write!(f, "[{}]", body.join(" "))
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Parameters {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Merged bounds of every named parameter a model uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSpace {
    bounds: BTreeMap<String, Bound>,
}

impl ParameterSpace {
    /// Merge all uses of each name (tightest bound wins) and check `values`.
    pub fn check(refs: &[ParamRef], values: &Parameters) -> GeostatResult<Self> {
        let mut bounds: BTreeMap<String, Bound> = BTreeMap::new();
        for r in refs {
            bounds
                .entry(r.name.clone())
                .and_modify(|b| {
                    b.lo = b.lo.max(r.bound.lo);
                    b.hi = b.hi.min(r.bound.hi);
                })
                .or_insert(r.bound);
        }
        for (name, b) in &bounds {
            if b.lo >= b.hi {
                return Err(GeostatError::ParameterError(format!(
                    "Conflicting bounds for parameter `{name}`"
                )));
            }
            let v = values.get(name).ok_or_else(|| {
                GeostatError::ParameterError(format!("Parameter `{name}` is missing"))
            })?;
            if !(b.lo <= v && v <= b.hi) {
                return Err(GeostatError::ParameterError(format!(
                    "Parameter `{name}` is out of bounds: {v} not in [{}, {}]",
                    b.lo, b.hi
                )));
            }
        }
        Ok(ParameterSpace { bounds })
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Names in coordinate order.
    pub fn names(&self) -> Vec<String> {
        self.bounds.keys().cloned().collect()
    }

    pub fn bound(&self, name: &str) -> Option<Bound> {
        self.bounds.get(name).copied()
    }

    pub fn to_underlying(&self, values: &Parameters) -> GeostatResult<Vec<f64>> {
        self.bounds
            .iter()
            .map(|(name, b)| {
                let v = values.get(name).ok_or_else(|| {
                    GeostatError::ParameterError(format!("Parameter `{name}` is missing"))
                })?;
                Ok(b.to_underlying(v))
            })
            .collect()
    }

    pub fn to_surface(&self, underlying: &[f64]) -> Parameters {
        debug_assert_eq!(underlying.len(), self.bounds.len());
        self.bounds
            .iter()
            .zip(underlying)
            .map(|((name, b), &u)| (name.clone(), b.to_surface(u)))
            .collect()
    }
}

/// Posterior draws, one row per sample and one column per parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSamples {
    pub names: Vec<String>,
    pub draws: Array2<f64>,
}

impl ParameterSamples {
    pub fn len(&self) -> usize {
        self.draws.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.draws.nrows() == 0
    }

    fn column(&self, j: usize) -> Vec<f64> {
        self.draws.column(j).to_vec()
    }

    fn reduce(&self, f: impl Fn(&[f64]) -> f64) -> Parameters {
        self.names
            .iter()
            .enumerate()
            .map(|(j, name)| (name.clone(), f(&self.column(j))))
            .collect()
    }

    pub fn median(&self) -> Parameters {
        self.percentile(50.0)
    }

    pub fn mean(&self) -> Parameters {
        self.reduce(mean)
    }

    pub fn percentile(&self, p: f64) -> Parameters {
        self.reduce(|col| percentile(col, p))
    }

    pub fn draw(&self, i: usize) -> Option<Parameters> {
        if i >= self.len() {
            return None;
        }
        Some(
            self.names
                .iter()
                .enumerate()
                .map(|(j, name)| (name.clone(), self.draws[[i, j]]))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_param_resolution() {
        let p = Parameters::new().with("range", 2.0);
        assert_eq!(Param::from(1.5).value(&p).unwrap(), 1.5);
        assert_eq!(Param::from("range").value(&p).unwrap(), 2.0);
        assert!(Param::from("sill").value(&p).is_err());
        assert!(Param::from(3.0).positive().is_none());
    }

    #[test]
    fn test_bound_transforms_roundtrip() {
        let bounds = [
            Bound::positive(),
            Bound::unbounded(),
            Bound { lo: 0.0, hi: 2.0 },
            Bound {
                lo: f64::NEG_INFINITY,
                hi: 5.0,
            },
        ];
        for b in bounds {
            for &v in &[0.3, 1.0, 1.7] {
                let back = b.to_surface(b.to_underlying(v));
                assert!((back - v).abs() < 1e-12, "{b:?}: {v} -> {back}");
            }
        }
        assert_eq!(Bound::positive().kind(), ParamKind::LowerBounded);
        assert!((Bound::positive().to_underlying(1.0)).abs() < 1e-15);
        assert!((Bound { lo: 0.0, hi: 2.0 }.to_underlying(1.0)).abs() < 1e-15);
    }

    #[test]
    fn test_check_merges_bounds() {
        let refs = vec![
            Param::from("gamma").positive().unwrap(),
            Param::from("gamma").bounded(0.0, 2.0).unwrap(),
            Param::from("beta").unbounded().unwrap(),
        ];
        let values = Parameters::new().with("gamma", 1.0).with("beta", -3.0);
        let space = ParameterSpace::check(&refs, &values).unwrap();
        assert_eq!(space.names(), vec!["beta".to_string(), "gamma".to_string()]);
        assert_eq!(space.bound("gamma"), Some(Bound { lo: 0.0, hi: 2.0 }));
    }

    #[test]
    fn test_check_errors() {
        let conflicting = vec![
            Param::from("a").bounded(0.0, 1.0).unwrap(),
            Param::from("a").bounded(2.0, 3.0).unwrap(),
        ];
        let v = Parameters::new().with("a", 0.5);
        assert!(ParameterSpace::check(&conflicting, &v).is_err());

        let refs = vec![Param::from("a").positive().unwrap()];
        assert!(ParameterSpace::check(&refs, &Parameters::new()).is_err());
        assert!(ParameterSpace::check(&refs, &Parameters::new().with("a", -1.0)).is_err());
    }

    #[test]
    fn test_space_underlying_surface_roundtrip() {
        let refs = vec![
            Param::from("sill").positive().unwrap(),
            Param::from("w").unbounded().unwrap(),
        ];
        let values = Parameters::new().with("sill", 4.0).with("w", -0.5);
        let space = ParameterSpace::check(&refs, &values).unwrap();
        let up = space.to_underlying(&values).unwrap();
        assert!((up[0] - 4.0_f64.ln()).abs() < 1e-12);
        assert_eq!(space.to_surface(&up), values);
    }

    #[test]
    fn test_samples_reductions() {
        let s = ParameterSamples {
            names: vec!["a".into(), "b".into()],
            draws: array![[1.0, 10.0], [2.0, 20.0], [3.0, 60.0]],
        };
        assert_eq!(s.median().get("a"), Some(2.0));
        assert_eq!(s.mean().get("b"), Some(30.0));
        assert_eq!(s.draw(2).unwrap().get("b"), Some(60.0));
        assert!(s.draw(3).is_none());
        assert!((s.percentile(100.0).get("b").unwrap() - 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_display() {
        let p = Parameters::new().with("range", 0.333).with("sill", 1.0);
        assert_eq!(p.to_string(), "[range  0.33 sill  1.00]");
    }
}
