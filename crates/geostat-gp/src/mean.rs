// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Trends
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Mean functions of a Gaussian process.

use crate::featurizer::Featurize;
use crate::param::{values, Param, ParamRef, Parameters};
use geostat_types::error::{GeostatError, GeostatResult};
use ndarray::{Array1, ArrayView2, Axis};
use std::ops::Add;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub enum Trend {
    #[default]
    Zero,
    /// `F β` with unbounded coefficients.
    Linear {
        featurizer: Arc<dyn Featurize>,
        beta: Vec<Param>,
    },
    Sum(Vec<Trend>),
    /// `Σ_c W[cat, c] mᶜ(x)`.
    Mix {
        inputs: Vec<Trend>,
        weights: Vec<Vec<Param>>,
    },
    /// Input `c` supplies the mean of category `c`.
    Mux { inputs: Vec<Trend> },
}

impl Trend {
    pub fn linear<P: Into<Param>>(featurizer: impl Featurize + 'static, beta: Vec<P>) -> Self {
        Trend::Linear {
            featurizer: Arc::new(featurizer),
            beta: beta.into_iter().map(Into::into).collect(),
        }
    }

    pub fn mix(inputs: Vec<Trend>, weights: Vec<Vec<Param>>) -> Self {
        Trend::Mix { inputs, weights }
    }

    pub fn mux(inputs: Vec<Trend>) -> Self {
        Trend::Mux { inputs }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Trend::Zero)
    }

    pub fn vars(&self) -> Vec<ParamRef> {
        match self {
            Trend::Zero => Vec::new(),
            Trend::Linear { beta, .. } => beta.iter().filter_map(Param::unbounded).collect(),
            Trend::Sum(inputs) | Trend::Mux { inputs } => {
                inputs.iter().flat_map(Trend::vars).collect()
            }
            Trend::Mix { inputs, weights } => weights
                .iter()
                .flatten()
                .filter_map(Param::unbounded)
                .chain(inputs.iter().flat_map(Trend::vars))
                .collect(),
        }
    }

    pub fn report(&self, params: &Parameters) -> String {
        match self {
            Trend::Sum(inputs) | Trend::Mux { inputs } | Trend::Mix { inputs, .. } => inputs
                .iter()
                .map(|t| t.report(params))
                .collect::<Vec<_>>()
                .join(" "),
            _ => {
                let body: Vec<String> = self
                    .vars()
                    .iter()
                    .map(|v| match params.get(&v.name) {
                        Some(x) => format!("{} {x:4.2}", v.name),
                        None => format!("{} ?", v.name),
                    })
                    .collect();
                format!("[{}]", body.join(", "))
            }
        }
    }

    /// Mean at each location `[N]`.
    pub fn evaluate(
        &self,
        locs: ArrayView2<'_, f64>,
        cats: &[usize],
        params: &Parameters,
    ) -> GeostatResult<Array1<f64>> {
        let n = locs.nrows();
        match self {
            Trend::Zero => Ok(Array1::zeros(n)),
            Trend::Linear { featurizer, beta } => {
                let f = featurizer.features(locs)?;
                let beta = Array1::from_vec(values(beta, params)?);
                if f.ncols() != beta.len() {
                    return Err(GeostatError::shape("trend coefficients", f.ncols(), beta.len()));
                }
                Ok(f.dot(&beta))
            }
            Trend::Sum(inputs) => {
                let mut out = Array1::zeros(n);
                for t in inputs {
                    out += &t.evaluate(locs, cats, params)?;
                }
                Ok(out)
            }
            Trend::Mix { inputs, weights } => {
                check_cats(cats, weights.len(), "Mix trend")?;
                let mut out = Array1::zeros(n);
                for (c, t) in inputs.iter().enumerate() {
                    let m = t.evaluate(locs, cats, params)?;
                    for a in 0..n {
                        let row = &weights[cats[a]];
                        if row.len() != inputs.len() {
                            return Err(GeostatError::ConfigError(format!(
                                "Mix weight row {} has {} entries for {} inputs",
                                cats[a],
                                row.len(),
                                inputs.len()
                            )));
                        }
                        out[a] += row[c].value(params)? * m[a];
                    }
                }
                Ok(out)
            }
            Trend::Mux { inputs } => {
                check_cats(cats, inputs.len(), "Mux trend")?;
                let mut out = Array1::zeros(n);
                for (c, t) in inputs.iter().enumerate() {
                    let idx: Vec<usize> = (0..n).filter(|&a| cats[a] == c).collect();
                    if idx.is_empty() {
                        continue;
                    }
                    let sub = locs.select(Axis(0), &idx);
                    let sub_cats = vec![c; idx.len()];
                    let m = t.evaluate(sub.view(), &sub_cats, params)?;
                    for (i, &a) in idx.iter().enumerate() {
                        out[a] = m[i];
                    }
                }
                Ok(out)
            }
        }
    }
}

fn check_cats(cats: &[usize], limit: usize, what: &str) -> GeostatResult<()> {
    match cats.iter().copied().max() {
        Some(m) if m >= limit => Err(GeostatError::ConfigError(format!(
            "{what}: category {m} out of range, {limit} available"
        ))),
        _ => Ok(()),
    }
}

impl Add for Trend {
    type Output = Trend;

    fn add(self, other: Trend) -> Trend {
        match (self, other) {
            (Trend::Zero, t) | (t, Trend::Zero) => t,
            (Trend::Sum(mut a), Trend::Sum(b)) => {
                a.extend(b);
                Trend::Sum(a)
            }
            (Trend::Sum(mut a), t) => {
                a.push(t);
                Trend::Sum(a)
            }
            (t, Trend::Sum(mut b)) => {
                b.insert(0, t);
                Trend::Sum(b)
            }
            (a, b) => Trend::Sum(vec![a, b]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::featurizer::Featurizer;
    use ndarray::array;

    fn affine() -> Trend {
        Trend::linear(Featurizer::new(|x| vec![1.0, x[0]]), vec!["b0", "b1"])
    }

    #[test]
    fn test_linear_trend() {
        let p = Parameters::new().with("b0", 1.0).with("b1", 2.0);
        let m = affine().evaluate(array![[0.0], [1.5]].view(), &[0, 0], &p).unwrap();
        assert_eq!(m, array![1.0, 4.0]);
        let names: Vec<_> = affine().vars().into_iter().map(|v| v.name).collect();
        assert_eq!(names, vec!["b0", "b1"]);
    }

    #[test]
    fn test_beta_length_mismatch() {
        let t = Trend::linear(Featurizer::new(|x| vec![x[0]]), vec![1.0, 2.0]);
        let err = t.evaluate(array![[0.0]].view(), &[0], &Parameters::new());
        assert!(matches!(err, Err(GeostatError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_add_absorbs_zero_and_flattens() {
        assert!(matches!(Trend::Zero + affine(), Trend::Linear { .. }));
        assert!(matches!(affine() + Trend::Zero, Trend::Linear { .. }));
        let s = affine() + affine() + affine();
        assert!(matches!(&s, Trend::Sum(parts) if parts.len() == 3));
    }

    #[test]
    fn test_mux_trend_by_category() {
        let t = Trend::mux(vec![
            Trend::linear(Featurizer::new(|_| vec![1.0]), vec![10.0]),
            Trend::linear(Featurizer::new(|x| vec![x[0]]), vec![1.0]),
        ]);
        let m = t
            .evaluate(array![[3.0], [4.0], [5.0]].view(), &[1, 0, 1], &Parameters::new())
            .unwrap();
        assert_eq!(m, array![3.0, 10.0, 5.0]);
        assert!(t
            .evaluate(array![[3.0]].view(), &[2], &Parameters::new())
            .is_err());
    }

    #[test]
    fn test_mix_trend_weights() {
        let t = Trend::mix(
            vec![
                Trend::linear(Featurizer::new(|_| vec![1.0]), vec![2.0]),
                Trend::linear(Featurizer::new(|_| vec![1.0]), vec![3.0]),
            ],
            vec![
                vec![Param::from(1.0), Param::from(0.0)],
                vec![Param::from("w"), Param::from(1.0)],
            ],
        );
        let p = Parameters::new().with("w", 0.5);
        let m = t.evaluate(array![[0.0], [0.0]].view(), &[0, 1], &p).unwrap();
        assert_eq!(m, array![2.0, 4.0]);
        assert_eq!(t.vars().len(), 1);
    }
}
