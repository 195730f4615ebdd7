// ─────────────────────────────────────────────────────────────────────
// Geostat-RS — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{GeostatError, GeostatResult};
use serde::{Deserialize, Serialize};

/// Top-level run configuration.
/// Every section is optional in JSON and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeostatConfig {
    #[serde(default)]
    pub fit: FitConfig,
    #[serde(default)]
    pub mcmc: McmcConfig,
    #[serde(default)]
    pub predict: PredictConfig,
    #[serde(default)]
    pub krige: KrigeConfig,
    #[serde(default)]
    pub gp: SpatialGpConfig,
}

impl GeostatConfig {
    /// Load from a JSON file and validate every section.
    pub fn from_file(path: &str) -> GeostatResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GeostatResult<()> {
        self.fit.validate()?;
        self.mcmc.validate()?;
        self.predict.validate()?;
        self.krige.validate()?;
        self.gp.validate()
    }
}

/// Maximum-likelihood fit settings (Adam on unconstrained parameters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitConfig {
    #[serde(default = "default_fit_step_size")]
    pub step_size: f64,
    #[serde(default = "default_fit_iters")]
    pub iters: usize,
    /// Weight of the range regulariser; `None` disables it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reg: Option<f64>,
}

fn default_fit_step_size() -> f64 {
    0.01
}
fn default_fit_iters() -> usize {
    100
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            step_size: default_fit_step_size(),
            iters: default_fit_iters(),
            reg: None,
        }
    }
}

impl FitConfig {
    pub fn with_iters(mut self, iters: usize) -> Self {
        self.iters = iters;
        self
    }

    pub fn with_step_size(mut self, step_size: f64) -> Self {
        self.step_size = step_size;
        self
    }

    pub fn with_reg(mut self, reg: f64) -> Self {
        self.reg = Some(reg);
        self
    }

    pub fn validate(&self) -> GeostatResult<()> {
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(GeostatError::ConfigError(
                "fit.step_size must be finite and > 0".to_string(),
            ));
        }
        if self.iters == 0 {
            return Err(GeostatError::ConfigError(
                "fit.iters must be >= 1".to_string(),
            ));
        }
        if let Some(reg) = self.reg {
            if !reg.is_finite() || reg < 0.0 {
                return Err(GeostatError::ConfigError(
                    "fit.reg must be finite and >= 0".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Replica-exchange Metropolis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct McmcConfig {
    #[serde(default = "default_chains")]
    pub chains: usize,
    #[serde(default = "default_mcmc_step_size")]
    pub step_size: f64,
    /// Probability that a coordinate moves in a proposal.
    #[serde(default = "default_move_prob")]
    pub move_prob: f64,
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_burnin")]
    pub burnin: usize,
    #[serde(default = "default_report_interval")]
    pub report_interval: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_chains() -> usize {
    4
}
fn default_mcmc_step_size() -> f64 {
    0.1
}
fn default_move_prob() -> f64 {
    0.5
}
fn default_samples() -> usize {
    1000
}
fn default_burnin() -> usize {
    500
}
fn default_report_interval() -> usize {
    100
}

impl Default for McmcConfig {
    fn default() -> Self {
        McmcConfig {
            chains: default_chains(),
            step_size: default_mcmc_step_size(),
            move_prob: default_move_prob(),
            samples: default_samples(),
            burnin: default_burnin(),
            report_interval: default_report_interval(),
            seed: None,
        }
    }
}

impl McmcConfig {
    pub fn validate(&self) -> GeostatResult<()> {
        if self.chains == 0 {
            return Err(GeostatError::ConfigError(
                "mcmc.chains must be >= 1".to_string(),
            ));
        }
        if !self.step_size.is_finite() || self.step_size <= 0.0 {
            return Err(GeostatError::ConfigError(
                "mcmc.step_size must be finite and > 0".to_string(),
            ));
        }
        if !(self.move_prob > 0.0 && self.move_prob <= 1.0) {
            return Err(GeostatError::ConfigError(
                "mcmc.move_prob must be in (0, 1]".to_string(),
            ));
        }
        if self.report_interval == 0 {
            return Err(GeostatError::ConfigError(
                "mcmc.report_interval must be >= 1".to_string(),
            ));
        }
        if self.samples == 0 || self.samples % self.report_interval != 0 {
            return Err(GeostatError::ConfigError(
                "mcmc.samples must be a positive multiple of report_interval".to_string(),
            ));
        }
        if self.burnin % self.report_interval != 0 {
            return Err(GeostatError::ConfigError(
                "mcmc.burnin must be a multiple of report_interval".to_string(),
            ));
        }
        Ok(())
    }
}

/// Point estimate used to collapse posterior samples before predicting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reduce {
    Median,
    Mean,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictConfig {
    /// Prediction batch size; defaults to half the number of observations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    /// Number of evenly spaced posterior draws to average over.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsample: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reduce: Option<Reduce>,
}

impl PredictConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn with_subsample(mut self, subsample: usize) -> Self {
        self.subsample = Some(subsample);
        self
    }

    pub fn with_reduce(mut self, reduce: Reduce) -> Self {
        self.reduce = Some(reduce);
        self
    }

    pub fn validate(&self) -> GeostatResult<()> {
        if self.batch_size == Some(0) {
            return Err(GeostatError::ConfigError(
                "predict.batch_size must be >= 1".to_string(),
            ));
        }
        if self.subsample == Some(0) {
            return Err(GeostatError::ConfigError(
                "predict.subsample must be >= 1".to_string(),
            ));
        }
        if self.subsample.is_some() && self.reduce.is_some() {
            return Err(GeostatError::ConfigError(
                "predict.subsample and predict.reduce cannot both be given".to_string(),
            ));
        }
        Ok(())
    }
}

/// Variogram model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariogramKind {
    Linear,
    #[default]
    Gaussian,
    Spherical,
}

/// Maximum lag included in variogram fitting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cutoff {
    /// Half the diagonal of the x/y bounding box.
    #[default]
    Auto,
    Distance(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnits {
    #[default]
    Meters,
    Kilometers,
}

/// Projection of lon/lat inputs to planar coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    #[serde(default)]
    pub units: DistanceUnits,
    #[serde(default = "default_epsg")]
    pub epsg: String,
}

fn default_epsg() -> String {
    "EPSG:3310".to_string()
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        ProjectionConfig {
            units: DistanceUnits::default(),
            epsg: default_epsg(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KrigeConfig {
    /// Number of lag bins; `None` fits the raw variogram cloud.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bins: Option<usize>,
    #[serde(default)]
    pub variogram: VariogramKind,
    /// Fixed variogram parameters; `None` fits them to the data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Vec<f64>>,
    #[serde(default)]
    pub cutoff: Cutoff,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<ProjectionConfig>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

fn default_verbose() -> bool {
    true
}

impl Default for KrigeConfig {
    fn default() -> Self {
        KrigeConfig {
            bins: None,
            variogram: VariogramKind::default(),
            params: None,
            cutoff: Cutoff::default(),
            projection: None,
            verbose: default_verbose(),
        }
    }
}

impl KrigeConfig {
    pub fn validate(&self) -> GeostatResult<()> {
        if self.bins == Some(0) {
            return Err(GeostatError::ConfigError(
                "krige.bins must be >= 1".to_string(),
            ));
        }
        if let Cutoff::Distance(d) = self.cutoff {
            if !d.is_finite() || d <= 0.0 {
                return Err(GeostatError::ConfigError(
                    "krige.cutoff must be finite and > 0".to_string(),
                ));
            }
        }
        if let Some(params) = &self.params {
            let expected = match self.variogram {
                VariogramKind::Linear => 2,
                VariogramKind::Gaussian | VariogramKind::Spherical => 3,
            };
            if params.len() != expected {
                return Err(GeostatError::ConfigError(format!(
                    "krige.params: {:?} variogram takes {expected} parameters, got {}",
                    self.variogram,
                    params.len()
                )));
            }
            if !params.iter().all(|p| p.is_finite()) {
                return Err(GeostatError::ConfigError(
                    "krige.params must be finite".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Stationary covariance of the projected-coordinate GP front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CovarianceKind {
    #[default]
    #[serde(rename = "squared-exp")]
    SquaredExponential,
    #[serde(rename = "gamma-exp")]
    GammaExponential,
}

/// GP on (optionally projected) coordinates: stationary covariance plus a
/// trend prior of weight `alpha` and a nugget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpatialGpConfig {
    #[serde(default)]
    pub covariance: CovarianceKind,
    /// Prior variance of the trend coefficients.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<ProjectionConfig>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

fn default_alpha() -> f64 {
    10.0
}

impl Default for SpatialGpConfig {
    fn default() -> Self {
        SpatialGpConfig {
            covariance: CovarianceKind::default(),
            alpha: default_alpha(),
            projection: None,
            verbose: default_verbose(),
        }
    }
}

impl SpatialGpConfig {
    pub fn validate(&self) -> GeostatResult<()> {
        if !self.alpha.is_finite() || self.alpha <= 0.0 {
            return Err(GeostatError::ConfigError(
                "gp.alpha must be finite and > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// CARGO_MANIFEST_DIR points to crates/geostat-types/, so go up two levels.
    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
    }

    fn config_path(relative: &str) -> String {
        project_root().join(relative).to_string_lossy().to_string()
    }

    #[test]
    fn test_load_default_config() {
        let cfg = GeostatConfig::from_file(&config_path("configs/default.json")).unwrap();
        assert_eq!(cfg.fit.iters, 100);
        assert!((cfg.fit.step_size - 0.01).abs() < 1e-12);
        assert_eq!(cfg.mcmc.chains, 4);
        assert_eq!(cfg.krige.variogram, VariogramKind::Gaussian);
        assert_eq!(cfg.krige.cutoff, Cutoff::Auto);
        assert_eq!(cfg.gp.covariance, CovarianceKind::SquaredExponential);
        assert_eq!(cfg.gp.alpha, 10.0);
    }

    #[test]
    fn test_load_projected_krige_config() {
        let cfg = GeostatConfig::from_file(&config_path("configs/krige_projected.json")).unwrap();
        assert_eq!(cfg.krige.bins, Some(20));
        assert_eq!(cfg.krige.variogram, VariogramKind::Spherical);
        let proj = cfg.krige.projection.as_ref().unwrap();
        assert_eq!(proj.units, DistanceUnits::Kilometers);
        assert_eq!(proj.epsg, "EPSG:3310");
        assert_eq!(cfg.predict.reduce, Some(Reduce::Median));
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let cfg: GeostatConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.mcmc.samples, 1000);
        assert_eq!(cfg.mcmc.burnin, 500);
        assert_eq!(cfg.mcmc.report_interval, 100);
        assert!(cfg.krige.verbose);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_fixed_cutoff_parses() {
        let cfg: KrigeConfig = serde_json::from_str(r#"{"cutoff": {"distance": 12.5}}"#).unwrap();
        assert_eq!(cfg.cutoff, Cutoff::Distance(12.5));
    }

    #[test]
    fn test_mcmc_rejects_misaligned_samples() {
        let cfg = McmcConfig {
            samples: 150,
            ..McmcConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("multiple of report_interval"));
    }

    #[test]
    fn test_predict_rejects_subsample_and_reduce() {
        let cfg = PredictConfig::default()
            .with_subsample(10)
            .with_reduce(Reduce::Mean);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_krige_param_count_checked() {
        let cfg = KrigeConfig {
            variogram: VariogramKind::Linear,
            params: Some(vec![1.0, 2.0, 3.0]),
            ..KrigeConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_gp_section_parses() {
        let cfg: GeostatConfig = serde_json::from_str(
            r#"{"gp": {"covariance": "gamma-exp", "alpha": 2.5, "projection": {"units": "kilometers"}}}"#,
        )
        .unwrap();
        assert_eq!(cfg.gp.covariance, CovarianceKind::GammaExponential);
        assert_eq!(cfg.gp.alpha, 2.5);
        assert_eq!(cfg.gp.projection.unwrap().units, DistanceUnits::Kilometers);
        let bad = SpatialGpConfig {
            alpha: 0.0,
            ..SpatialGpConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_roundtrip_serialization() {
        let cfg = GeostatConfig::from_file(&config_path("configs/krige_projected.json")).unwrap();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let cfg2: GeostatConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg.krige.bins, cfg2.krige.bins);
        assert_eq!(cfg.krige.projection, cfg2.krige.projection);
        assert_eq!(cfg.fit.iters, cfg2.fit.iters);
    }
}
