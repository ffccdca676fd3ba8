use crate::error::{LossError, Result};
use crate::seepage::AVERAGE_FILTRATION_COEFFICIENT;
use serde::Deserialize;
use std::path::Path;

/// Days in every decade of the model, including the partial October.
pub const DAYS_PER_DECADE: f64 = 10.0;

// Engine parameters, loadable from TOML
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Filtration coefficient A of the seepage formula.
    pub filtration_coefficient: f64,
    pub days_per_decade: f64,
    /// Return-flow volume added to every decade volume, million m³.
    pub return_flow_volume: f64,
    /// Worker threads for the full-table pass; all cores when unset.
    pub threads: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            filtration_coefficient: AVERAGE_FILTRATION_COEFFICIENT,
            days_per_decade: DAYS_PER_DECADE,
            return_flow_volume: 0.0,
            threads: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.filtration_coefficient.is_finite() && self.filtration_coefficient >= 0.0) {
            return Err(LossError::InvalidConfig(format!(
                "filtration_coefficient must be a non-negative number, got {}",
                self.filtration_coefficient
            )));
        }
        if !(self.days_per_decade.is_finite() && self.days_per_decade > 0.0) {
            return Err(LossError::InvalidConfig(format!(
                "days_per_decade must be positive, got {}",
                self.days_per_decade
            )));
        }
        if !self.return_flow_volume.is_finite() {
            return Err(LossError::InvalidConfig("return_flow_volume must be finite".into()));
        }
        if self.threads == Some(0) {
            return Err(LossError::InvalidConfig("threads must be at least 1".into()));
        }
        Ok(())
    }

    pub fn worker_threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}

// Output format configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
    #[value(name = "netcdf")]
    NetCdf,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::NetCdf => "nc",
        }
    }
}
