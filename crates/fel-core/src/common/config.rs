//! Analysis configuration: peak-fit window and solver controls plus the
//! frequency-axis convention. Every field has a default, so an empty JSON
//! object is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_HALF_WINDOW: usize = 10;
pub const DEFAULT_INITIAL_AMPLITUDE: f64 = 1.0;
pub const DEFAULT_INITIAL_SIGMA: f64 = 0.15;
pub const DEFAULT_INITIAL_BACKGROUND: f64 = 1.0e-4;
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;
pub const DEFAULT_FTOL: f64 = 1.490_116_119_384_765_6e-8;
pub const DEFAULT_XTOL: f64 = 1.490_116_119_384_765_6e-8;

/// How photon energies are assigned to the centered spectrum bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FrequencyAxisConvention {
    /// `omega + (i - n/2) * df`: the nominal energy sits on the zero-frequency
    /// bin of the shifted transform and consecutive bins are exactly `df` apart.
    #[default]
    BinCentered,
    /// `n` points from `omega - n/2 * df` to `omega + n/2 * df`, both ends included.
    InclusiveEndpoints,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeakFitConfig {
    /// Bins taken on each side of the spectral maximum.
    pub half_window: usize,
    pub initial_amplitude: f64,
    pub initial_sigma: f64,
    pub initial_background: f64,
    pub max_iterations: usize,
    pub ftol: f64,
    pub xtol: f64,
    pub gtol: f64,
}

impl Default for PeakFitConfig {
    fn default() -> Self {
        Self {
            half_window: DEFAULT_HALF_WINDOW,
            initial_amplitude: DEFAULT_INITIAL_AMPLITUDE,
            initial_sigma: DEFAULT_INITIAL_SIGMA,
            initial_background: DEFAULT_INITIAL_BACKGROUND,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            ftol: DEFAULT_FTOL,
            xtol: DEFAULT_XTOL,
            gtol: 0.0,
        }
    }
}

impl PeakFitConfig {
    pub fn with_half_window(mut self, half_window: usize) -> Self {
        self.half_window = half_window;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.half_window == 0 {
            return Err(ConfigError::Invalid {
                field: "halfWindow",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid {
                field: "maxIterations",
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, value) in [
            ("initialAmplitude", self.initial_amplitude),
            ("initialBackground", self.initial_background),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be finite, got {value}"),
                });
            }
        }
        for (field, value) in [
            ("initialSigma", self.initial_sigma),
            ("ftol", self.ftol),
            ("xtol", self.xtol),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be finite and > 0, got {value}"),
                });
            }
        }
        if !self.gtol.is_finite() || self.gtol < 0.0 {
            return Err(ConfigError::Invalid {
                field: "gtol",
                reason: format!("must be finite and >= 0, got {}", self.gtol),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    pub peak_fit: PeakFitConfig,
    pub frequency_axis: FrequencyAxisConvention,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.peak_fit.validate()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read analysis config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse analysis config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid analysis config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl From<ConfigError> for crate::domain::FelError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Read { .. } => Self::io_system("IO.CONFIG_READ", error.to_string()),
            _ => Self::input_validation("INPUT.CONFIG", error.to_string()),
        }
    }
}

pub fn load_analysis_config(config_path: impl AsRef<Path>) -> Result<AnalysisConfig, ConfigError> {
    let config_path = config_path.as_ref();
    let source = fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
        path: config_path.to_path_buf(),
        source,
    })?;
    let config: AnalysisConfig =
        serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
            path: config_path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}
