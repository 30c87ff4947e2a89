pub mod config;
pub mod constants;

pub use config::{
    AnalysisConfig, ConfigError, FrequencyAxisConvention, PeakFitConfig, load_analysis_config,
};
