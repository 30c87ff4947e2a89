use crate::common::config::AnalysisConfig;
use crate::domain::{FelResult, SliceDataset};
use crate::numerics::{
    FitResult, FrequencyAxisInput, PeakFitInput, fit_spectral_peak, frequency_axis_ev,
    power_spectrum,
};
use serde::Serialize;
use tracing::warn;

/// Exit-field spectrum of one run together with its photon-energy axis and
/// the Gaussian fit of the spectral peak.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralAnalysis {
    pub photon_energy_ev: Vec<f64>,
    pub power_spectrum: Vec<f64>,
    pub fit: FitResult,
}

impl SpectralAnalysis {
    pub fn fwhm(&self) -> f64 {
        self.fit.fwhm
    }

    pub fn summary_lines(&self) -> Vec<String> {
        vec![
            format!("Fitted mean = {}", self.fit.centroid()),
            format!("Fitted standard deviation = {}", self.fit.sigma()),
            format!("Fitted FWHM = {}", self.fit.fwhm),
        ]
    }
}

pub fn analyze_final_spectrum(
    dataset: &SliceDataset,
    config: &AnalysisConfig,
) -> FelResult<SpectralAnalysis> {
    config.validate()?;

    let spectrum = power_spectrum(dataset.slices())?;
    let axis = frequency_axis_ev(
        FrequencyAxisInput::new(dataset.zsep(), dataset.slice_count(), dataset.xlamds()),
        config.frequency_axis,
    )?;

    let fit = fit_spectral_peak(PeakFitInput::new(&spectrum, &axis), &config.peak_fit)
        .inspect_err(|error| warn!(%error, "spectral peak fit rejected"))?;

    Ok(SpectralAnalysis {
        photon_energy_ev: axis,
        power_spectrum: spectrum,
        fit,
    })
}
