pub mod bessel;
pub mod fit;
pub mod frequency;
pub mod linalg;
pub mod spectrum;

pub use bessel::{bessel_j0, bessel_j1};
pub use fit::{
    FitError, FitResult, GaussianParameters, PeakFitInput, argmax, fit_spectral_peak,
    gaussian_with_background,
};
pub use frequency::{
    FrequencyAxisError, FrequencyAxisInput, frequency_axis_ev, frequency_bin_width_ev,
    nominal_photon_energy_ev,
};
pub use linalg::{DenseRealMatrix, LuDecomposition, LuError, lu_factorize, lu_invert, lu_solve};
pub use spectrum::{
    centered_power_spectrum, fft_shift, final_phase_mid, final_power_mid, power_spectrum,
    radiation_field,
};
