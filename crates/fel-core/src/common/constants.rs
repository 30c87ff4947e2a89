//! Physical constants used by the spectral and undulator kernels.
//!
//! Values match the ones the simulation post-processing has always used, so
//! photon-energy axes line up with historical analyses.

pub const PI2: f64 = 2.0 * std::f64::consts::PI;
/// Reduced Planck constant in eV*s.
pub const HBAR_EV_S: f64 = 6.582e-16;
/// Speed of light in m/s.
pub const SPEED_OF_LIGHT_M_S: f64 = 2.997_925e8;
/// Ratio between the full width at half maximum and the standard deviation of a Gaussian.
pub const FWHM_PER_SIGMA: f64 = 2.354_820_045_030_949_3;
