//! Radiation field at the undulator exit and its centered power spectrum.

use crate::domain::{DatasetError, SliceQuantity, SliceRecord};
use num_complex::Complex64;
use rustfft::FftPlanner;
use tracing::debug;

/// End-of-undulator on-axis power for every slice, in slice order.
pub fn final_power_mid(slices: &[SliceRecord]) -> Result<Vec<f64>, DatasetError> {
    final_samples(slices, SliceQuantity::PowerMid)
}

/// End-of-undulator on-axis phase for every slice, in slice order.
pub fn final_phase_mid(slices: &[SliceRecord]) -> Result<Vec<f64>, DatasetError> {
    final_samples(slices, SliceQuantity::PhaseMid)
}

/// Complex field `sqrt(P) * exp(i*phi)` built from the last `p_mid` and
/// `phi_mid` sample of each slice.
pub fn radiation_field(slices: &[SliceRecord]) -> Result<Vec<Complex64>, DatasetError> {
    let powers = final_samples(slices, SliceQuantity::PowerMid)?;
    let phases = final_samples(slices, SliceQuantity::PhaseMid)?;

    powers
        .into_iter()
        .zip(phases)
        .enumerate()
        .map(|(index, (power, phase))| {
            if power < 0.0 {
                return Err(DatasetError::NegativePower {
                    slice: index,
                    value: power,
                });
            }
            Ok(Complex64::from_polar(power.sqrt(), phase))
        })
        .collect()
}

/// Power spectrum of the exit field, ordered like [`fft_shift`] so the
/// zero-frequency bin sits at index `n / 2`.
pub fn power_spectrum(slices: &[SliceRecord]) -> Result<Vec<f64>, DatasetError> {
    let field = radiation_field(slices)?;
    Ok(centered_power_spectrum(&field))
}

/// `|fftshift(fft(field))|^2`. An empty field yields an empty spectrum.
pub fn centered_power_spectrum(field: &[Complex64]) -> Vec<f64> {
    if field.is_empty() {
        return Vec::new();
    }

    let mut buffer = field.to_vec();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(buffer.len());
    fft.process(&mut buffer);

    debug!(bins = buffer.len(), "computed exit-field transform");

    fft_shift(&buffer)
        .into_iter()
        .map(|value| value.norm_sqr())
        .collect()
}

/// Rotates `values` right by `n / 2` so that index 0 of the input lands at `n / 2`.
pub fn fft_shift<T: Copy>(values: &[T]) -> Vec<T> {
    let mut shifted = values.to_vec();
    shifted.rotate_right(values.len() / 2);
    shifted
}

// Every slice must carry as many samples of `quantity` as slice 0.
fn final_samples(slices: &[SliceRecord], quantity: SliceQuantity) -> Result<Vec<f64>, DatasetError> {
    let Some(first) = slices.first() else {
        return Err(DatasetError::EmptyDataset);
    };
    let steps = first.require(0, quantity)?.len();

    slices
        .iter()
        .enumerate()
        .map(|(index, slice)| {
            let samples = slice.require(index, quantity)?.len();
            if samples != steps {
                return Err(DatasetError::InconsistentLength {
                    key: quantity.as_str().to_string(),
                    slice: index,
                    expected: steps,
                    actual: samples,
                });
            }
            slice.final_sample(index, quantity)
        })
        .collect()
}
