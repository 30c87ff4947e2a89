//! Photon-energy axis for the centered exit-field spectrum.

use crate::common::config::FrequencyAxisConvention;
use crate::common::constants::{HBAR_EV_S, PI2, SPEED_OF_LIGHT_M_S};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyAxisInput {
    /// Slice separation in radiation wavelengths.
    pub zsep: f64,
    pub slice_count: usize,
    /// Radiation wavelength in meters.
    pub xlamds: f64,
}

impl FrequencyAxisInput {
    pub fn new(zsep: f64, slice_count: usize, xlamds: f64) -> Self {
        Self {
            zsep,
            slice_count,
            xlamds,
        }
    }

    fn validate(&self) -> Result<(), FrequencyAxisError> {
        if self.slice_count == 0 {
            return Err(FrequencyAxisError::EmptyAxis);
        }
        if !self.zsep.is_finite() || self.zsep <= 0.0 {
            return Err(FrequencyAxisError::InvalidSliceSeparation { value: self.zsep });
        }
        if !self.xlamds.is_finite() || self.xlamds <= 0.0 {
            return Err(FrequencyAxisError::InvalidWavelength { value: self.xlamds });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrequencyAxisError {
    #[error("frequency axis requires at least one slice")]
    EmptyAxis,
    #[error("slice separation must be finite and > 0, got {value}")]
    InvalidSliceSeparation { value: f64 },
    #[error("radiation wavelength must be finite and > 0, got {value}")]
    InvalidWavelength { value: f64 },
}

impl From<FrequencyAxisError> for crate::domain::FelError {
    fn from(error: FrequencyAxisError) -> Self {
        Self::input_validation("INPUT.FREQUENCY_AXIS", error.to_string())
    }
}

/// Photon energy in eV of radiation with wavelength `xlamds` meters.
pub fn nominal_photon_energy_ev(xlamds: f64) -> f64 {
    HBAR_EV_S * PI2 / (xlamds / SPEED_OF_LIGHT_M_S)
}

/// Energy spacing in eV between adjacent spectrum bins.
pub fn frequency_bin_width_ev(input: FrequencyAxisInput) -> Result<f64, FrequencyAxisError> {
    input.validate()?;
    Ok(nominal_photon_energy_ev(input.xlamds) / input.slice_count as f64 / input.zsep)
}

/// Photon energies in eV, one per spectrum bin.
///
/// With [`FrequencyAxisConvention::BinCentered`] the nominal energy sits at
/// index `n / 2`, the same index [`fft_shift`](super::spectrum::fft_shift)
/// assigns to the zero-frequency component.
pub fn frequency_axis_ev(
    input: FrequencyAxisInput,
    convention: FrequencyAxisConvention,
) -> Result<Vec<f64>, FrequencyAxisError> {
    let df = frequency_bin_width_ev(input)?;
    let omega = nominal_photon_energy_ev(input.xlamds);
    let count = input.slice_count;
    let half = count / 2;

    debug!(
        slices = count,
        omega_ev = omega,
        df_ev = df,
        "building photon energy axis"
    );

    let axis = match convention {
        FrequencyAxisConvention::BinCentered => (0..count)
            .map(|index| omega + (index as f64 - half as f64) * df)
            .collect(),
        FrequencyAxisConvention::InclusiveEndpoints => {
            let span = 0.5 * count as f64 * df;
            linspace(omega - span, omega + span, count)
        }
    };

    Ok(axis)
}

fn linspace(start: f64, stop: f64, count: usize) -> Vec<f64> {
    if count == 1 {
        return vec![start];
    }
    let step = (stop - start) / (count - 1) as f64;
    (0..count)
        .map(|index| {
            if index == count - 1 {
                stop
            } else {
                start + index as f64 * step
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{
        FrequencyAxisError, FrequencyAxisInput, frequency_axis_ev, frequency_bin_width_ev,
        nominal_photon_energy_ev,
    };
    use crate::common::config::FrequencyAxisConvention;

    const XLAMDS: f64 = 1.5e-9;

    #[test]
    fn nominal_energy_matches_hbar_omega() {
        let expected = 6.582e-16 * 2.0 * std::f64::consts::PI * 2.997925e8 / XLAMDS;
        let omega = nominal_photon_energy_ev(XLAMDS);
        assert!((omega - expected).abs() <= 1.0e-9 * expected);
        assert!((omega - 826.5).abs() < 1.0);
    }

    #[test]
    fn bin_centered_axis_is_aligned_with_shifted_spectrum() {
        for count in [1_usize, 2, 9, 64, 101] {
            let input = FrequencyAxisInput::new(3.0, count, XLAMDS);
            let axis = frequency_axis_ev(input, FrequencyAxisConvention::BinCentered)
                .expect("axis should build");
            let omega = nominal_photon_energy_ev(XLAMDS);
            let df = frequency_bin_width_ev(input).expect("valid input");

            assert_eq!(axis.len(), count);
            assert!((axis[count / 2] - omega).abs() <= 1.0e-12 * omega);
            for pair in axis.windows(2) {
                assert!(pair[1] > pair[0]);
                assert!(((pair[1] - pair[0]) - df).abs() <= 1.0e-9 * df);
            }

            let midpoint = 0.5 * (axis[0] + axis[count - 1]);
            assert!((midpoint - omega).abs() <= 0.5 * df + 1.0e-12 * omega);
        }
    }

    #[test]
    fn inclusive_endpoints_reach_both_half_spans() {
        let input = FrequencyAxisInput::new(2.0, 8, XLAMDS);
        let axis = frequency_axis_ev(input, FrequencyAxisConvention::InclusiveEndpoints)
            .expect("axis should build");
        let omega = nominal_photon_energy_ev(XLAMDS);
        let df = frequency_bin_width_ev(input).expect("valid input");

        assert_eq!(axis.len(), 8);
        assert!((axis[0] - (omega - 4.0 * df)).abs() <= 1.0e-12 * omega);
        assert_eq!(axis[7], omega + 4.0 * df);
        let spacing = axis[1] - axis[0];
        assert!((spacing - 8.0 * df / 7.0).abs() <= 1.0e-9 * df);
    }

    #[test]
    fn bin_width_scales_inversely_with_slices_and_separation() {
        let width = |zsep: f64, slices: usize| {
            frequency_bin_width_ev(FrequencyAxisInput::new(zsep, slices, XLAMDS))
                .expect("valid input")
        };
        let base = width(1.0, 100);
        let doubled = width(2.0, 100);
        let more_slices = width(1.0, 400);

        assert!((base / doubled - 2.0).abs() <= 1.0e-12);
        assert!((base / more_slices - 4.0).abs() <= 1.0e-12);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let convention = FrequencyAxisConvention::BinCentered;
        assert_eq!(
            frequency_axis_ev(FrequencyAxisInput::new(1.0, 0, XLAMDS), convention),
            Err(FrequencyAxisError::EmptyAxis)
        );
        assert_eq!(
            frequency_axis_ev(FrequencyAxisInput::new(0.0, 4, XLAMDS), convention),
            Err(FrequencyAxisError::InvalidSliceSeparation { value: 0.0 })
        );
        assert!(matches!(
            frequency_axis_ev(FrequencyAxisInput::new(1.0, 4, f64::NAN), convention),
            Err(FrequencyAxisError::InvalidWavelength { .. })
        ));
    }

    #[test]
    fn bin_width_rejects_inputs_the_axis_rejects() {
        assert_eq!(
            frequency_bin_width_ev(FrequencyAxisInput::new(1.0, 0, XLAMDS)),
            Err(FrequencyAxisError::EmptyAxis)
        );
        assert_eq!(
            frequency_bin_width_ev(FrequencyAxisInput::new(-2.0, 16, XLAMDS)),
            Err(FrequencyAxisError::InvalidSliceSeparation { value: -2.0 })
        );
        assert!(matches!(
            frequency_bin_width_ev(FrequencyAxisInput::new(1.0, 16, 0.0)),
            Err(FrequencyAxisError::InvalidWavelength { value }) if value == 0.0
        ));
    }
}
