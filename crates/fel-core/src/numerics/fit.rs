//! Peak-localized Gaussian fit of a power spectrum.
//!
//! The spectrum is normalized to its maximum, a window of `half_window` bins
//! on each side of the maximum is cut out, and
//! `A * exp(-(x - mu)^2 / (2 sigma^2)) + bg` is fitted to it with a
//! Levenberg-Marquardt least-squares solver. The covariance estimate is the
//! inverse normal matrix scaled by the residual variance.

use super::linalg::{DenseRealMatrix, lu_invert, lu_solve};
use crate::common::config::{ConfigError, PeakFitConfig};
use crate::common::constants::FWHM_PER_SIGMA;
use serde::Serialize;
use tracing::{debug, info};

pub const FIT_PARAMETER_COUNT: usize = 4;

const INITIAL_DAMPING: f64 = 1.0e-3;
const MIN_DAMPING: f64 = 1.0e-12;
const MAX_DAMPING: f64 = 1.0e16;
const DAMPING_FACTOR: f64 = 10.0;
const DIAGONAL_FLOOR: f64 = 1.0e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaussianParameters {
    pub amplitude: f64,
    pub centroid: f64,
    pub sigma: f64,
    pub background: f64,
}

impl GaussianParameters {
    pub fn new(amplitude: f64, centroid: f64, sigma: f64, background: f64) -> Self {
        Self {
            amplitude,
            centroid,
            sigma,
            background,
        }
    }

    pub fn as_array(&self) -> [f64; FIT_PARAMETER_COUNT] {
        [self.amplitude, self.centroid, self.sigma, self.background]
    }

    fn from_array(values: [f64; FIT_PARAMETER_COUNT]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn fwhm(&self) -> f64 {
        FWHM_PER_SIGMA * self.sigma
    }
}

pub fn gaussian_with_background(x: f64, parameters: &GaussianParameters) -> f64 {
    let offset = x - parameters.centroid;
    parameters.amplitude * (-(offset * offset) / (2.0 * parameters.sigma * parameters.sigma)).exp()
        + parameters.background
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakFitInput<'a> {
    pub spectrum: &'a [f64],
    pub axis: &'a [f64],
}

impl<'a> PeakFitInput<'a> {
    pub fn new(spectrum: &'a [f64], axis: &'a [f64]) -> Self {
        Self { spectrum, axis }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FitResult {
    pub parameters: GaussianParameters,
    /// Row/column order: amplitude, centroid, sigma, background.
    pub covariance: [[f64; FIT_PARAMETER_COUNT]; FIT_PARAMETER_COUNT],
    pub fwhm: f64,
    pub peak_index: usize,
    pub window_start: usize,
    pub window_end: usize,
    pub iterations: usize,
    pub residual_sum_of_squares: f64,
}

impl FitResult {
    pub fn centroid(&self) -> f64 {
        self.parameters.centroid
    }

    pub fn sigma(&self) -> f64 {
        self.parameters.sigma
    }

    /// One-sigma uncertainties from the covariance diagonal.
    pub fn standard_errors(&self) -> [f64; FIT_PARAMETER_COUNT] {
        std::array::from_fn(|index| self.covariance[index][index].max(0.0).sqrt())
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        gaussian_with_background(x, &self.parameters)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("peak fit requires a non-empty spectrum")]
    EmptySpectrum,
    #[error("peak fit input length mismatch: spectrum={spectrum}, axis={axis}")]
    LengthMismatch { spectrum: usize, axis: usize },
    #[error("spectrum value must be finite at index {index}, got {value}")]
    NonFiniteSpectrum { index: usize, value: f64 },
    #[error("frequency axis value must be finite at index {index}, got {value}")]
    NonFiniteAxis { index: usize, value: f64 },
    #[error("spectrum maximum must be > 0 to normalize, got {maximum}")]
    DegenerateSpectrum { maximum: f64 },
    #[error(
        "insufficient window: peak at index {peak_index} needs {half_window} bins on each side within {len} bins"
    )]
    InsufficientWindow {
        peak_index: usize,
        half_window: usize,
        len: usize,
    },
    #[error("peak fit window has {points} points, needs more than {parameters}")]
    TooFewPoints { points: usize, parameters: usize },
    #[error("least-squares solver did not converge after {iterations} iterations")]
    NonConvergence { iterations: usize },
    #[error("fit covariance is singular")]
    SingularCovariance,
}

impl From<FitError> for crate::domain::FelError {
    fn from(error: FitError) -> Self {
        match error {
            FitError::Config(source) => source.into(),
            FitError::InsufficientWindow { .. } => {
                Self::computation("RUN.PEAK_WINDOW", error.to_string())
            }
            FitError::EmptySpectrum
            | FitError::LengthMismatch { .. }
            | FitError::NonFiniteSpectrum { .. }
            | FitError::NonFiniteAxis { .. } => {
                Self::input_validation("INPUT.PEAK_FIT", error.to_string())
            }
            _ => Self::computation("RUN.PEAK_FIT", error.to_string()),
        }
    }
}

/// Index of the first maximum, or `None` for an empty slice.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, value) in values.iter().enumerate() {
        match best {
            Some(current) if values[current] >= *value => {}
            _ => best = Some(index),
        }
    }
    best
}

/// Fits the spectral peak and reports centroid, width and FWHM.
pub fn fit_spectral_peak(
    input: PeakFitInput<'_>,
    config: &PeakFitConfig,
) -> Result<FitResult, FitError> {
    config.validate()?;
    validate_input(input)?;

    let Some(peak_index) = argmax(input.spectrum) else {
        return Err(FitError::EmptySpectrum);
    };
    let maximum = input.spectrum[peak_index];
    if maximum <= 0.0 {
        return Err(FitError::DegenerateSpectrum { maximum });
    }

    let len = input.spectrum.len();
    let half_window = config.half_window;
    if peak_index < half_window || peak_index + half_window > len - 1 {
        return Err(FitError::InsufficientWindow {
            peak_index,
            half_window,
            len,
        });
    }

    let window_start = peak_index - half_window;
    let window_end = peak_index + half_window;
    let points = window_end - window_start;
    if points <= FIT_PARAMETER_COUNT {
        return Err(FitError::TooFewPoints {
            points,
            parameters: FIT_PARAMETER_COUNT,
        });
    }

    let x = &input.axis[window_start..window_end];
    let y: Vec<f64> = input.spectrum[window_start..window_end]
        .iter()
        .map(|value| value / maximum)
        .collect();
    let initial = GaussianParameters::new(
        config.initial_amplitude,
        input.axis[peak_index],
        config.initial_sigma,
        config.initial_background,
    );

    debug!(
        peak_index,
        window_start, window_end, "fitting gaussian to spectral peak"
    );

    let solution = levenberg_marquardt(x, &y, initial, config)?;
    let mut covariance = scaled_covariance(&solution.normal, solution.cost, points)?;
    let mut parameters = GaussianParameters::from_array(solution.parameters);
    if parameters.sigma < 0.0 {
        parameters.sigma = -parameters.sigma;
        for other in 0..FIT_PARAMETER_COUNT {
            if other != 2 {
                covariance[2][other] = -covariance[2][other];
                covariance[other][2] = -covariance[other][2];
            }
        }
    }
    let fwhm = parameters.fwhm();

    info!(
        mean = parameters.centroid,
        standard_deviation = parameters.sigma,
        fwhm,
        iterations = solution.iterations,
        "fitted spectral peak"
    );

    Ok(FitResult {
        parameters,
        covariance,
        fwhm,
        peak_index,
        window_start,
        window_end,
        iterations: solution.iterations,
        residual_sum_of_squares: solution.cost,
    })
}

fn validate_input(input: PeakFitInput<'_>) -> Result<(), FitError> {
    if input.spectrum.len() != input.axis.len() {
        return Err(FitError::LengthMismatch {
            spectrum: input.spectrum.len(),
            axis: input.axis.len(),
        });
    }
    if input.spectrum.is_empty() {
        return Err(FitError::EmptySpectrum);
    }
    if let Some((index, value)) = first_non_finite(input.spectrum) {
        return Err(FitError::NonFiniteSpectrum { index, value });
    }
    if let Some((index, value)) = first_non_finite(input.axis) {
        return Err(FitError::NonFiniteAxis { index, value });
    }
    Ok(())
}

fn first_non_finite(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .find(|(_, value)| !value.is_finite())
}

struct LeastSquaresSolution {
    parameters: [f64; FIT_PARAMETER_COUNT],
    normal: DenseRealMatrix,
    cost: f64,
    iterations: usize,
}

fn levenberg_marquardt(
    x: &[f64],
    y: &[f64],
    initial: GaussianParameters,
    config: &PeakFitConfig,
) -> Result<LeastSquaresSolution, FitError> {
    let mut parameters = initial.as_array();
    let mut residual = residuals(x, y, &parameters);
    let mut cost = sum_of_squares(&residual);
    if !cost.is_finite() {
        return Err(FitError::NonConvergence { iterations: 0 });
    }

    // Residuals at rounding level of the data count as an exact fit.
    let exact_fit_cost = f64::EPSILON * sum_of_squares(y);

    let mut damping = INITIAL_DAMPING;
    for iteration in 1..=config.max_iterations {
        let jacobian = model_jacobian(x, &parameters);
        let (normal, gradient) = normal_equations(&jacobian, &residual);

        let gradient_norm = gradient.iter().fold(0.0_f64, |acc, g| acc.max(g.abs()));
        if gradient_norm <= config.gtol {
            return Ok(LeastSquaresSolution {
                parameters,
                normal,
                cost,
                iterations: iteration - 1,
            });
        }

        let mut damped = normal.clone();
        for index in 0..FIT_PARAMETER_COUNT {
            damped[(index, index)] += damping * normal[(index, index)].max(DIAGONAL_FLOOR);
        }

        let step = match lu_solve(&damped, &gradient) {
            Ok(step) => step,
            Err(_) => {
                damping *= DAMPING_FACTOR;
                if damping > MAX_DAMPING {
                    return Err(FitError::NonConvergence { iterations: iteration });
                }
                continue;
            }
        };

        let trial: [f64; FIT_PARAMETER_COUNT] =
            std::array::from_fn(|index| parameters[index] + step[index]);
        let trial_residual = residuals(x, y, &trial);
        let trial_cost = sum_of_squares(&trial_residual);

        if trial_cost.is_finite() && trial_cost < cost {
            let actual_reduction = cost - trial_cost;
            let predicted_reduction = predicted_reduction(&normal, &gradient, &step);
            let previous_cost = cost;

            parameters = trial;
            residual = trial_residual;
            cost = trial_cost;
            damping = (damping / DAMPING_FACTOR).max(MIN_DAMPING);

            let step_is_small = step
                .iter()
                .zip(&parameters)
                .all(|(delta, value)| delta.abs() <= config.xtol * (value.abs() + config.xtol));
            let reduction_is_small = actual_reduction <= config.ftol * previous_cost
                && predicted_reduction <= config.ftol * previous_cost
                && actual_reduction <= 2.0 * predicted_reduction;
            if step_is_small || reduction_is_small || cost <= exact_fit_cost {
                let (normal, _) = normal_equations(&model_jacobian(x, &parameters), &residual);
                return Ok(LeastSquaresSolution {
                    parameters,
                    normal,
                    cost,
                    iterations: iteration,
                });
            }
        } else {
            damping *= DAMPING_FACTOR;
            if damping > MAX_DAMPING {
                return Err(FitError::NonConvergence {
                    iterations: iteration,
                });
            }
        }
    }

    Err(FitError::NonConvergence {
        iterations: config.max_iterations,
    })
}

fn residuals(x: &[f64], y: &[f64], parameters: &[f64; FIT_PARAMETER_COUNT]) -> Vec<f64> {
    let model = GaussianParameters::from_array(*parameters);
    x.iter()
        .zip(y)
        .map(|(x, y)| y - gaussian_with_background(*x, &model))
        .collect()
}

// Columns: d/dA, d/dmu, d/dsigma, d/dbg of the model.
fn model_jacobian(x: &[f64], parameters: &[f64; FIT_PARAMETER_COUNT]) -> DenseRealMatrix {
    let [amplitude, centroid, sigma, _] = *parameters;
    let mut jacobian = DenseRealMatrix::zeros(x.len(), FIT_PARAMETER_COUNT);
    for (row, x) in x.iter().enumerate() {
        let offset = x - centroid;
        let envelope = (-(offset * offset) / (2.0 * sigma * sigma)).exp();
        jacobian[(row, 0)] = envelope;
        jacobian[(row, 1)] = amplitude * envelope * offset / (sigma * sigma);
        jacobian[(row, 2)] = amplitude * envelope * offset * offset / (sigma * sigma * sigma);
        jacobian[(row, 3)] = 1.0;
    }
    jacobian
}

fn normal_equations(
    jacobian: &DenseRealMatrix,
    residual: &[f64],
) -> (DenseRealMatrix, Vec<f64>) {
    let mut normal = DenseRealMatrix::zeros(FIT_PARAMETER_COUNT, FIT_PARAMETER_COUNT);
    let mut gradient = vec![0.0; FIT_PARAMETER_COUNT];
    for row in 0..jacobian.nrows() {
        for i in 0..FIT_PARAMETER_COUNT {
            gradient[i] += jacobian[(row, i)] * residual[row];
            for j in 0..FIT_PARAMETER_COUNT {
                normal[(i, j)] += jacobian[(row, i)] * jacobian[(row, j)];
            }
        }
    }
    (normal, gradient)
}

// Decrease of the linearized cost: 2 step.g - step.N.step
fn predicted_reduction(normal: &DenseRealMatrix, gradient: &[f64], step: &[f64]) -> f64 {
    let mut linear = 0.0;
    let mut quadratic = 0.0;
    for i in 0..FIT_PARAMETER_COUNT {
        linear += step[i] * gradient[i];
        for j in 0..FIT_PARAMETER_COUNT {
            quadratic += step[i] * normal[(i, j)] * step[j];
        }
    }
    2.0 * linear - quadratic
}

fn scaled_covariance(
    normal: &DenseRealMatrix,
    cost: f64,
    points: usize,
) -> Result<[[f64; FIT_PARAMETER_COUNT]; FIT_PARAMETER_COUNT], FitError> {
    let inverse = lu_invert(normal).map_err(|_| FitError::SingularCovariance)?;
    let variance = cost / (points - FIT_PARAMETER_COUNT) as f64;

    let mut covariance = [[0.0; FIT_PARAMETER_COUNT]; FIT_PARAMETER_COUNT];
    for (row, values) in covariance.iter_mut().enumerate() {
        for (col, value) in values.iter_mut().enumerate() {
            *value = inverse[(row, col)] * variance;
            if !value.is_finite() {
                return Err(FitError::SingularCovariance);
            }
        }
    }
    Ok(covariance)
}

fn sum_of_squares(values: &[f64]) -> f64 {
    values.iter().map(|value| value * value).sum()
}
