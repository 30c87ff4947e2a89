//! Closed-form planar-undulator quantities.

use crate::domain::RunParameters;
use crate::numerics::{bessel_j0, bessel_j1};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UndulatorDomainError {
    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },
    #[error("{name} must be > 0, got {value}")]
    NonPositiveWavelength { name: &'static str, value: f64 },
    #[error("detuning period count rounds to zero for k={k}, ngap={ngap}")]
    ZeroPeriodCount { k: f64, ngap: f64 },
    #[error("detuning radicand {radicand} is negative for k={k}, ngap={ngap}")]
    NegativeRadicand { k: f64, ngap: f64, radicand: f64 },
    #[error("run parameters do not define the undulator period 'xlamd'")]
    MissingUndulatorPeriod,
}

impl From<UndulatorDomainError> for crate::domain::FelError {
    fn from(error: UndulatorDomainError) -> Self {
        Self::computation("RUN.UNDULATOR_DOMAIN", error.to_string())
    }
}

/// Planar-undulator coupling factor `J0(a) - J1(a)` with `a = K^2 / (2 (1 + K^2))`.
pub fn calculate_jj(k: f64) -> f64 {
    let k_sq = k * k;
    let argument = k_sq / (1.0 + k_sq) / 2.0;
    bessel_j0(argument) - bessel_j1(argument)
}

/// Resonant Lorentz factor `sqrt(lambdau / (2 lambdas) * (1 + K^2))`.
pub fn calculate_gamma_res(lambdau: f64, lambdas: f64, k: f64) -> Result<f64, UndulatorDomainError> {
    require_finite("k", k)?;
    for (name, value) in [("lambdau", lambdau), ("lambdas", lambdas)] {
        require_finite(name, value)?;
        if value <= 0.0 {
            return Err(UndulatorDomainError::NonPositiveWavelength { name, value });
        }
    }
    Ok(((lambdau / (2.0 * lambdas)) * (1.0 + k * k)).sqrt())
}

/// [`calculate_gamma_res`] with `xlamd` and `xlamds` taken from the run.
pub fn calculate_gamma_res_for_run(
    parameters: &RunParameters,
    k: f64,
) -> Result<f64, UndulatorDomainError> {
    let lambdau = parameters
        .xlamd
        .ok_or(UndulatorDomainError::MissingUndulatorPeriod)?;
    calculate_gamma_res(lambdau, parameters.xlamds, k)
}

/// Detuning parameter `sqrt((1 + K^2 - ngap/np) / (ngap/np))` with
/// `np = ceil(ngap / (1 + K^2))`.
pub fn calculate_ad(k: f64, ngap: f64) -> Result<f64, UndulatorDomainError> {
    require_finite("k", k)?;
    require_finite("ngap", ngap)?;

    let one_plus_k_sq = 1.0 + k * k;
    let periods = (ngap / one_plus_k_sq).ceil();
    if periods == 0.0 {
        return Err(UndulatorDomainError::ZeroPeriodCount { k, ngap });
    }

    let ratio = ngap / periods;
    let radicand = (one_plus_k_sq - ratio) / ratio;
    if !radicand.is_finite() || radicand < 0.0 {
        return Err(UndulatorDomainError::NegativeRadicand { k, ngap, radicand });
    }
    Ok(radicand.sqrt())
}

fn require_finite(name: &'static str, value: f64) -> Result<(), UndulatorDomainError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(UndulatorDomainError::NonFinite { name, value })
    }
}
