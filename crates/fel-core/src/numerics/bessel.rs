//! Cylindrical Bessel functions of the first kind for real arguments.
//!
//! Small and moderate arguments use the ascending power series; large
//! arguments use the Hankel asymptotic expansion.

use std::f64::consts::{FRAC_PI_4, PI};

const SERIES_CUTOFF: f64 = 12.0;
const SERIES_MAX_ITER: usize = 200;
const SERIES_REL_TOL: f64 = 1.0e-17;
const ASYMPTOTIC_MAX_TERMS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BesselOrder {
    Zero,
    One,
}

impl BesselOrder {
    const fn as_f64(self) -> f64 {
        match self {
            Self::Zero => 0.0,
            Self::One => 1.0,
        }
    }
}

/// `J0(x)`. Even in `x`.
pub fn bessel_j0(x: f64) -> f64 {
    let magnitude = x.abs();
    if magnitude < SERIES_CUTOFF {
        ascending_series(BesselOrder::Zero, magnitude)
    } else {
        hankel_asymptotic(BesselOrder::Zero, magnitude)
    }
}

/// `J1(x)`. Odd in `x`.
pub fn bessel_j1(x: f64) -> f64 {
    let magnitude = x.abs();
    let value = if magnitude < SERIES_CUTOFF {
        ascending_series(BesselOrder::One, magnitude)
    } else {
        hankel_asymptotic(BesselOrder::One, magnitude)
    };
    if x.is_sign_negative() { -value } else { value }
}

// J_n(x) = (x/2)^n * sum_k (-x^2/4)^k / (k! (k+n)!)
fn ascending_series(order: BesselOrder, x: f64) -> f64 {
    let quarter_x_sq = 0.25 * x * x;
    let prefactor = match order {
        BesselOrder::Zero => 1.0,
        BesselOrder::One => 0.5 * x,
    };
    let shift = order.as_f64();

    let mut term = 1.0;
    let mut sum = 1.0;
    for k in 1..=SERIES_MAX_ITER {
        let k = k as f64;
        term *= -quarter_x_sq / (k * (k + shift));
        sum += term;
        if term.abs() <= SERIES_REL_TOL * sum.abs() {
            break;
        }
    }

    prefactor * sum
}

// J_n(x) ~ sqrt(2/(pi x)) * (P cos(chi) - Q sin(chi)), chi = x - (n/2 + 1/4) pi
fn hankel_asymptotic(order: BesselOrder, x: f64) -> f64 {
    let mu = 4.0 * order.as_f64() * order.as_f64();
    let eight_x = 8.0 * x;

    let mut p = 1.0;
    let mut q = 0.0;
    let mut term = 1.0;
    let mut previous_magnitude = f64::INFINITY;
    for k in 1..=ASYMPTOTIC_MAX_TERMS {
        let odd = (2 * k - 1) as f64;
        term *= (mu - odd * odd) / (k as f64 * eight_x);
        let magnitude = term.abs();
        if magnitude >= previous_magnitude {
            break;
        }
        previous_magnitude = magnitude;

        // Terms alternate between Q (odd k) and P (even k) with a sign flip every two.
        match k % 4 {
            1 => q += term,
            2 => p -= term,
            3 => q -= term,
            _ => p += term,
        }
    }

    let chi = x - (0.5 * order.as_f64() * PI + FRAC_PI_4);
    (2.0 / (PI * x)).sqrt() * (p * chi.cos() - q * chi.sin())
}
