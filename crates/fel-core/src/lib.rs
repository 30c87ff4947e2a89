//! Post-processing for time-dependent FEL simulation output.
//!
//! Slice data produced by an external output parser is turned into stacked
//! per-slice quantities, the end-of-undulator radiation spectrum, its photon
//! energy axis and a Gaussian estimate of the spectral width. A few closed-form
//! undulator formulas live alongside.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
