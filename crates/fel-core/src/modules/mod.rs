pub mod analysis;
pub mod extractors;
pub mod loader;
pub mod undulator;

pub use analysis::{SpectralAnalysis, analyze_final_spectrum};
pub use extractors::{bunching, current_profile, espread, power, stack_quantity};
pub use loader::load_slice_dataset;
pub use undulator::{
    UndulatorDomainError, calculate_ad, calculate_gamma_res, calculate_gamma_res_for_run,
    calculate_jj,
};
