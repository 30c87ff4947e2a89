use fel_core::common::{AnalysisConfig, FrequencyAxisConvention, PeakFitConfig};
use fel_core::common::constants::PI2;
use fel_core::domain::{FelErrorCategory, RunParameters, SliceDataset, SliceQuantity, SliceRecord};
use fel_core::modules::{
    analyze_final_spectrum, bunching, calculate_gamma_res_for_run, current_profile, espread,
    load_slice_dataset, power,
};
use fel_core::numerics::{
    FrequencyAxisInput, argmax, frequency_axis_ev, frequency_bin_width_ev,
    nominal_photon_energy_ev, power_spectrum,
};
use std::fs;
use tempfile::TempDir;

const SLICES: usize = 256;
const STEPS: usize = 5;
const PULSE_CENTER: f64 = 100.0;
const PULSE_RMS_SLICES: f64 = 4.0;
const DETUNING_BINS: usize = 20;
const ZSEP: f64 = 80.0;
const XLAMDS: f64 = 1.5e-9;
const XLAMD: f64 = 0.03;

// Gaussian field envelope with a linear phase ramp: the spectrum is a Gaussian
// of rms width SLICES / (4 pi PULSE_RMS_SLICES) bins, DETUNING_BINS above the center.
fn gaussian_pulse_slice(index: usize) -> SliceRecord {
    let offset = index as f64 - PULSE_CENTER;
    let exit_power = (-(offset * offset) / (2.0 * PULSE_RMS_SLICES * PULSE_RMS_SLICES)).exp();
    let exit_phase = PI2 * (DETUNING_BINS * index) as f64 / SLICES as f64;
    let growth: Vec<f64> = (0..STEPS)
        .map(|step| exit_power * (step + 1) as f64 / STEPS as f64)
        .collect();

    SliceRecord::new(500.0 + index as f64)
        .with_quantity(SliceQuantity::Power, growth.clone())
        .with_quantity(SliceQuantity::EnergySpread, vec![1.0e-4; STEPS])
        .with_quantity(SliceQuantity::Bunching, vec![0.01; STEPS])
        .with_quantity(SliceQuantity::PowerMid, growth)
        .with_quantity(SliceQuantity::PhaseMid, vec![exit_phase; STEPS])
}

fn gaussian_pulse_dataset() -> SliceDataset {
    let slices = (0..SLICES).map(gaussian_pulse_slice).collect();
    let parameters = RunParameters::new(ZSEP, XLAMDS).with_undulator_period(XLAMD);
    SliceDataset::new(slices, parameters).expect("synthetic dataset should build")
}

#[test]
fn extractors_stack_every_slice_and_step() {
    let dataset = gaussian_pulse_dataset();
    let slices = dataset.slices();

    for stacked in [
        power(slices).expect("power"),
        espread(slices).expect("espread"),
        bunching(slices).expect("bunching"),
    ] {
        assert_eq!((stacked.nrows(), stacked.ncols()), (SLICES, STEPS));
    }

    let currents = current_profile(slices);
    assert_eq!(currents.len(), SLICES);
    assert_eq!(currents[0], 500.0);
    assert_eq!(currents[SLICES - 1], 500.0 + (SLICES - 1) as f64);
}

#[test]
fn spectrum_and_axis_share_the_centered_bin_convention() {
    let dataset = gaussian_pulse_dataset();
    let spectrum = power_spectrum(dataset.slices()).expect("spectrum should build");
    let input = FrequencyAxisInput::new(dataset.zsep(), dataset.slice_count(), dataset.xlamds());
    let axis = frequency_axis_ev(input, FrequencyAxisConvention::BinCentered)
        .expect("axis should build");

    assert_eq!(spectrum.len(), axis.len());
    let peak = argmax(&spectrum).expect("non-empty spectrum");
    assert_eq!(peak, SLICES / 2 + DETUNING_BINS);

    let df = frequency_bin_width_ev(input).expect("bin width");
    let expected_energy = nominal_photon_energy_ev(XLAMDS) + DETUNING_BINS as f64 * df;
    assert!((axis[peak] - expected_energy).abs() <= 1.0e-9 * expected_energy);
}

#[test]
fn gaussian_pulse_spectrum_width_is_recovered() {
    let dataset = gaussian_pulse_dataset();
    let analysis = analyze_final_spectrum(&dataset, &AnalysisConfig::default())
        .expect("analysis should succeed");

    let df = frequency_bin_width_ev(FrequencyAxisInput::new(ZSEP, SLICES, XLAMDS))
        .expect("bin width");
    let expected_sigma = SLICES as f64 / (2.0 * PI2 * PULSE_RMS_SLICES) * df;
    let expected_mean = nominal_photon_energy_ev(XLAMDS) + DETUNING_BINS as f64 * df;

    assert!((analysis.fit.sigma() - expected_sigma).abs() <= 0.01 * expected_sigma);
    assert!((analysis.fit.centroid() - expected_mean).abs() <= 0.01 * expected_sigma);
    assert!((analysis.fwhm() - 2.354_820_045 * expected_sigma).abs() <= 0.01 * expected_sigma);
    assert_eq!(analysis.power_spectrum.len(), SLICES);
    assert_eq!(analysis.photon_energy_ev.len(), SLICES);

    let summary = analysis.summary_lines();
    assert!(summary[0].starts_with("Fitted mean = "));
    assert!(summary[1].starts_with("Fitted standard deviation = "));
    assert!(summary[2].starts_with("Fitted FWHM = "));
}

#[test]
fn narrow_window_configuration_is_honored() {
    let dataset = gaussian_pulse_dataset();
    let config = AnalysisConfig {
        peak_fit: PeakFitConfig::default().with_half_window(5),
        ..AnalysisConfig::default()
    };

    let analysis = analyze_final_spectrum(&dataset, &config).expect("analysis should succeed");
    assert_eq!(analysis.fit.window_end - analysis.fit.window_start, 10);
}

#[test]
fn peak_at_spectrum_edge_reports_insufficient_window() {
    let slices = (0..64)
        .map(|index| {
            let phase = PI2 * (27 * index) as f64 / 64.0;
            SliceRecord::new(1.0)
                .with_quantity(SliceQuantity::PowerMid, vec![1.0])
                .with_quantity(SliceQuantity::PhaseMid, vec![phase])
        })
        .collect();
    let dataset = SliceDataset::new(slices, RunParameters::new(ZSEP, XLAMDS)).expect("dataset");

    let error = analyze_final_spectrum(&dataset, &AnalysisConfig::default())
        .expect_err("peak near the upper edge must be rejected");
    assert_eq!(error.category(), FelErrorCategory::ComputationError);
    assert_eq!(error.placeholder(), "RUN.PEAK_WINDOW");
    assert!(error.message().contains("insufficient window"));
}

#[test]
fn dataset_loaded_from_disk_feeds_the_full_pipeline() {
    let dataset = gaussian_pulse_dataset();
    let slice_data: Vec<serde_json::Value> = dataset
        .slices()
        .iter()
        .map(|slice| serde_json::to_value(slice).expect("slice should serialize"))
        .collect();
    let document = serde_json::json!({
        "slice_data": slice_data,
        "input_parameters": {"zsep": ZSEP, "xlamds": XLAMDS, "xlamd": XLAMD, "nslice": SLICES},
    });

    let temp = TempDir::new().expect("tempdir should be created");
    let path = temp.path().join("pulse.json");
    fs::write(&path, document.to_string()).expect("dataset should be written");

    let loaded = load_slice_dataset(&path).expect("dataset should load");
    assert_eq!(loaded.slices(), dataset.slices());
    assert_eq!(loaded.parameters().get_f64("nslice"), Some(SLICES as f64));

    let from_disk = analyze_final_spectrum(&loaded, &AnalysisConfig::default())
        .expect("analysis should succeed");
    let in_memory = analyze_final_spectrum(&dataset, &AnalysisConfig::default())
        .expect("analysis should succeed");
    assert_eq!(from_disk, in_memory);

    let gamma = calculate_gamma_res_for_run(loaded.parameters(), 1.0).expect("gamma");
    assert!((gamma - (XLAMD / (2.0 * XLAMDS) * 2.0_f64).sqrt()).abs() <= 1.0e-6);
}
