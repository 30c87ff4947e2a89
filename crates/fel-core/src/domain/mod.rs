pub mod errors;

pub use errors::{FelError, FelErrorCategory, FelResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Named per-step arrays recorded for every slice by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SliceQuantity {
    Power,
    EnergySpread,
    Bunching,
    PowerMid,
    PhaseMid,
}

impl SliceQuantity {
    pub const ALL: [SliceQuantity; 5] = [
        Self::Power,
        Self::EnergySpread,
        Self::Bunching,
        Self::PowerMid,
        Self::PhaseMid,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::EnergySpread => "e-spread",
            Self::Bunching => "bunching",
            Self::PowerMid => "p_mid",
            Self::PhaseMid => "phi_mid",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|quantity| quantity.as_str() == key)
    }
}

impl Display for SliceQuantity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("slice dataset requires at least one slice")]
    EmptyDataset,
    #[error("slice {slice} is missing quantity '{key}'")]
    MissingQuantity { slice: usize, key: String },
    #[error("slice {slice} has no samples for quantity '{key}'")]
    EmptyQuantity { slice: usize, key: String },
    #[error(
        "quantity '{key}' has {actual} samples in slice {slice}, expected {expected} as in slice 0"
    )]
    InconsistentLength {
        key: String,
        slice: usize,
        expected: usize,
        actual: usize,
    },
    #[error("slice {slice} has negative final on-axis power {value}")]
    NegativePower { slice: usize, value: f64 },
    #[error("failed to read slice dataset '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse slice dataset: {source}")]
    Parse { source: serde_json::Error },
}

impl From<DatasetError> for FelError {
    fn from(error: DatasetError) -> Self {
        match error {
            DatasetError::Read { .. } => FelError::io_system("IO.DATASET_READ", error.to_string()),
            _ => FelError::input_validation("INPUT.DATASET", error.to_string()),
        }
    }
}

/// One longitudinal sample of the bunch and its radiation, tracked through
/// every integration step along the undulator.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct SliceRecord {
    pub current: f64,
    #[serde(default)]
    pub data: BTreeMap<String, Vec<f64>>,
}

impl SliceRecord {
    pub fn new(current: f64) -> Self {
        Self {
            current,
            data: BTreeMap::new(),
        }
    }

    pub fn with_quantity(mut self, quantity: SliceQuantity, samples: Vec<f64>) -> Self {
        self.data.insert(quantity.as_str().to_string(), samples);
        self
    }

    pub fn samples(&self, quantity: SliceQuantity) -> Option<&[f64]> {
        self.data.get(quantity.as_str()).map(Vec::as_slice)
    }

    /// Samples of `quantity`, failing with the slice index when the key is absent.
    pub fn require(&self, slice: usize, quantity: SliceQuantity) -> Result<&[f64], DatasetError> {
        self.samples(quantity)
            .ok_or_else(|| DatasetError::MissingQuantity {
                slice,
                key: quantity.as_str().to_string(),
            })
    }

    /// Last sample of `quantity`, i.e. its value at the end of the undulator.
    pub fn final_sample(&self, slice: usize, quantity: SliceQuantity) -> Result<f64, DatasetError> {
        self.require(slice, quantity)?
            .last()
            .copied()
            .ok_or_else(|| DatasetError::EmptyQuantity {
                slice,
                key: quantity.as_str().to_string(),
            })
    }
}

/// Global run parameters echoed by the simulation output.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunParameters {
    /// Slice separation in units of the radiation wavelength.
    pub zsep: f64,
    /// Radiation wavelength in meters.
    pub xlamds: f64,
    /// Undulator period in meters.
    #[serde(default)]
    pub xlamd: Option<f64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl RunParameters {
    pub fn new(zsep: f64, xlamds: f64) -> Self {
        Self {
            zsep,
            xlamds,
            xlamd: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_undulator_period(mut self, xlamd: f64) -> Self {
        self.xlamd = Some(xlamd);
        self
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        match name {
            "zsep" => Some(self.zsep),
            "xlamds" => Some(self.xlamds),
            "xlamd" => self.xlamd,
            _ => self.extra.get(name).and_then(serde_json::Value::as_f64),
        }
    }
}

/// Parsed simulation output: the ordered slices plus run parameters.
///
/// The slice order is the physical position along the bunch and is never
/// rearranged. The slice count is always derived from `slices`.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceDataset {
    slices: Vec<SliceRecord>,
    parameters: RunParameters,
}

impl SliceDataset {
    pub fn new(slices: Vec<SliceRecord>, parameters: RunParameters) -> Result<Self, DatasetError> {
        if slices.is_empty() {
            return Err(DatasetError::EmptyDataset);
        }
        Ok(Self { slices, parameters })
    }

    pub fn slices(&self) -> &[SliceRecord] {
        &self.slices
    }

    pub fn parameters(&self) -> &RunParameters {
        &self.parameters
    }

    pub fn slice_count(&self) -> usize {
        self.slices.len()
    }

    pub fn zsep(&self) -> f64 {
        self.parameters.zsep
    }

    pub fn xlamds(&self) -> f64 {
        self.parameters.xlamds
    }

    pub fn xlamd(&self) -> Option<f64> {
        self.parameters.xlamd
    }
}
