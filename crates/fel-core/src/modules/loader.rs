//! Reads the output parser's slice structure from its JSON form.

use crate::domain::{DatasetError, RunParameters, SliceDataset, SliceRecord};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ParsedOutput {
    slice_data: Vec<SliceRecord>,
    input_parameters: RunParameters,
}

impl SliceDataset {
    pub fn from_json_str(source: &str) -> Result<Self, DatasetError> {
        let parsed: ParsedOutput =
            serde_json::from_str(source).map_err(|source| DatasetError::Parse { source })?;
        Self::new(parsed.slice_data, parsed.input_parameters)
    }
}

pub fn load_slice_dataset(path: impl AsRef<Path>) -> Result<SliceDataset, DatasetError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| DatasetError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = SliceDataset::from_json_str(&source)?;

    debug!(
        path = %path.display(),
        slices = dataset.slice_count(),
        zsep = dataset.zsep(),
        xlamds = dataset.xlamds(),
        "loaded slice dataset"
    );

    Ok(dataset)
}
