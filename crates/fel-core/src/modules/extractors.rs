use crate::domain::{DatasetError, SliceQuantity, SliceRecord};
use crate::numerics::DenseRealMatrix;

/// Stacks one per-step quantity into an `[n_slices x n_steps]` matrix, one
/// row per slice in slice order.
pub fn stack_quantity(
    slices: &[SliceRecord],
    quantity: SliceQuantity,
) -> Result<DenseRealMatrix, DatasetError> {
    let Some(first) = slices.first() else {
        return Err(DatasetError::EmptyDataset);
    };
    let steps = first.require(0, quantity)?.len();

    let mut stacked = DenseRealMatrix::zeros(slices.len(), steps);
    for (row, slice) in slices.iter().enumerate() {
        let samples = slice.require(row, quantity)?;
        if samples.len() != steps {
            return Err(DatasetError::InconsistentLength {
                key: quantity.as_str().to_string(),
                slice: row,
                expected: steps,
                actual: samples.len(),
            });
        }
        for (col, value) in samples.iter().enumerate() {
            stacked[(row, col)] = *value;
        }
    }

    Ok(stacked)
}

pub fn power(slices: &[SliceRecord]) -> Result<DenseRealMatrix, DatasetError> {
    stack_quantity(slices, SliceQuantity::Power)
}

pub fn espread(slices: &[SliceRecord]) -> Result<DenseRealMatrix, DatasetError> {
    stack_quantity(slices, SliceQuantity::EnergySpread)
}

pub fn bunching(slices: &[SliceRecord]) -> Result<DenseRealMatrix, DatasetError> {
    stack_quantity(slices, SliceQuantity::Bunching)
}

/// Beam current of every slice.
pub fn current_profile(slices: &[SliceRecord]) -> Vec<f64> {
    slices.iter().map(|slice| slice.current).collect()
}
