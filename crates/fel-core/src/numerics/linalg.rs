use faer::Mat;

pub type DenseRealMatrix = Mat<f64>;

const SINGULAR_RELATIVE_PIVOT_EPSILON: f64 = 1.0e-14;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LuError {
    #[error("LU factorization requires a square matrix, got {rows}x{cols}")]
    NonSquareMatrix { rows: usize, cols: usize },
    #[error("LU factorization requires a non-empty matrix")]
    EmptyMatrix,
    #[error("matrix is singular at pivot index {pivot_index}")]
    SingularMatrix { pivot_index: usize },
    #[error("right-hand side length mismatch: expected {expected}, got {actual}")]
    RhsLengthMismatch { expected: usize, actual: usize },
}

/// Row-pivoted LU factors of a square real matrix, stored packed with the
/// unit lower triangle below the diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct LuDecomposition {
    lu: DenseRealMatrix,
    pivots: Vec<usize>,
}

impl LuDecomposition {
    pub fn dimension(&self) -> usize {
        self.lu.nrows()
    }

    pub fn solve(&self, rhs: &[f64]) -> Result<Vec<f64>, LuError> {
        let dimension = self.dimension();
        if rhs.len() != dimension {
            return Err(LuError::RhsLengthMismatch {
                expected: dimension,
                actual: rhs.len(),
            });
        }

        let mut forward = vec![0.0; dimension];
        for row in 0..dimension {
            let mut value = rhs[self.pivots[row]];
            for col in 0..row {
                value -= self.lu[(row, col)] * forward[col];
            }
            forward[row] = value;
        }

        let mut solution = vec![0.0; dimension];
        for row in (0..dimension).rev() {
            let mut value = forward[row];
            for col in (row + 1)..dimension {
                value -= self.lu[(row, col)] * solution[col];
            }
            solution[row] = value / self.lu[(row, row)];
        }

        Ok(solution)
    }

    pub fn invert(&self) -> Result<DenseRealMatrix, LuError> {
        let dimension = self.dimension();
        let mut inverse = DenseRealMatrix::zeros(dimension, dimension);
        let mut basis = vec![0.0; dimension];

        for col in 0..dimension {
            basis.fill(0.0);
            basis[col] = 1.0;

            let solution = self.solve(&basis)?;
            for row in 0..dimension {
                inverse[(row, col)] = solution[row];
            }
        }

        Ok(inverse)
    }
}

pub fn lu_factorize(matrix: &DenseRealMatrix) -> Result<LuDecomposition, LuError> {
    let dimension = validate_square_shape(matrix)?;
    let pivot_floor = matrix_infinity_norm(matrix) * SINGULAR_RELATIVE_PIVOT_EPSILON;
    let mut lu = matrix.clone();
    let mut pivots: Vec<usize> = (0..dimension).collect();

    for pivot_col in 0..dimension {
        let pivot_row = select_pivot_row(&lu, pivot_col);
        if pivot_row != pivot_col {
            swap_rows(&mut lu, pivot_col, pivot_row);
            pivots.swap(pivot_col, pivot_row);
        }

        let pivot = lu[(pivot_col, pivot_col)];
        if !pivot.is_finite() || pivot.abs() <= pivot_floor {
            return Err(LuError::SingularMatrix {
                pivot_index: pivot_col,
            });
        }

        for row in (pivot_col + 1)..dimension {
            lu[(row, pivot_col)] /= pivot;
            let multiplier = lu[(row, pivot_col)];
            for col in (pivot_col + 1)..dimension {
                let updated = lu[(row, col)] - multiplier * lu[(pivot_col, col)];
                lu[(row, col)] = updated;
            }
        }
    }

    Ok(LuDecomposition { lu, pivots })
}

pub fn lu_solve(matrix: &DenseRealMatrix, rhs: &[f64]) -> Result<Vec<f64>, LuError> {
    lu_factorize(matrix)?.solve(rhs)
}

pub fn lu_invert(matrix: &DenseRealMatrix) -> Result<DenseRealMatrix, LuError> {
    lu_factorize(matrix)?.invert()
}

fn validate_square_shape(matrix: &DenseRealMatrix) -> Result<usize, LuError> {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    if rows == 0 || cols == 0 {
        return Err(LuError::EmptyMatrix);
    }
    if rows != cols {
        return Err(LuError::NonSquareMatrix { rows, cols });
    }

    Ok(rows)
}

fn select_pivot_row(matrix: &DenseRealMatrix, pivot_col: usize) -> usize {
    let mut best_row = pivot_col;
    let mut best_abs = matrix[(pivot_col, pivot_col)].abs();

    for row in (pivot_col + 1)..matrix.nrows() {
        let candidate = matrix[(row, pivot_col)].abs();
        if candidate > best_abs {
            best_abs = candidate;
            best_row = row;
        }
    }

    best_row
}

fn swap_rows(matrix: &mut DenseRealMatrix, lhs: usize, rhs: usize) {
    for col in 0..matrix.ncols() {
        let value = matrix[(lhs, col)];
        matrix[(lhs, col)] = matrix[(rhs, col)];
        matrix[(rhs, col)] = value;
    }
}

fn matrix_infinity_norm(matrix: &DenseRealMatrix) -> f64 {
    let mut best_row_sum: f64 = 0.0;
    for row in 0..matrix.nrows() {
        let mut row_sum = 0.0;
        for col in 0..matrix.ncols() {
            row_sum += matrix[(row, col)].abs();
        }
        best_row_sum = best_row_sum.max(row_sum);
    }
    best_row_sum
}

#[cfg(test)]
mod tests {
    use super::{DenseRealMatrix, LuError, lu_factorize, lu_invert, lu_solve};

    fn dense_matrix(rows: &[&[f64]]) -> DenseRealMatrix {
        let mut matrix = DenseRealMatrix::zeros(rows.len(), rows[0].len());
        for (row, values) in rows.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                matrix[(row, col)] = *value;
            }
        }
        matrix
    }

    #[test]
    fn lu_solve_matches_known_solution_with_pivoting() {
        let matrix = dense_matrix(&[&[0.0, 2.0, 1.0], &[1.0, -2.0, -3.0], &[2.0, 3.0, 1.0]]);
        let expected = [1.0, -2.0, 3.0];
        let rhs: Vec<f64> = (0..3)
            .map(|row| (0..3).map(|col| matrix[(row, col)] * expected[col]).sum())
            .collect();

        let solution = lu_solve(&matrix, &rhs).expect("system should be solvable");
        for (actual, expected) in solution.iter().zip(expected) {
            assert!((actual - expected).abs() <= 1.0e-12);
        }
    }

    #[test]
    fn lu_invert_produces_identity_product() {
        let matrix = dense_matrix(&[&[4.0, 1.0], &[2.0, 3.0]]);
        let inverse = lu_invert(&matrix).expect("matrix should be invertible");

        for row in 0..2 {
            for col in 0..2 {
                let product: f64 = (0..2).map(|k| matrix[(row, k)] * inverse[(k, col)]).sum();
                let identity = if row == col { 1.0 } else { 0.0 };
                assert!((product - identity).abs() <= 1.0e-12);
            }
        }
    }

    #[test]
    fn singular_and_malformed_matrices_are_rejected() {
        let singular = dense_matrix(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert!(matches!(
            lu_factorize(&singular),
            Err(LuError::SingularMatrix { pivot_index: 1 })
        ));

        let rectangular = DenseRealMatrix::zeros(2, 3);
        assert_eq!(
            lu_factorize(&rectangular),
            Err(LuError::NonSquareMatrix { rows: 2, cols: 3 })
        );
        assert_eq!(
            lu_factorize(&DenseRealMatrix::zeros(0, 0)),
            Err(LuError::EmptyMatrix)
        );

        let identity = dense_matrix(&[&[1.0, 0.0], &[0.0, 1.0]]);
        assert_eq!(
            lu_solve(&identity, &[1.0]),
            Err(LuError::RhsLengthMismatch {
                expected: 2,
                actual: 1
            })
        );
    }
}
