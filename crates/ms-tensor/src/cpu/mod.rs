//! Reference CPU kernels.
//!
//! Straight loops optimized for correctness rather than peak performance.
//! Used to verify solve results (`A @ X` against `B`).

use crate::error::{Result, TensorError};
use crate::matrix::MatrixView;
use crate::scalar::Scalar;

/// Matrix multiplication: C = A @ B.
///
/// - `a`: row-major `[m, k]`
/// - `b`: row-major `[k, n]`
/// - Returns: row-major data of shape `[m, n]`
pub fn matmul<T: Scalar>(a: MatrixView<'_, T>, b: MatrixView<'_, T>) -> Result<Vec<T>> {
    let (m, k) = (a.rows(), a.cols());
    let (k2, n) = (b.rows(), b.cols());
    if k != k2 {
        return Err(TensorError::MatmulMismatch { m, k, k2, n });
    }

    let mut c = vec![T::zero(); m * n];
    for i in 0..m {
        let a_row = a.row(i);
        let c_row = &mut c[i * n..(i + 1) * n];
        for (p, &a_ip) in a_row.iter().enumerate() {
            for (c_ij, &b_pj) in c_row.iter_mut().zip(b.row(p)) {
                *c_ij = *c_ij + a_ip * b_pj;
            }
        }
    }
    Ok(c)
}

/// Largest absolute row sum (the infinity norm) of a matrix.
pub fn norm_inf<T: Scalar>(a: MatrixView<'_, T>) -> T {
    (0..a.rows())
        .map(|i| a.row(i).iter().fold(T::zero(), |acc, &x| acc + x.abs()))
        .fold(T::zero(), |acc, s| acc.max(s))
}
