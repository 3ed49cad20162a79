use ms_tensor::{MatrixView, MatrixViewMut, Scalar};

use crate::error::{Result, SolveError};
use crate::lu::LuFactorization;

/// Solve `A @ X = B` for one pair, writing `X` into `out`.
///
/// `a` must be square with as many rows as `b`, and `out` must be
/// `a.rows() x b.cols()`; otherwise `ShapeMismatch` is returned before
/// anything is written. An empty system (`a` is 0x0) succeeds without
/// touching `out`.
///
/// Singularity detection is deliberately weak: the solve fails with
/// `NotInvertible` only when the smallest absolute pivot of the partial-pivot
/// LU is not strictly positive (exact zero, or NaN). Near-singular matrices
/// pass. After `NotInvertible` the contents of `out` are unspecified.
pub fn solve<T: Scalar>(
    a: MatrixView<'_, T>,
    b: MatrixView<'_, T>,
    out: MatrixViewMut<'_, T>,
) -> Result<()> {
    if !a.is_square() {
        return Err(SolveError::ShapeMismatch(format!(
            "input matrix must be square, got {}x{}",
            a.rows(),
            a.cols()
        )));
    }
    if a.rows() != b.rows() {
        return Err(SolveError::ShapeMismatch(format!(
            "input matrix and rhs are incompatible: {} rows vs {} rows",
            a.rows(),
            b.rows()
        )));
    }
    if out.rows() != a.rows() || out.cols() != b.cols() {
        return Err(SolveError::ShapeMismatch(format!(
            "output is {}x{} but the solution is {}x{}",
            out.rows(),
            out.cols(),
            a.rows(),
            b.cols()
        )));
    }

    // Zero equations: the solution is the empty matrix.
    if a.rows() == 0 {
        return Ok(());
    }

    let lu = LuFactorization::factorize(a)?;

    // Guards against exact zero pivots only, e.g. exactly singular integer
    // valued input or subnormals flushed to zero.
    // TODO: reject near-singular input via a condition number estimate.
    let min_abs_pivot = lu.min_abs_pivot();
    if min_abs_pivot.is_nan() || min_abs_pivot <= T::zero() {
        return Err(SolveError::NotInvertible);
    }

    lu.solve_into(b, out)
}
