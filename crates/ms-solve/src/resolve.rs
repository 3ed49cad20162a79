use ms_tensor::Shape;

use crate::error::{Result, SolveError};

/// Shape of `X` in `A @ X = B`.
///
/// The output keeps `input`'s batch and row structure and takes its last
/// dimension (the column count) from `rhs`. Only ranks are validated here;
/// the square and row-count checks happen per pair in [`crate::solve`].
///
/// # Errors
/// `ShapeMismatch` if the ranks differ or the shapes are rank 0.
pub fn output_shape(input: &Shape, rhs: &Shape) -> Result<Shape> {
    if input.ndim() != rhs.ndim() {
        return Err(SolveError::ShapeMismatch(format!(
            "input {} and rhs {} have different ranks",
            input, rhs
        )));
    }
    let cols = match rhs.dims().last() {
        Some(&cols) => cols,
        None => {
            return Err(SolveError::ShapeMismatch(
                "operands must have at least one dimension".to_string(),
            ))
        }
    };
    input.with_last_dim(cols).ok_or_else(|| {
        SolveError::ShapeMismatch("operands must have at least one dimension".to_string())
    })
}
