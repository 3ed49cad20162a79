use ms_solve::SolveError;

/// Status codes returned by all FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MSStatus {
    Ok = 0,
    ErrorInvalidArgument = 1,
    ErrorShapeMismatch = 2,
    ErrorNotInvertible = 3,
    ErrorInternal = 4,
}

impl From<&SolveError> for MSStatus {
    fn from(err: &SolveError) -> Self {
        if err.is_not_invertible() {
            MSStatus::ErrorNotInvertible
        } else if err.is_shape_mismatch() {
            MSStatus::ErrorShapeMismatch
        } else {
            MSStatus::ErrorInvalidArgument
        }
    }
}
