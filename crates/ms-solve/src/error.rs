use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolveError {
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("input matrix is not invertible")]
    NotInvertible,
    #[error("{op} expects {expected}, got input rank {input} and rhs rank {rhs}")]
    InvalidRank {
        op: &'static str,
        expected: &'static str,
        input: usize,
        rhs: usize,
    },
    #[error("unknown op: {0}")]
    UnknownOp(String),
    #[error("batch index {index}: {source}")]
    Batch {
        index: usize,
        #[source]
        source: Box<SolveError>,
    },
    #[error("tensor error: {0}")]
    Tensor(#[from] ms_tensor::TensorError),
}

impl SolveError {
    /// The error with any `Batch` wrapping removed.
    pub fn root(&self) -> &SolveError {
        match self {
            SolveError::Batch { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_invertible(&self) -> bool {
        matches!(self.root(), SolveError::NotInvertible)
    }

    /// True for operand-shape violations, including rank errors and
    /// view-construction mismatches.
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(
            self.root(),
            SolveError::ShapeMismatch(_)
                | SolveError::InvalidRank { .. }
                | SolveError::Tensor(ms_tensor::TensorError::ShapeMismatch { .. })
        )
    }

    /// Batch index of the failing pair, if the error came from a batch.
    pub fn batch_index(&self) -> Option<usize> {
        match self {
            SolveError::Batch { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SolveError>;
