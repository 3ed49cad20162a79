use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::matrix::MatrixView;
use crate::scalar::Scalar;
use crate::shape::Shape;
use crate::storage::CpuStorage;

/// A dense tensor backed by CPU storage.
///
/// Holds contiguous, row-major data with an associated shape. Tensors of
/// rank >= 2 are read as a batch of matrices: the trailing two dimensions are
/// `rows x cols` and the batch index runs over the leading dimensions in
/// row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    storage: CpuStorage,
    shape: Shape,
}

impl Tensor {
    /// Create a new tensor from data and a shape.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`.
    pub fn new<T: Scalar>(data: Vec<T>, shape: Shape) -> Self {
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {:?} (numel={})",
            data.len(),
            shape,
            shape.numel()
        );
        Tensor {
            storage: CpuStorage::from_vec(data),
            shape,
        }
    }

    /// Create a zero-filled tensor with the given dtype and shape.
    pub fn zeros(dtype: DType, shape: Shape) -> Self {
        let n = shape.numel();
        Tensor {
            storage: CpuStorage::zeros(dtype, n),
            shape,
        }
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Returns the underlying storage reference.
    pub fn storage(&self) -> &CpuStorage {
        &self.storage
    }

    /// Returns the underlying data as a slice of `T`.
    pub fn data<T: Scalar>(&self) -> Result<&[T]> {
        self.storage.as_slice()
    }

    /// Returns the underlying data as a mutable slice of `T`.
    pub fn data_mut<T: Scalar>(&mut self) -> Result<&mut [T]> {
        self.storage.as_slice_mut()
    }

    /// Borrow matrix `index` of a batched tensor.
    ///
    /// # Errors
    /// Fails if the tensor has rank < 2, holds a different dtype, or `index`
    /// is outside the batch.
    pub fn matrix<T: Scalar>(&self, index: usize) -> Result<MatrixView<'_, T>> {
        let (rows, cols, range) = self.matrix_range(index)?;
        MatrixView::new(&self.data::<T>()?[range], rows, cols)
    }

    fn matrix_range(&self, index: usize) -> Result<(usize, usize, std::ops::Range<usize>)> {
        let (rows, cols) = self.shape.matrix_dims().ok_or_else(|| {
            TensorError::Other(format!(
                "expected a matrix or batch of matrices, got shape {}",
                self.shape
            ))
        })?;
        let batch_size = self.shape.batch_size();
        if index >= batch_size {
            return Err(TensorError::InvalidIndex { index, batch_size });
        }
        let stride = rows * cols;
        Ok((rows, cols, index * stride..(index + 1) * stride))
    }
}
