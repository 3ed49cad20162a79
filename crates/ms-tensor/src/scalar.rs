use std::fmt::{Debug, Display};

use num_traits::Float;

use crate::dtype::DType;
use crate::storage::CpuStorage;

/// Floating-point element type a matrix kernel can be instantiated with.
///
/// Implemented for `f32` and `f64`. The storage hooks let `Tensor` hand out
/// typed slices without knowing the concrete type at compile time.
pub trait Scalar: Float + Debug + Display + Default + Send + Sync + 'static {
    /// The runtime dtype tag for this scalar.
    const DTYPE: DType;

    /// Borrow the storage as a slice of `Self`, if the dtypes agree.
    fn slice(storage: &CpuStorage) -> Option<&[Self]>;

    /// Mutably borrow the storage as a slice of `Self`, if the dtypes agree.
    fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [Self]>;

    /// Wrap an owned vector in the matching storage variant.
    fn into_storage(data: Vec<Self>) -> CpuStorage;
}

impl Scalar for f32 {
    const DTYPE: DType = DType::F32;

    fn slice(storage: &CpuStorage) -> Option<&[f32]> {
        match storage {
            CpuStorage::F32(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [f32]> {
        match storage {
            CpuStorage::F32(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }

    fn into_storage(data: Vec<f32>) -> CpuStorage {
        CpuStorage::F32(data)
    }
}

impl Scalar for f64 {
    const DTYPE: DType = DType::F64;

    fn slice(storage: &CpuStorage) -> Option<&[f64]> {
        match storage {
            CpuStorage::F64(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    fn slice_mut(storage: &mut CpuStorage) -> Option<&mut [f64]> {
        match storage {
            CpuStorage::F64(v) => Some(v.as_mut_slice()),
            _ => None,
        }
    }

    fn into_storage(data: Vec<f64>) -> CpuStorage {
        CpuStorage::F64(data)
    }
}
