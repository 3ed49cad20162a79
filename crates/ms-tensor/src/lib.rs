//! `ms-tensor` - Dense tensor container and matrix views for matsolve.
//!
//! This crate provides:
//! - A `Tensor` type backed by owned CPU storage (f32 or f64)
//! - Borrowed row-major `MatrixView` / `MatrixViewMut` for per-matrix kernels
//! - The `Scalar` trait the kernels are generic over
//! - Shape utilities for batched matrix operands
//! - A reference CPU `matmul` used for residual checks

pub mod cpu;
pub mod dtype;
pub mod error;
pub mod matrix;
pub mod scalar;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use dtype::DType;
pub use error::{Result, TensorError};
pub use matrix::{MatrixView, MatrixViewMut};
pub use scalar::Scalar;
pub use shape::Shape;
pub use storage::CpuStorage;
pub use tensor::Tensor;
