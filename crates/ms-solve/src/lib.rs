//! `ms-solve` - Dense linear solves `A @ X = B` for matsolve.
//!
//! This crate provides:
//! - `solve`, the per-pair kernel: partial-pivoting LU, a zero-pivot
//!   singularity check, and forward/back substitution
//! - `output_shape`, resolving the solution shape from operand shapes
//! - `cost_per_unit`, the work estimate used to shard batches
//! - `solve_batch` and `MatrixSolveOp`, which run a batch of pairs on the
//!   rayon pool
//! - The registry of the `MatrixSolve` / `BatchMatrixSolve` kernels

pub mod batch;
pub mod config;
pub mod cost;
pub mod error;
pub mod kernel;
pub mod lu;
pub mod op;
pub mod resolve;
pub mod shard;

pub use batch::{solve_batch, solve_batch_into};
pub use config::DispatchConfig;
pub use cost::{cost_per_unit, COST_CLAMP_ROWS, MAX_COST};
pub use error::{Result, SolveError};
pub use kernel::solve;
pub use lu::LuFactorization;
pub use op::{find_kernel, registered_kernels, KernelDef, MatrixSolveOp, OpKind};
pub use resolve::output_shape;
pub use shard::ShardPlan;
