//! Batched dispatch: one independent solve per batch index.

use log::{debug, trace};
use rayon::prelude::*;

use ms_tensor::{DType, MatrixView, MatrixViewMut, Scalar, Shape, Tensor, TensorError};

use crate::config::DispatchConfig;
use crate::cost::cost_per_unit;
use crate::error::{Result, SolveError};
use crate::kernel::solve;
use crate::op::OpKind;
use crate::resolve::output_shape;
use crate::shard::ShardPlan;

/// Solve `A @ X = B` for every matrix pair in `input` / `rhs`.
///
/// For [`OpKind::MatrixSolve`] both operands must be rank 2. For
/// [`OpKind::BatchMatrixSolve`] both must have the same rank >= 2 and
/// identical leading (batch) dimensions. Output matrix `i` is the solution
/// for input pair `i`.
///
/// The batch is split into shards by estimated cost and the shards run on the
/// rayon pool, each writing its own contiguous part of the output. If any pair
/// fails, the error of the lowest failing batch index is returned.
pub fn solve_batch(
    kind: OpKind,
    input: &Tensor,
    rhs: &Tensor,
    config: &DispatchConfig,
) -> Result<Tensor> {
    if input.dtype() != rhs.dtype() {
        return Err(TensorError::DTypeMismatch {
            expected: input.dtype().to_string(),
            got: rhs.dtype().to_string(),
        }
        .into());
    }
    let out_shape = check_shapes(kind, input.shape(), rhs.shape())?;

    let mut output = Tensor::zeros(input.dtype(), out_shape.clone());
    match input.dtype() {
        DType::F32 => run_batch::<f32>(
            kind,
            (input.data()?, input.shape()),
            (rhs.data()?, rhs.shape()),
            (output.data_mut()?, &out_shape),
            config,
        )?,
        DType::F64 => run_batch::<f64>(
            kind,
            (input.data()?, input.shape()),
            (rhs.data()?, rhs.shape()),
            (output.data_mut()?, &out_shape),
            config,
        )?,
    }
    Ok(output)
}

/// Like [`solve_batch`], but over borrowed row-major buffers, writing the
/// solutions straight into the caller's `out`.
///
/// `out` must hold exactly as many elements as the resolved output shape.
pub fn solve_batch_into<T: Scalar>(
    kind: OpKind,
    input: &[T],
    input_shape: &Shape,
    rhs: &[T],
    rhs_shape: &Shape,
    out: &mut [T],
    config: &DispatchConfig,
) -> Result<()> {
    let out_shape = check_shapes(kind, input_shape, rhs_shape)?;
    check_len(input.len(), input_shape)?;
    check_len(rhs.len(), rhs_shape)?;
    check_len(out.len(), &out_shape)?;
    run_batch(
        kind,
        (input, input_shape),
        (rhs, rhs_shape),
        (out, &out_shape),
        config,
    )
}

/// Rank and batch-dimension checks. Returns the output shape.
fn check_shapes(kind: OpKind, input: &Shape, rhs: &Shape) -> Result<Shape> {
    check_ranks(kind, input, rhs)?;
    if input.batch_dims() != rhs.batch_dims() {
        return Err(SolveError::ShapeMismatch(format!(
            "batch dimensions differ: input {} vs rhs {}",
            input, rhs
        )));
    }
    output_shape(input, rhs)
}

fn check_len(len: usize, shape: &Shape) -> Result<()> {
    if len != shape.numel() {
        return Err(TensorError::ShapeMismatch {
            expected: shape.dims().to_vec(),
            got: vec![len],
        }
        .into());
    }
    Ok(())
}

fn check_ranks(kind: OpKind, input: &Shape, rhs: &Shape) -> Result<()> {
    let ok = if kind.supports_batch() {
        input.ndim() >= 2 && input.ndim() == rhs.ndim()
    } else {
        input.ndim() == 2 && rhs.ndim() == 2
    };
    if ok {
        return Ok(());
    }
    Err(SolveError::InvalidRank {
        op: kind.name(),
        expected: if kind.supports_batch() {
            "equal ranks of at least 2"
        } else {
            "rank-2 operands"
        },
        input: input.ndim(),
        rhs: rhs.ndim(),
    })
}

fn run_batch<T: Scalar>(
    kind: OpKind,
    (a_data, a_shape): (&[T], &Shape),
    (b_data, b_shape): (&[T], &Shape),
    (out_data, out_shape): (&mut [T], &Shape),
    config: &DispatchConfig,
) -> Result<()> {
    let (rows, cols) = matrix_dims(a_shape)?;
    let (rhs_rows, nrhs) = matrix_dims(b_shape)?;
    let (out_rows, out_cols) = matrix_dims(out_shape)?;
    let units = a_shape.batch_size();

    let unit_cost = cost_per_unit(
        &Shape::new(vec![rows, cols]),
        &Shape::new(vec![rhs_rows, nrhs]),
    );
    let plan = ShardPlan::new(
        units,
        unit_cost,
        config.effective_parallelism(),
        config.min_cost_per_shard,
    );
    debug!(
        "{} {}: {} pair(s) of {}x{} / {}x{}, cost per unit {}, {} shard(s) of {}",
        kind.name(),
        T::DTYPE,
        units,
        rows,
        cols,
        rhs_rows,
        nrhs,
        unit_cost,
        plan.num_shards,
        plan.block_size
    );
    if units == 0 {
        return Ok(());
    }

    let a_stride = rows * cols;
    let b_stride = rhs_rows * nrhs;
    let out_stride = out_rows * out_cols;

    let run_shard = |shard: usize, chunk: &mut [T]| -> Result<()> {
        let range = plan.range(shard);
        trace!("shard {} covers batch indices {:?}", shard, range);
        for (offset, index) in range.enumerate() {
            let a = MatrixView::new(&a_data[index * a_stride..(index + 1) * a_stride], rows, cols)?;
            let b = MatrixView::new(&b_data[index * b_stride..(index + 1) * b_stride], rhs_rows, nrhs)?;
            let out = MatrixViewMut::new(
                &mut chunk[offset * out_stride..(offset + 1) * out_stride],
                out_rows,
                out_cols,
            )?;
            solve(a, b, out).map_err(|source| SolveError::Batch {
                index,
                source: Box::new(source),
            })?;
        }
        Ok(())
    };

    let chunks: Vec<&mut [T]> = if out_stride == 0 {
        // Nothing to write, but every pair still has to be checked.
        (0..plan.num_shards).map(|_| <&mut [T]>::default()).collect()
    } else {
        out_data.chunks_mut(plan.block_size * out_stride).collect()
    };

    let results: Vec<Result<()>> = if plan.num_shards > 1 {
        chunks
            .into_par_iter()
            .enumerate()
            .map(|(shard, chunk)| run_shard(shard, chunk))
            .collect()
    } else {
        chunks
            .into_iter()
            .enumerate()
            .map(|(shard, chunk)| run_shard(shard, chunk))
            .collect()
    };

    // Shards are in batch order and each stops at its first failure, so the
    // first error here belongs to the lowest failing index.
    results.into_iter().collect()
}

fn matrix_dims(shape: &Shape) -> Result<(usize, usize)> {
    shape.matrix_dims().ok_or_else(|| {
        SolveError::ShapeMismatch(format!("expected at least 2 dimensions, got {}", shape))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn batch_of(matrices: &[&[f64]], n: usize, cols: usize) -> Tensor {
        let data: Vec<f64> = matrices.iter().flat_map(|m| m.iter().copied()).collect();
        Tensor::new(data, Shape::new(vec![matrices.len(), n, cols]))
    }

    fn forced_parallel() -> DispatchConfig {
        DispatchConfig::default()
            .with_max_parallelism(4)
            .with_min_cost_per_shard(1)
    }

    #[test]
    fn test_single_matrix_solve() {
        let a = Tensor::new(vec![2.0f64, 0.0, 0.0, 2.0], Shape::new(vec![2, 2]));
        let b = Tensor::new(vec![4.0f64, 6.0], Shape::new(vec![2, 1]));
        let x = solve_batch(OpKind::MatrixSolve, &a, &b, &DispatchConfig::default()).unwrap();
        assert_eq!(x.shape().dims(), &[2, 1]);
        assert_eq!(x.data::<f64>().unwrap(), &[2.0, 3.0]);
    }

    #[test]
    fn test_batch_matches_per_pair_solve() {
        let mut rng = StdRng::seed_from_u64(3);
        let (batch, n, nrhs) = (9, 4, 2);
        let mut a: Vec<f64> = (0..batch * n * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        for m in 0..batch {
            for i in 0..n {
                a[m * n * n + i * n + i] += 4.0;
            }
        }
        let b: Vec<f64> = (0..batch * n * nrhs).map(|_| rng.gen_range(-5.0..5.0)).collect();
        let a = Tensor::new(a, Shape::new(vec![3, 3, n, n]));
        let b = Tensor::new(b, Shape::new(vec![3, 3, n, nrhs]));

        let parallel = solve_batch(OpKind::BatchMatrixSolve, &a, &b, &forced_parallel()).unwrap();
        let sequential =
            solve_batch(OpKind::BatchMatrixSolve, &a, &b, &DispatchConfig::sequential()).unwrap();
        assert_eq!(parallel.shape().dims(), &[3, 3, n, nrhs]);
        assert_eq!(parallel, sequential);

        for index in 0..batch {
            let mut expected = vec![0.0f64; n * nrhs];
            solve(
                a.matrix::<f64>(index).unwrap(),
                b.matrix::<f64>(index).unwrap(),
                MatrixViewMut::new(&mut expected, n, nrhs).unwrap(),
            )
            .unwrap();
            let got = parallel.matrix::<f64>(index).unwrap();
            for (g, e) in got.data().iter().zip(&expected) {
                assert_relative_eq!(*g, *e);
            }
        }
    }

    #[test]
    fn test_f32_batch() {
        let a = Tensor::new(
            vec![2.0f32, 0.0, 0.0, 2.0, 1.0, 2.0, 3.0, 4.0],
            Shape::new(vec![2, 2, 2]),
        );
        let b = Tensor::new(vec![4.0f32, 6.0, 1.0, 1.0], Shape::new(vec![2, 2, 1]));
        let x = solve_batch(OpKind::BatchMatrixSolve, &a, &b, &forced_parallel()).unwrap();
        assert_eq!(x.dtype(), DType::F32);
        let data = x.data::<f32>().unwrap();
        assert_relative_eq!(data[0], 2.0);
        assert_relative_eq!(data[1], 3.0);
        // [[1,2],[3,4]] x = [1,1] -> x = [-1, 1]
        assert_relative_eq!(data[2], -1.0, epsilon = 1e-5);
        assert_relative_eq!(data[3], 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_lowest_failing_index_reported() {
        let ok: &[f64] = &[1.0, 0.0, 0.0, 1.0];
        let singular: &[f64] = &[0.0, 0.0, 0.0, 0.0];
        let a = batch_of(&[ok, ok, singular, ok, singular, ok], 2, 2);
        let b = Tensor::new(vec![1.0f64; 12], Shape::new(vec![6, 2, 1]));
        for config in [forced_parallel(), DispatchConfig::sequential()] {
            let err = solve_batch(OpKind::BatchMatrixSolve, &a, &b, &config).unwrap_err();
            assert!(err.is_not_invertible());
            assert_eq!(err.batch_index(), Some(2));
        }
    }

    #[test]
    fn test_empty_batch() {
        let a = Tensor::zeros(DType::F64, Shape::new(vec![0, 3, 3]));
        let b = Tensor::zeros(DType::F64, Shape::new(vec![0, 3, 2]));
        let x = solve_batch(OpKind::BatchMatrixSolve, &a, &b, &DispatchConfig::default()).unwrap();
        assert_eq!(x.shape().dims(), &[0, 3, 2]);
        assert!(x.storage().is_empty());
    }

    #[test]
    fn test_empty_matrices_in_batch() {
        let a = Tensor::zeros(DType::F32, Shape::new(vec![5, 0, 0]));
        let b = Tensor::zeros(DType::F32, Shape::new(vec![5, 0, 3]));
        let x = solve_batch(OpKind::BatchMatrixSolve, &a, &b, &forced_parallel()).unwrap();
        assert_eq!(x.shape().dims(), &[5, 0, 3]);
    }

    #[test]
    fn test_zero_rhs_still_checks_singularity() {
        let identity: &[f64] = &[1.0, 0.0, 0.0, 1.0];
        let zeros: &[f64] = &[0.0; 4];
        let a = batch_of(&[identity, zeros], 2, 2);
        let b = Tensor::zeros(DType::F64, Shape::new(vec![2, 2, 0]));
        let err = solve_batch(OpKind::BatchMatrixSolve, &a, &b, &forced_parallel()).unwrap_err();
        assert!(err.is_not_invertible());
        assert_eq!(err.batch_index(), Some(1));
    }

    #[test]
    fn test_non_square_in_batch() {
        let a = Tensor::zeros(DType::F64, Shape::new(vec![2, 3, 2]));
        let b = Tensor::zeros(DType::F64, Shape::new(vec![2, 3, 1]));
        let err = solve_batch(OpKind::BatchMatrixSolve, &a, &b, &DispatchConfig::default())
            .unwrap_err();
        assert!(err.is_shape_mismatch());
        assert_eq!(err.batch_index(), Some(0));
    }

    #[test]
    fn test_rank_rules() {
        let a3 = Tensor::zeros(DType::F64, Shape::new(vec![1, 2, 2]));
        let b3 = Tensor::zeros(DType::F64, Shape::new(vec![1, 2, 1]));
        let b2 = Tensor::zeros(DType::F64, Shape::new(vec![2, 1]));
        let v = Tensor::zeros(DType::F64, Shape::new(vec![2]));
        let config = DispatchConfig::default();

        let err = solve_batch(OpKind::MatrixSolve, &a3, &b3, &config).unwrap_err();
        assert!(matches!(err, SolveError::InvalidRank { input: 3, rhs: 3, .. }));

        let err = solve_batch(OpKind::BatchMatrixSolve, &a3, &b2, &config).unwrap_err();
        assert!(matches!(err, SolveError::InvalidRank { .. }));

        let err = solve_batch(OpKind::BatchMatrixSolve, &v, &v, &config).unwrap_err();
        assert!(matches!(err, SolveError::InvalidRank { .. }));
    }

    #[test]
    fn test_batch_dims_must_match() {
        let a = Tensor::zeros(DType::F64, Shape::new(vec![2, 2, 2]));
        let b = Tensor::zeros(DType::F64, Shape::new(vec![3, 2, 1]));
        let err = solve_batch(OpKind::BatchMatrixSolve, &a, &b, &DispatchConfig::default())
            .unwrap_err();
        assert!(matches!(err, SolveError::ShapeMismatch(_)));
    }

    #[test]
    fn test_dtype_mismatch() {
        let a = Tensor::new(vec![1.0f32, 0.0, 0.0, 1.0], Shape::new(vec![2, 2]));
        let b = Tensor::new(vec![1.0f64, 1.0], Shape::new(vec![2, 1]));
        let err = solve_batch(OpKind::MatrixSolve, &a, &b, &DispatchConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            SolveError::Tensor(TensorError::DTypeMismatch { .. })
        ));
    }

    #[test]
    fn test_solve_into_caller_buffer() {
        let a = [2.0f64, 0.0, 0.0, 2.0, 1.0, 2.0, 3.0, 4.0];
        let b = [4.0f64, 6.0, 1.0, 1.0];
        let (a_shape, b_shape) = (Shape::new(vec![2, 2, 2]), Shape::new(vec![2, 2, 1]));
        let mut out = [0.0f64; 4];
        solve_batch_into(
            OpKind::BatchMatrixSolve,
            &a,
            &a_shape,
            &b,
            &b_shape,
            &mut out,
            &forced_parallel(),
        )
        .unwrap();

        let expected = solve_batch(
            OpKind::BatchMatrixSolve,
            &Tensor::new(a.to_vec(), a_shape),
            &Tensor::new(b.to_vec(), b_shape),
            &DispatchConfig::sequential(),
        )
        .unwrap();
        assert_eq!(&out[..], expected.data::<f64>().unwrap());
        assert_relative_eq!(out[2], -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_into_checks_buffer_lengths() {
        let a = [1.0f32, 0.0, 0.0, 1.0];
        let b = [1.0f32, 2.0];
        let (a_shape, b_shape) = (Shape::new(vec![1, 2, 2]), Shape::new(vec![1, 2, 1]));
        let config = DispatchConfig::sequential();

        let mut short = [0.0f32; 1];
        let err = solve_batch_into(
            OpKind::BatchMatrixSolve,
            &a,
            &a_shape,
            &b,
            &b_shape,
            &mut short,
            &config,
        )
        .unwrap_err();
        assert!(err.is_shape_mismatch());

        let mut out = [0.0f32; 2];
        let err = solve_batch_into(
            OpKind::BatchMatrixSolve,
            &a[..3],
            &a_shape,
            &b,
            &b_shape,
            &mut out,
            &config,
        )
        .unwrap_err();
        assert!(err.is_shape_mismatch());
        assert_eq!(out, [0.0, 0.0]);
    }

    #[test]
    fn test_solve_into_empty_batch() {
        let mut out: [f64; 0] = [];
        solve_batch_into(
            OpKind::BatchMatrixSolve,
            &[],
            &Shape::new(vec![0, 3, 3]),
            &[],
            &Shape::new(vec![0, 3, 1]),
            &mut out,
            &DispatchConfig::default(),
        )
        .unwrap();
    }
}
