mod types;
mod error;

pub use types::*;
pub use error::*;

use std::ffi::CString;
use std::os::raw::c_char;

use ms_solve::{DispatchConfig, OpKind, SolveError};
use ms_tensor::{MatrixView, MatrixViewMut, Scalar, Shape};

/// Execute a closure that returns an `MSStatus`, catching any panics
/// and converting them into `MSStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> MSStatus + std::panic::UnwindSafe>(f: F) -> MSStatus {
    match std::panic::catch_unwind(f) {
        Ok(status) => status,
        Err(_) => {
            set_last_error("internal panic".to_string());
            MSStatus::ErrorInternal
        }
    }
}

/// Record `err` as the last error and return its status code.
fn fail(err: &SolveError) -> MSStatus {
    set_last_error(err.to_string());
    MSStatus::from(err)
}

/// Borrow `len` elements at `ptr`. A zero length accepts a null pointer.
unsafe fn slice_from_raw<'a, T>(ptr: *const T, len: usize) -> Option<&'a [T]> {
    if len == 0 {
        Some(Default::default())
    } else if ptr.is_null() {
        None
    } else {
        Some(std::slice::from_raw_parts(ptr, len))
    }
}

unsafe fn slice_from_raw_mut<'a, T>(ptr: *mut T, len: usize) -> Option<&'a mut [T]> {
    if len == 0 {
        Some(Default::default())
    } else if ptr.is_null() {
        None
    } else {
        Some(std::slice::from_raw_parts_mut(ptr, len))
    }
}

/// Element counts of `batch` stacked `n x n` inputs and `n x nrhs` right-hand
/// sides / outputs, or `None` on overflow.
fn operand_lens(batch: usize, n: usize, nrhs: usize) -> Option<(usize, usize)> {
    let a_len = batch.checked_mul(n)?.checked_mul(n)?;
    let b_len = batch.checked_mul(n)?.checked_mul(nrhs)?;
    Some((a_len, b_len))
}

/// Borrow the three operand buffers of a (possibly batched) solve call.
unsafe fn operands<'a, T>(
    batch: usize,
    a: *const T,
    n: usize,
    b: *const T,
    nrhs: usize,
    out: *mut T,
) -> Result<(&'a [T], &'a [T], &'a mut [T]), MSStatus> {
    let (a_len, b_len) = match operand_lens(batch, n, nrhs) {
        Some(lens) => lens,
        None => {
            set_last_error("operand sizes overflow".to_string());
            return Err(MSStatus::ErrorInvalidArgument);
        }
    };
    match (
        slice_from_raw(a, a_len),
        slice_from_raw(b, b_len),
        slice_from_raw_mut(out, b_len),
    ) {
        (Some(a), Some(b), Some(out)) => Ok((a, b, out)),
        _ => {
            set_last_error("null argument".to_string());
            Err(MSStatus::ErrorInvalidArgument)
        }
    }
}

unsafe fn matrix_solve<T: Scalar>(
    a: *const T,
    n: usize,
    b: *const T,
    nrhs: usize,
    out: *mut T,
) -> MSStatus {
    let (a, b, out) = match operands(1, a, n, b, nrhs, out) {
        Ok(slices) => slices,
        Err(status) => return status,
    };
    match solve_slices(a, b, out, n, nrhs) {
        Ok(()) => MSStatus::Ok,
        Err(e) => fail(&e),
    }
}

fn solve_slices<T: Scalar>(
    a: &[T],
    b: &[T],
    out: &mut [T],
    n: usize,
    nrhs: usize,
) -> ms_solve::Result<()> {
    let a = MatrixView::new(a, n, n)?;
    let b = MatrixView::new(b, n, nrhs)?;
    let out = MatrixViewMut::new(out, n, nrhs)?;
    ms_solve::solve(a, b, out)
}

unsafe fn batch_matrix_solve<T: Scalar>(
    batch: usize,
    a: *const T,
    n: usize,
    b: *const T,
    nrhs: usize,
    out: *mut T,
) -> MSStatus {
    let (a, b, out) = match operands(batch, a, n, b, nrhs, out) {
        Ok(slices) => slices,
        Err(status) => return status,
    };
    match solve_batch_slices(batch, a, b, out, n, nrhs) {
        Ok(()) => MSStatus::Ok,
        Err(e) => fail(&e),
    }
}

fn solve_batch_slices<T: Scalar>(
    batch: usize,
    a: &[T],
    b: &[T],
    out: &mut [T],
    n: usize,
    nrhs: usize,
) -> ms_solve::Result<()> {
    ms_solve::solve_batch_into(
        OpKind::BatchMatrixSolve,
        a,
        &Shape::new(vec![batch, n, n]),
        b,
        &Shape::new(vec![batch, n, nrhs]),
        out,
        &DispatchConfig::default(),
    )
}

/// Solve `A @ X = B` in single precision.
///
/// `a` is a row-major `n x n` matrix; `b` and `out` are row-major
/// `n x nrhs`. Pointers may be null only when the matching buffer is empty.
/// After `ErrorNotInvertible` the contents of `out` are unspecified.
#[no_mangle]
pub unsafe extern "C" fn ms_matrix_solve_f32(
    a: *const f32,
    n: usize,
    b: *const f32,
    nrhs: usize,
    out: *mut f32,
) -> MSStatus {
    catch_panic(|| unsafe { matrix_solve(a, n, b, nrhs, out) })
}

/// Solve `A @ X = B` in double precision. See `ms_matrix_solve_f32`.
#[no_mangle]
pub unsafe extern "C" fn ms_matrix_solve_f64(
    a: *const f64,
    n: usize,
    b: *const f64,
    nrhs: usize,
    out: *mut f64,
) -> MSStatus {
    catch_panic(|| unsafe { matrix_solve(a, n, b, nrhs, out) })
}

/// Solve `batch` independent systems in single precision.
///
/// `a` holds `batch` contiguous row-major `n x n` matrices; `b` and `out`
/// hold `batch` contiguous `n x nrhs` matrices. The batch is spread over the
/// worker pool. If any system fails, the error names the lowest failing
/// batch index.
#[no_mangle]
pub unsafe extern "C" fn ms_batch_matrix_solve_f32(
    batch: usize,
    a: *const f32,
    n: usize,
    b: *const f32,
    nrhs: usize,
    out: *mut f32,
) -> MSStatus {
    catch_panic(|| unsafe { batch_matrix_solve(batch, a, n, b, nrhs, out) })
}

/// Solve `batch` independent systems in double precision.
/// See `ms_batch_matrix_solve_f32`.
#[no_mangle]
pub unsafe extern "C" fn ms_batch_matrix_solve_f64(
    batch: usize,
    a: *const f64,
    n: usize,
    b: *const f64,
    nrhs: usize,
    out: *mut f64,
) -> MSStatus {
    catch_panic(|| unsafe { batch_matrix_solve(batch, a, n, b, nrhs, out) })
}

/// Estimated cost of solving one `rows x rows` system with `rhss`
/// right-hand sides. Saturates at `UINT64_MAX`.
#[no_mangle]
pub extern "C" fn ms_cost_per_unit(rows: u64, rhss: u64) -> u64 {
    ms_solve::cost::estimate(rows, rhss)
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error, or
/// null if no error has occurred. The caller must free the returned string
/// with `ms_free_string`.
#[no_mangle]
pub extern "C" fn ms_last_error() -> *const c_char {
    match error::take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `ms_last_error`.
#[no_mangle]
pub unsafe extern "C" fn ms_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
