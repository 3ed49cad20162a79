//! LU factorization with partial pivoting.

use ms_tensor::{MatrixView, MatrixViewMut, Scalar};

use crate::error::{Result, SolveError};

/// Factorization `P @ A = L @ U` of a square matrix.
///
/// `L` (unit lower triangular, diagonal implicit) and `U` (upper triangular)
/// are packed into one row-major `n x n` buffer. `perm[i]` is the row of the
/// original matrix that ended up in row `i`.
#[derive(Debug, Clone)]
pub struct LuFactorization<T> {
    lu: Vec<T>,
    perm: Vec<usize>,
    n: usize,
}

impl<T: Scalar> LuFactorization<T> {
    /// Factorize `a`, choosing at each step the largest-magnitude pivot in the
    /// active column (the first one on ties).
    ///
    /// Never fails on singular input: a column with no non-zero candidate is
    /// skipped and leaves a zero on `U`'s diagonal, which
    /// [`min_abs_pivot`](Self::min_abs_pivot) reports.
    ///
    /// # Errors
    /// `ShapeMismatch` if `a` is not square.
    pub fn factorize(a: MatrixView<'_, T>) -> Result<Self> {
        if !a.is_square() {
            return Err(SolveError::ShapeMismatch(format!(
                "input matrix must be square, got {}x{}",
                a.rows(),
                a.cols()
            )));
        }

        let n = a.rows();
        let mut lu = a.data().to_vec();
        let mut perm: Vec<usize> = (0..n).collect();

        for k in 0..n {
            let mut pivot_row = k;
            let mut max_abs = lu[k * n + k].abs();
            for i in (k + 1)..n {
                let candidate = lu[i * n + k].abs();
                if candidate > max_abs {
                    max_abs = candidate;
                    pivot_row = i;
                }
            }

            if pivot_row != k {
                for j in 0..n {
                    lu.swap(k * n + j, pivot_row * n + j);
                }
                perm.swap(k, pivot_row);
            }

            if max_abs == T::zero() {
                continue;
            }

            let pivot = lu[k * n + k];
            let (head, tail) = lu.split_at_mut((k + 1) * n);
            let pivot_tail = &head[k * n + k + 1..];
            for row in tail.chunks_exact_mut(n) {
                let factor = row[k] / pivot;
                row[k] = factor;
                if factor == T::zero() {
                    continue;
                }
                for (x, &u) in row[k + 1..].iter_mut().zip(pivot_tail) {
                    *x = *x - factor * u;
                }
            }
        }

        Ok(LuFactorization { lu, perm, n })
    }

    /// Order of the factorized matrix.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Row permutation: `permutation()[i]` is the source row of row `i`.
    pub fn permutation(&self) -> &[usize] {
        &self.perm
    }

    /// Smallest `|U[i][i]|`.
    ///
    /// NaN if any pivot is NaN, `+inf` for a 0x0 matrix.
    pub fn min_abs_pivot(&self) -> T {
        (0..self.n)
            .map(|i| self.lu[i * self.n + i].abs())
            .fold(T::infinity(), |min, p| if p.is_nan() || p < min { p } else { min })
    }

    /// Solve `A @ X = B` into `out`, using forward substitution on `L` and back
    /// substitution on `U`.
    ///
    /// Does not check the pivots; a zero pivot yields non-finite output.
    ///
    /// # Errors
    /// `ShapeMismatch` if `b` does not have `n` rows or `out` is not
    /// `n x b.cols()`.
    pub fn solve_into(&self, b: MatrixView<'_, T>, mut out: MatrixViewMut<'_, T>) -> Result<()> {
        let n = self.n;
        let nrhs = b.cols();
        if b.rows() != n {
            return Err(SolveError::ShapeMismatch(format!(
                "rhs has {} rows but the factorized matrix has {}",
                b.rows(),
                n
            )));
        }
        if out.rows() != n || out.cols() != nrhs {
            return Err(SolveError::ShapeMismatch(format!(
                "output is {}x{} but the solution is {}x{}",
                out.rows(),
                out.cols(),
                n,
                nrhs
            )));
        }

        // out = P @ B
        for (i, &src) in self.perm.iter().enumerate() {
            out.row_mut(i).copy_from_slice(b.row(src));
        }

        let x = out.data_mut();

        // L @ Y = P @ B, unit diagonal.
        for i in 1..n {
            let (done, rest) = x.split_at_mut(i * nrhs);
            let row_i = &mut rest[..nrhs];
            for k in 0..i {
                let l = self.lu[i * n + k];
                if l == T::zero() {
                    continue;
                }
                for (xi, &xk) in row_i.iter_mut().zip(&done[k * nrhs..(k + 1) * nrhs]) {
                    *xi = *xi - l * xk;
                }
            }
        }

        // U @ X = Y
        for i in (0..n).rev() {
            let (head, solved) = x.split_at_mut((i + 1) * nrhs);
            let row_i = &mut head[i * nrhs..];
            for k in (i + 1)..n {
                let u = self.lu[i * n + k];
                if u == T::zero() {
                    continue;
                }
                let offset = (k - i - 1) * nrhs;
                for (xi, &xk) in row_i.iter_mut().zip(&solved[offset..offset + nrhs]) {
                    *xi = *xi - u * xk;
                }
            }
            let diag = self.lu[i * n + i];
            for xi in row_i.iter_mut() {
                *xi = *xi / diag;
            }
        }

        Ok(())
    }
}
