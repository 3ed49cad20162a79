use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// Checks that a buffer of `len` elements holds exactly `rows * cols`.
fn check_len(len: usize, rows: usize, cols: usize) -> Result<()> {
    match rows.checked_mul(cols) {
        Some(n) if n == len => Ok(()),
        _ => Err(TensorError::ShapeMismatch {
            expected: vec![rows, cols],
            got: vec![len],
        }),
    }
}

/// Read-only view of a dense row-major matrix.
///
/// Element `(i, j)` lives at `data[i * cols + j]`. The view borrows its data;
/// ownership stays with the caller.
#[derive(Debug, Clone, Copy)]
pub struct MatrixView<'a, T> {
    data: &'a [T],
    rows: usize,
    cols: usize,
}

impl<'a, T: Copy> MatrixView<'a, T> {
    /// Wrap `data` as a `rows x cols` matrix.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `data.len() != rows * cols`.
    pub fn new(data: &'a [T], rows: usize, cols: usize) -> Result<Self> {
        check_len(data.len(), rows, cols)?;
        Ok(MatrixView { data, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// The 2-D shape `[rows, cols]`.
    pub fn shape(&self) -> Shape {
        Shape::new(vec![self.rows, self.cols])
    }

    /// The underlying row-major buffer.
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Element at row `i`, column `j`.
    ///
    /// # Panics
    /// Panics if the index is out of bounds.
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        self.data[i * self.cols + j]
    }

    /// Row `i` as a slice of length `cols`.
    pub fn row(&self, i: usize) -> &'a [T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }
}

/// Mutable view of a dense row-major matrix, used for kernel outputs.
#[derive(Debug)]
pub struct MatrixViewMut<'a, T> {
    data: &'a mut [T],
    rows: usize,
    cols: usize,
}

impl<'a, T: Copy> MatrixViewMut<'a, T> {
    /// Wrap `data` as a writable `rows x cols` matrix.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `data.len() != rows * cols`.
    pub fn new(data: &'a mut [T], rows: usize, cols: usize) -> Result<Self> {
        check_len(data.len(), rows, cols)?;
        Ok(MatrixViewMut { data, rows, cols })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> Shape {
        Shape::new(vec![self.rows, self.cols])
    }

    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        self.data[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) {
        assert!(i < self.rows && j < self.cols, "index ({i}, {j}) out of bounds");
        self.data[i * self.cols + j] = value;
    }

    /// Row `i` as a mutable slice of length `cols`.
    pub fn row_mut(&mut self, i: usize) -> &mut [T] {
        &mut self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// The whole row-major buffer.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data[..]
    }

    /// Reborrow as a read-only view.
    pub fn as_view(&self) -> MatrixView<'_, T> {
        MatrixView {
            data: &self.data[..],
            rows: self.rows,
            cols: self.cols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_indexing() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let m = MatrixView::new(&data, 2, 3).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert!(!m.is_square());
        assert_eq!(m.get(1, 0), 4.0);
        assert_eq!(m.row(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.shape().dims(), &[2, 3]);
    }

    #[test]
    fn test_view_length_mismatch() {
        let data = [1.0f32; 5];
        assert!(MatrixView::new(&data, 2, 3).is_err());
    }

    #[test]
    fn test_empty_views() {
        let data: [f64; 0] = [];
        let zero_rows = MatrixView::new(&data, 0, 4).unwrap();
        assert_eq!(zero_rows.rows(), 0);
        let zero_cols = MatrixView::new(&data, 3, 0).unwrap();
        assert_eq!(zero_cols.cols(), 0);
    }

    #[test]
    fn test_view_mut() {
        let mut data = [0.0f64; 4];
        {
            let mut m = MatrixViewMut::new(&mut data, 2, 2).unwrap();
            m.set(0, 1, 7.0);
            m.row_mut(1).copy_from_slice(&[8.0, 9.0]);
            assert_eq!(m.get(0, 1), 7.0);
            assert_eq!(m.as_view().row(1), &[8.0, 9.0]);
        }
        assert_eq!(data, [0.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    #[should_panic]
    fn test_get_out_of_bounds_panics() {
        let data = [1.0f32; 4];
        let m = MatrixView::new(&data, 2, 2).unwrap();
        let _ = m.get(2, 0);
    }
}
