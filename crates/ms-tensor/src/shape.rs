use std::fmt;

/// A tensor shape, wrapping a vector of dimension sizes.
///
/// Matrix operands are laid out with any leading dimensions treated as batch
/// dimensions and the trailing two as `rows x cols`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a new shape from a vector of dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements (product of all dimension sizes).
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= ndim()`.
    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// The trailing `(rows, cols)` pair, or `None` for shapes of rank < 2.
    pub fn matrix_dims(&self) -> Option<(usize, usize)> {
        match self.dims.as_slice() {
            [.., rows, cols] => Some((*rows, *cols)),
            _ => None,
        }
    }

    /// All dimensions before the trailing matrix pair.
    ///
    /// Empty for rank-2 shapes and for shapes too small to hold a matrix.
    pub fn batch_dims(&self) -> &[usize] {
        let n = self.dims.len().saturating_sub(2);
        &self.dims[..n]
    }

    /// Number of matrices in a batched operand (product of the batch dims).
    ///
    /// A rank-2 shape is a batch of one.
    pub fn batch_size(&self) -> usize {
        self.batch_dims().iter().product()
    }

    /// Returns a copy of this shape with the last dimension replaced.
    ///
    /// Returns `None` for a rank-0 shape.
    pub fn with_last_dim(&self, size: usize) -> Option<Shape> {
        let mut dims = self.dims.clone();
        *dims.last_mut()? = size;
        Some(Shape { dims })
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}
