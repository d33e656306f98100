//! Square convolution kernels and the standard catalog.
//!
//! Weights are addressed as `weight(u, v)` where `u` is the horizontal tap index and
//! `v` the vertical one, both counted from the kernel's top-left corner. The literal
//! matrices below are written with the outer index running along `u`.

use crate::error::{KernelError, Result};

/// An immutable, odd-sized square matrix of weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f64>,
}

impl Kernel {
    /// Builds a kernel from nested rows, `rows[u][v]`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKernel`](crate::Error::InvalidKernel) if there are no rows, any
    /// row's length differs from the row count, or the side is even.
    ///
    /// ```
    /// use raster_canny::Kernel;
    ///
    /// let sharpen = Kernel::new(&[[0.0, -1.0, 0.0], [-1.0, 5.0, -1.0], [0.0, -1.0, 0.0]]).unwrap();
    /// assert_eq!(sharpen.radius(), 1);
    /// assert!(Kernel::new(&[[1.0, 1.0], [1.0, 1.0]]).is_err());
    /// ```
    pub fn new<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(KernelError::Empty.into());
        }
        if let Some(row) = rows.iter().find(|row| row.as_ref().len() != size) {
            return Err(KernelError::NotSquare {
                rows: size,
                cols: row.as_ref().len(),
            }
            .into());
        }
        if size % 2 == 0 {
            return Err(KernelError::EvenSide(size).into());
        }
        let weights = rows.iter().flat_map(|row| row.as_ref().iter().copied()).collect();
        Ok(Kernel { size, weights })
    }

    /// Builds a kernel from `size` consecutive runs of `size` weights.
    pub fn from_slice(weights: &[f64], size: usize) -> Result<Self> {
        if size == 0 || weights.is_empty() {
            return Err(KernelError::Empty.into());
        }
        if weights.len() != size * size {
            return Err(KernelError::NotSquare {
                rows: (weights.len() + size - 1) / size,
                cols: size,
            }
            .into());
        }
        if size % 2 == 0 {
            return Err(KernelError::EvenSide(size).into());
        }
        Ok(Kernel {
            size,
            weights: weights.to_vec(),
        })
    }

    /// A `size` x `size` kernel with a single 1 at the centre.
    pub fn identity(size: usize) -> Result<Self> {
        let mut weights = vec![0.0; size * size];
        if size % 2 == 1 {
            weights[size * size / 2] = 1.0;
        }
        Kernel::from_slice(&weights, size)
    }

    fn catalog<const N: usize>(rows: [[f64; N]; N]) -> Self {
        Kernel {
            size: N,
            weights: rows.iter().flatten().copied().collect(),
        }
    }

    /// 3x3 binomial approximation of a Gaussian.
    pub fn gaussian_blur() -> Self {
        Kernel::catalog([[1.0, 2.0, 1.0], [2.0, 4.0, 2.0], [1.0, 2.0, 1.0]])
    }

    /// 5x5 box filter.
    pub fn mean_blur() -> Self {
        Kernel::catalog([[1.0; 5]; 5])
    }

    /// 7x7 disc-shaped blur.
    pub fn lens_blur() -> Self {
        Kernel::catalog([
            [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            [0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
        ])
    }

    /// Horizontal Sobel weights. They sum to zero, so the normalizing convolution
    /// cannot apply them meaningfully; the gradient operator uses its own fixed pair.
    pub fn sobel_x() -> Self {
        Kernel::catalog([[1.0, 0.0, -1.0], [2.0, 0.0, -2.0], [1.0, 0.0, -1.0]])
    }

    /// Vertical Sobel weights. See [`Kernel::sobel_x`].
    pub fn sobel_y() -> Self {
        Kernel::catalog([[1.0, 2.0, 1.0], [0.0, 0.0, 0.0], [-1.0, -2.0, -1.0]])
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset from the centre tap to the edge, `(size - 1) / 2`.
    pub fn radius(&self) -> usize {
        (self.size - 1) / 2
    }

    /// Weight at horizontal tap `u`, vertical tap `v`.
    ///
    /// # Panics
    ///
    /// If `u` or `v` is not below [`size`](Kernel::size).
    #[inline]
    pub fn weight(&self, u: usize, v: usize) -> f64 {
        assert!(v < self.size, "vertical tap {v} outside kernel of size {}", self.size);
        self.weights[u * self.size + v]
    }

    /// Sum of all weights, the divisor when every tap lands inside the image.
    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }
}
