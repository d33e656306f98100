//! Error types shared by every filtering stage.

use thiserror::Error;

use crate::pixel::PixelFormat;

/// Shape defects that make a weight matrix unusable as a convolution kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KernelError {
    #[error("kernel has no weights")]
    Empty,

    #[error("kernel must be square, got {rows} rows of {cols} weights")]
    NotSquare { rows: usize, cols: usize },

    #[error("kernel side must be odd so it has a centre tap, got {0}")]
    EvenSide(usize),
}

/// Top-level error type for all filtering operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid kernel: {0}")]
    InvalidKernel(#[from] KernelError),

    #[error("pixel format {0:?} is not supported, expected 24-bit BGR or 32-bit BGR/BGRA")]
    UnsupportedPixelFormat(PixelFormat),

    #[error("{what} out of bounds: needs {required}, have {available}")]
    OutOfBounds {
        what: &'static str,
        required: usize,
        available: usize,
    },
}

impl Error {
    pub(crate) fn out_of_bounds(what: &'static str, required: usize, available: usize) -> Self {
        Error::OutOfBounds {
            what,
            required,
            available,
        }
    }
}

/// Alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
