use crate::parallel::ParallelError;

/// Errors returned by the 3d operations.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Cicp3dError {
    /// The depth buffer is smaller than the declared image size.
    #[error("depth buffer has {0} samples, expected at least {1}x{2}")]
    InvalidDepthSize(usize, usize, usize),

    /// The pixel stride used for downsampling must be positive.
    #[error("stride must be > 0")]
    InvalidStride,

    /// A parallel pass failed to run.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}
