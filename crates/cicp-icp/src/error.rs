use cicp_3d::{parallel::ParallelError, Cicp3dError};

/// Errors returned by the registration.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum IcpError {
    /// The source point cloud has no points.
    #[error("the source point cloud is empty")]
    EmptyPointCloud,

    /// The scene target points and normals differ in length.
    #[error("scene has {0} points but {1} normals")]
    MismatchedNormals(usize, usize),

    /// The 6x6 normal equations produced a non-finite update.
    #[error("the normal equations solve produced a non-finite update")]
    SolverFailure,

    /// A 3d operation failed.
    #[error(transparent)]
    Cicp3d(#[from] Cicp3dError),

    /// A parallel pass failed to run.
    #[error(transparent)]
    Parallel(#[from] ParallelError),
}
