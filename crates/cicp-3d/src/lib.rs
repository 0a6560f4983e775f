#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Pinhole camera intrinsics.
pub mod camera;

/// Depth image to point cloud projection.
pub mod depth;

mod error;
pub use error::Cicp3dError;

/// Linear algebra utilities and the point cloud transformer.
pub mod linalg;

/// Data-parallel execution helpers.
pub mod parallel;

/// 3D transforms algorithms.
pub mod transforms;

pub use glam::Vec3;
