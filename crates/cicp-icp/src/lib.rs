#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod error;
pub use error::IcpError;

mod icp_point_to_plane;
pub use icp_point_to_plane::*;

mod ops;

/// Correspondence providers for the registration.
pub mod scene;
pub use scene::{Correspondence, KdTreeScene, ProjectiveScene, Scene};

/// Normal equations solver.
pub mod solver;
