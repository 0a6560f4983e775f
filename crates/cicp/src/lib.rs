//! Point-to-plane ICP registration of point clouds projected from depth images.
//!
//! ```
//! use cicp::{c3d, icp};
//!
//! let depth = (0..16 * 12)
//!     .map(|i| {
//!         let (u, v) = ((i % 16) as u16, (i / 16) as u16);
//!         1000 + 3 * u * u + 2 * v * v + u * v
//!     })
//!     .collect::<Vec<_>>();
//! let intrinsics = c3d::camera::CameraIntrinsics::new(10.0, 10.0, 8.0, 6.0);
//! let window = c3d::depth::DepthWindow::default();
//! let strategy = c3d::parallel::ExecutionStrategy::default();
//!
//! let mut cloud =
//!     c3d::depth::depth_to_cloud_u16(&depth, 16, 12, &intrinsics, &window, strategy).unwrap();
//! let scene = icp::ProjectiveScene::new(&depth, 16, 12, intrinsics, 0.1).unwrap();
//! let criteria = icp::ICPConvergenceCriteria::default();
//!
//! let result = icp::icp_point_to_plane(&mut cloud, &scene, &criteria, strategy).unwrap();
//! assert!(!result.status.is_failure());
//! assert!(result.fitness > 0.8);
//! ```

#[doc(inline)]
pub use cicp_3d as c3d;

#[doc(inline)]
pub use cicp_icp as icp;
