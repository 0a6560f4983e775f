use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::linalg::Mat3x3f;

/// The intrinsic parameters of a pinhole camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// The focal length in pixels along x.
    pub fx: f32,
    /// The focal length in pixels along y.
    pub fy: f32,
    /// The principal point x coordinate in pixels.
    pub cx: f32,
    /// The principal point y coordinate in pixels.
    pub cy: f32,
}

impl CameraIntrinsics {
    /// Create new intrinsics from the focal lengths and the principal point.
    pub fn new(fx: f32, fy: f32, cx: f32, cy: f32) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Read the intrinsics from a row-major camera matrix `K`.
    pub fn from_mat33(k: &Mat3x3f) -> Self {
        Self {
            fx: k[0][0],
            fy: k[1][1],
            cx: k[0][2],
            cy: k[1][2],
        }
    }

    /// Returns the row-major camera matrix `K`.
    pub fn to_mat33(&self) -> Mat3x3f {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    /// Returns the intrinsics expressed in the pixel grid of an image downsampled by `stride`.
    pub fn scaled(&self, stride: usize) -> Self {
        let s = stride.max(1) as f32;
        Self {
            fx: self.fx / s,
            fy: self.fy / s,
            cx: self.cx / s,
            cy: self.cy / s,
        }
    }

    /// Back-project the pixel `(u, v)` at depth `z` in meters into camera space.
    #[inline]
    pub fn backproject(&self, u: f32, v: f32, z: f32) -> Vec3 {
        Vec3::new((u - self.cx) / self.fx * z, (v - self.cy) / self.fy * z, z)
    }

    /// Project a camera space point onto the image plane.
    ///
    /// Returns `None` for points on or behind the camera plane.
    #[inline]
    pub fn project(&self, p: &Vec3) -> Option<(f32, f32)> {
        if p.z <= 0.0 {
            return None;
        }
        Some((p.x / p.z * self.fx + self.cx, p.y / p.z * self.fy + self.cy))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mat33_roundtrip() {
        let k = [[525.0, 0.0, 319.5], [0.0, 520.0, 239.5], [0.0, 0.0, 1.0]];
        let intrinsics = CameraIntrinsics::from_mat33(&k);
        assert_eq!(intrinsics, CameraIntrinsics::new(525.0, 520.0, 319.5, 239.5));
        assert_eq!(intrinsics.to_mat33(), k);
    }

    #[test]
    fn test_project_backproject() {
        let intrinsics = CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0);
        let p = intrinsics.backproject(100.0, 50.0, 2.0);
        let (u, v) = intrinsics.project(&p).expect("point in front of the camera");
        assert_relative_eq!(u, 100.0, epsilon = 1e-3);
        assert_relative_eq!(v, 50.0, epsilon = 1e-3);
        assert!(intrinsics.project(&Vec3::new(0.0, 0.0, -1.0)).is_none());
    }

    #[test]
    fn test_scaled() {
        let intrinsics = CameraIntrinsics::new(500.0, 400.0, 320.0, 240.0).scaled(2);
        assert_eq!(intrinsics, CameraIntrinsics::new(250.0, 200.0, 160.0, 120.0));
    }

    #[test]
    fn test_serde() -> Result<(), serde_json::Error> {
        let intrinsics = CameraIntrinsics::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&intrinsics)?;
        assert_eq!(serde_json::from_str::<CameraIntrinsics>(&json)?, intrinsics);
        Ok(())
    }
}
