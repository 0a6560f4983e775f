use cicp_3d::{camera::CameraIntrinsics, depth::DepthSample, Cicp3dError};
use glam::Vec3;

use super::{Correspondence, Scene};
use crate::IcpError;

/// A scene backed by a depth map, matched by projective association.
///
/// A query point is projected into the depth image and matched to the surface
/// point of the pixel it lands on. Normals are estimated per pixel from the
/// cross product of the forward differences to the right and bottom
/// neighbors, and oriented towards the camera.
pub struct ProjectiveScene {
    width: usize,
    height: usize,
    intrinsics: CameraIntrinsics,
    points: Vec<Vec3>,
    // Vec3::ZERO marks pixels without a normal
    normals: Vec<Vec3>,
    max_distance_sq: f32,
}

impl ProjectiveScene {
    /// Build the scene from a depth image in millimeters.
    ///
    /// # Arguments
    ///
    /// * `depth` - The row-major depth samples, at least `width * height` long.
    /// * `width` - The image width.
    /// * `height` - The image height.
    /// * `intrinsics` - The camera intrinsics of the depth image.
    /// * `max_distance` - Matches farther than this from the query point are rejected.
    pub fn new<T: DepthSample>(
        depth: &[T],
        width: usize,
        height: usize,
        intrinsics: CameraIntrinsics,
        max_distance: f32,
    ) -> Result<Self, IcpError> {
        if depth.len() < width * height {
            return Err(Cicp3dError::InvalidDepthSize(depth.len(), width, height).into());
        }

        let points = (0..width * height)
            .map(|idx| {
                let sample = depth[idx];
                if !sample.is_valid() {
                    return Vec3::ZERO;
                }
                intrinsics.backproject(
                    (idx % width) as f32,
                    (idx / width) as f32,
                    sample.to_meters(),
                )
            })
            .collect::<Vec<_>>();

        let normals = (0..width * height)
            .map(|idx| {
                let (u, v) = (idx % width, idx / width);
                if u + 1 >= width || v + 1 >= height {
                    return Vec3::ZERO;
                }
                let p = points[idx];
                let right = points[idx + 1];
                let bottom = points[idx + width];
                if p.z <= 0.0 || right.z <= 0.0 || bottom.z <= 0.0 {
                    return Vec3::ZERO;
                }
                let n = (right - p).cross(bottom - p).normalize_or_zero();
                if n.dot(p) > 0.0 {
                    -n
                } else {
                    n
                }
            })
            .collect::<Vec<_>>();

        let num_normals = normals.iter().filter(|n| **n != Vec3::ZERO).count();
        log::debug!(
            "projective scene: {}x{} depth, {} pixels with normals",
            width,
            height,
            num_normals
        );

        Ok(Self {
            width,
            height,
            intrinsics,
            points,
            normals,
            max_distance_sq: max_distance * max_distance,
        })
    }

    /// Returns the image dimensions (width, height).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Get the surface point of the pixel `(u, v)`, zero for invalid depth.
    #[inline]
    pub fn point(&self, u: usize, v: usize) -> Vec3 {
        self.points[v * self.width + u]
    }

    /// Get the normal of the pixel `(u, v)`, zero when it could not be estimated.
    #[inline]
    pub fn normal(&self, u: usize, v: usize) -> Vec3 {
        self.normals[v * self.width + u]
    }
}

impl Scene for ProjectiveScene {
    fn query(&self, point: &Vec3) -> Option<Correspondence> {
        let (u, v) = self.intrinsics.project(point)?;
        let (u, v) = (u.round(), v.round());
        if u < 0.0 || v < 0.0 || u >= self.width as f32 || v >= self.height as f32 {
            return None;
        }

        let idx = v as usize * self.width + u as usize;
        let normal = self.normals[idx];
        if normal == Vec3::ZERO {
            return None;
        }

        let matched = self.points[idx];
        if (matched - *point).length_squared() > self.max_distance_sq {
            return None;
        }

        Some(Correspondence {
            point: matched,
            normal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn plane_scene(depth_mm: u16) -> Result<ProjectiveScene, IcpError> {
        let (width, height) = (32, 24);
        let depth = vec![depth_mm; width * height];
        let intrinsics = CameraIntrinsics::new(20.0, 20.0, 16.0, 12.0);
        ProjectiveScene::new(&depth, width, height, intrinsics, 0.1)
    }

    #[test]
    fn test_projective_scene_plane() -> Result<(), IcpError> {
        let scene = plane_scene(1000)?;
        assert_eq!(scene.dimensions(), (32, 24));

        let c = scene
            .query(&Vec3::new(0.0, 0.0, 1.02))
            .expect("point in front of the plane");
        assert_relative_eq!(c.point.z, 1.0);
        assert_relative_eq!(c.point.x, 0.0);
        assert_relative_eq!(c.point.y, 0.0);
        assert_relative_eq!(c.normal.z, -1.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_projective_scene_returns_own_points() -> Result<(), IcpError> {
        let scene = plane_scene(1500)?;
        for (u, v) in [(3, 4), (10, 10), (30, 22)] {
            let p = scene.point(u, v);
            let c = scene.query(&p).expect("pixel with a normal");
            assert_eq!(c.point, p);
            assert_eq!(c.normal, scene.normal(u, v));
        }
        Ok(())
    }

    #[test]
    fn test_projective_scene_rejections() -> Result<(), IcpError> {
        let scene = plane_scene(1000)?;
        // behind the camera
        assert!(scene.query(&Vec3::new(0.0, 0.0, -1.0)).is_none());
        // outside the image
        assert!(scene.query(&Vec3::new(10.0, 0.0, 1.0)).is_none());
        // too far from the surface
        assert!(scene.query(&Vec3::new(0.0, 0.0, 1.5)).is_none());
        // last column has no normal
        let p = scene.point(31, 5);
        assert!(scene.query(&p).is_none());
        Ok(())
    }

    #[test]
    fn test_projective_scene_invalid_depth_size() {
        let res = ProjectiveScene::new(&[1000u16; 3], 2, 2, CameraIntrinsics::new(1.0, 1.0, 0.0, 0.0), 1.0);
        assert!(matches!(
            res,
            Err(IcpError::Cicp3d(Cicp3dError::InvalidDepthSize(3, 2, 2)))
        ));
    }
}
