use glam::Vec3;
use kiddo::immutable::float::kdtree::ImmutableKdTree;

use super::{Correspondence, Scene};
use crate::IcpError;

/// A scene made of target points with normals, matched by nearest neighbor.
pub struct KdTreeScene {
    points: Vec<Vec3>,
    normals: Vec<Vec3>,
    kdtree: ImmutableKdTree<f32, u32, 3, 32>,
    max_distance_sq: f32,
}

impl KdTreeScene {
    /// Build the scene and index the target points.
    ///
    /// # Arguments
    ///
    /// * `points` - The target points.
    /// * `normals` - One unit normal per target point.
    /// * `max_distance` - Nearest neighbors farther than this are rejected.
    pub fn new(points: Vec<Vec3>, normals: Vec<Vec3>, max_distance: f32) -> Result<Self, IcpError> {
        if points.len() != normals.len() {
            return Err(IcpError::MismatchedNormals(points.len(), normals.len()));
        }
        if points.is_empty() {
            return Err(IcpError::EmptyPointCloud);
        }

        let coords = points.iter().map(|p| p.to_array()).collect::<Vec<_>>();
        let kdtree = ImmutableKdTree::new_from_slice(&coords);

        Ok(Self {
            points,
            normals,
            kdtree,
            max_distance_sq: max_distance * max_distance,
        })
    }

    /// Get the number of target points.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the scene has no target points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl Scene for KdTreeScene {
    fn query(&self, point: &Vec3) -> Option<Correspondence> {
        let nn = self
            .kdtree
            .nearest_one::<kiddo::SquaredEuclidean>(&point.to_array());
        if nn.distance > self.max_distance_sq {
            return None;
        }
        let idx = nn.item as usize;
        Some(Correspondence {
            point: self.points[idx],
            normal: self.normals[idx],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kdtree_scene_query() -> Result<(), IcpError> {
        let points = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let normals = vec![Vec3::Z; 3];
        let scene = KdTreeScene::new(points, normals, 0.5)?;
        assert_eq!(scene.len(), 3);

        let c = scene.query(&Vec3::new(0.9, 0.1, 0.2)).expect("close match");
        assert_eq!(c.point, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(c.normal, Vec3::Z);

        assert!(scene.query(&Vec3::new(5.0, 5.0, 5.0)).is_none());
        Ok(())
    }

    #[test]
    fn test_kdtree_scene_invalid_input() {
        let res = KdTreeScene::new(vec![Vec3::ZERO; 2], vec![Vec3::Z], 1.0);
        assert!(matches!(res, Err(IcpError::MismatchedNormals(2, 1))));

        let res = KdTreeScene::new(Vec::new(), Vec::new(), 1.0);
        assert!(matches!(res, Err(IcpError::EmptyPointCloud)));
    }
}
