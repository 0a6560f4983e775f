use glam::Vec3;

mod kdtree;
pub use kdtree::KdTreeScene;

mod projective;
pub use projective::ProjectiveScene;

/// A corresponding surface point and its normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correspondence {
    /// The matched point on the scene surface.
    pub point: Vec3,
    /// The surface normal at the matched point. Expected to be unit length.
    pub normal: Vec3,
}

/// A surface that can be queried for correspondences.
///
/// `query` must be free of side effects: the registration calls it
/// concurrently from several threads for different source points.
pub trait Scene: Sync {
    /// Find the correspondence of `point`, or `None` if it has no valid match.
    fn query(&self, point: &Vec3) -> Option<Correspondence>;
}

impl<F> Scene for F
where
    F: Fn(&Vec3) -> Option<Correspondence> + Sync,
{
    fn query(&self, point: &Vec3) -> Option<Correspondence> {
        self(point)
    }
}
