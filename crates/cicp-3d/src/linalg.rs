use glam::Vec3;

use crate::parallel::{self, ExecutionStrategy, ParallelError};

/// Row-major 4x4 single precision matrix holding a homogeneous rigid transform.
pub type Mat4x4f = [[f32; 4]; 4];

/// Row-major 3x3 single precision matrix.
pub type Mat3x3f = [[f32; 3]; 3];

/// The identity transform.
pub const IDENTITY_44: Mat4x4f = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Multiply two 4x4 matrices as `a * b`.
///
/// Example:
///
/// ```
/// use cicp_3d::linalg::{matmul44, IDENTITY_44};
///
/// let a = [
///     [0.0, -1.0, 0.0, 1.0],
///     [1.0, 0.0, 0.0, 2.0],
///     [0.0, 0.0, 1.0, 3.0],
///     [0.0, 0.0, 0.0, 1.0],
/// ];
/// assert_eq!(matmul44(&a, &IDENTITY_44), a);
/// ```
pub fn matmul44(a: &Mat4x4f, b: &Mat4x4f) -> Mat4x4f {
    let mut m = [[0.0; 4]; 4];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j] + a[i][3] * b[3][j];
        }
    }
    m
}

/// Invert a rigid transform as `[R^T | -R^T t]`.
///
/// PRECONDITION: the top-left 3x3 block is a rotation.
pub fn transform_inverse(trans: &Mat4x4f) -> Mat4x4f {
    let mut inv = IDENTITY_44;
    for i in 0..3 {
        for j in 0..3 {
            inv[i][j] = trans[j][i];
        }
    }
    for i in 0..3 {
        inv[i][3] = -(inv[i][0] * trans[0][3] + inv[i][1] * trans[1][3] + inv[i][2] * trans[2][3]);
    }
    inv
}

/// Transform a single point with the rotation block and translation column of `trans`.
#[inline]
pub fn transform_point(trans: &Mat4x4f, p: &Vec3) -> Vec3 {
    Vec3::new(
        trans[0][0] * p.x + trans[0][1] * p.y + trans[0][2] * p.z + trans[0][3],
        trans[1][0] * p.x + trans[1][1] * p.y + trans[1][2] * p.z + trans[1][3],
        trans[2][0] * p.x + trans[2][1] * p.y + trans[2][2] * p.z + trans[2][3],
    )
}

/// Transform a set of points in place.
///
/// Each point is rewritten independently, so the points are processed in
/// parallel unless `strategy` is [`ExecutionStrategy::Serial`].
///
/// # Arguments
///
/// * `points` - The points to transform.
/// * `trans` - A 4x4 rigid transform. The last row is ignored.
/// * `strategy` - The execution strategy.
///
/// Example:
///
/// ```
/// use cicp_3d::{linalg::transform_points_inplace, parallel::ExecutionStrategy, Vec3};
///
/// let mut points = vec![Vec3::new(1.0, 2.0, 3.0)];
/// let trans = [
///     [1.0, 0.0, 0.0, 1.0],
///     [0.0, 1.0, 0.0, 0.0],
///     [0.0, 0.0, 1.0, -1.0],
///     [0.0, 0.0, 0.0, 1.0],
/// ];
/// transform_points_inplace(&mut points, &trans, ExecutionStrategy::Serial).unwrap();
/// assert_eq!(points[0], Vec3::new(2.0, 2.0, 2.0));
/// ```
pub fn transform_points_inplace(
    points: &mut [Vec3],
    trans: &Mat4x4f,
    strategy: ExecutionStrategy,
) -> Result<(), ParallelError> {
    parallel::for_each_mut(strategy, points, |_, p| {
        *p = transform_point(trans, p);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transforms::vector6_to_transform;
    use approx::assert_relative_eq;

    fn random_points(n: usize) -> Vec<Vec3> {
        (0..n)
            .map(|_| Vec3::new(rand::random(), rand::random(), rand::random()))
            .collect()
    }

    #[test]
    fn test_transform_points_identity() -> Result<(), ParallelError> {
        let src = vec![Vec3::new(2.0, 2.0, 2.0), Vec3::new(3.0, 4.0, 5.0)];
        let mut points = src.clone();
        transform_points_inplace(&mut points, &IDENTITY_44, ExecutionStrategy::default())?;
        assert_eq!(points, src);
        Ok(())
    }

    #[test]
    fn test_transform_points_composition() -> Result<(), Box<dyn std::error::Error>> {
        let src = random_points(64);
        let t1 = vector6_to_transform(&[0.1, -0.2, 0.3, 0.5, 0.0, -1.0]);
        let t2 = vector6_to_transform(&[-0.05, 0.4, 0.1, 0.2, 1.0, 0.3]);

        let mut twice = src.clone();
        transform_points_inplace(&mut twice, &t1, ExecutionStrategy::ParallelElements)?;
        transform_points_inplace(&mut twice, &t2, ExecutionStrategy::ParallelElements)?;

        let mut once = src.clone();
        transform_points_inplace(&mut once, &matmul44(&t2, &t1), ExecutionStrategy::Serial)?;

        for (a, b) in twice.iter().zip(once.iter()) {
            assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
            assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_transform_points_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
        let src = random_points(16);
        let trans = vector6_to_transform(&[0.3, 0.2, -0.1, 1.0, 2.0, 3.0]);

        let mut points = src.clone();
        transform_points_inplace(&mut points, &trans, ExecutionStrategy::Fixed(2))?;
        transform_points_inplace(&mut points, &transform_inverse(&trans), ExecutionStrategy::Fixed(2))?;

        for (a, b) in points.iter().zip(src.iter()) {
            assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
            assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
        }
        Ok(())
    }

    #[test]
    fn test_transform_inverse_is_inverse() {
        let trans = vector6_to_transform(&[0.5, -0.3, 0.8, -1.0, 0.25, 4.0]);
        let eye = matmul44(&trans, &transform_inverse(&trans));
        for i in 0..4 {
            for j in 0..4 {
                assert_relative_eq!(eye[i][j], IDENTITY_44[i][j], epsilon = 1e-6);
            }
        }
    }
}
