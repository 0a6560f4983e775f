use cicp_3d::parallel::{self, ExecutionStrategy, ParallelError};
use glam::Vec3;

use crate::scene::Scene;

/// The point-to-plane linearization of one source point.
///
/// Invalid points keep an all-zero row and residual, which adds nothing to the
/// normal equations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct LinearizedPoint {
    pub row: [f32; 6],
    pub residual: f32,
    pub valid: bool,
}

/// Per-point linear system rows, reused across the iterations of one registration.
///
/// Every pass of [`LinearSystemBuffer::linearize`] overwrites all the entries.
pub(crate) struct LinearSystemBuffer {
    entries: Vec<LinearizedPoint>,
}

impl LinearSystemBuffer {
    pub fn new(num_points: usize) -> Self {
        Self {
            entries: vec![LinearizedPoint::default(); num_points],
        }
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[LinearizedPoint] {
        &self.entries
    }

    /// Query the scene for every point and linearize the point-to-plane residual.
    ///
    /// PRECONDITION: `points` has the length the buffer was created with.
    pub fn linearize<S: Scene>(
        &mut self,
        points: &[Vec3],
        scene: &S,
        strategy: ExecutionStrategy,
    ) -> Result<(), ParallelError> {
        debug_assert_eq!(points.len(), self.entries.len());
        parallel::for_each_mut(strategy, &mut self.entries, |i, entry| {
            *entry = linearize_point(&points[i], scene);
        })
    }

    /// Count the valid correspondences and sum their squared residuals.
    pub fn reduce_error(&self, strategy: ExecutionStrategy) -> Result<(usize, f32), ParallelError> {
        parallel::fold_reduce(
            strategy,
            &self.entries,
            || (0usize, 0.0f32),
            |(count, error), _, entry| {
                if entry.valid {
                    (count + 1, error + entry.residual * entry.residual)
                } else {
                    (count, error)
                }
            },
            |a, b| (a.0 + b.0, a.1 + b.1),
        )
    }

    /// Accumulate the normal equations `A = J^T J` and `b = J^T r`.
    pub fn normal_equations(
        &self,
        strategy: ExecutionStrategy,
    ) -> Result<([[f32; 6]; 6], [f32; 6]), ParallelError> {
        parallel::fold_reduce(
            strategy,
            &self.entries,
            || ([[0.0f32; 6]; 6], [0.0f32; 6]),
            |(mut a, mut b), _, entry| {
                if entry.valid {
                    accumulate_row(&mut a, &mut b, &entry.row, entry.residual);
                }
                (a, b)
            },
            |(mut a, mut b), (a_other, b_other)| {
                for i in 0..6 {
                    for j in 0..6 {
                        a[i][j] += a_other[i][j];
                    }
                    b[i] += b_other[i];
                }
                (a, b)
            },
        )
    }
}

/// Linearize the point-to-plane error of `src` around the identity transform.
///
/// With the match `q` and its normal `n` the residual is `(q - p) . n` and the
/// row is `[p x n, n]`: a small rotation `w` moves the point along `w x p`,
/// which changes the residual by `(w x p) . n = w . (p x n)`.
pub(crate) fn linearize_point<S: Scene>(src: &Vec3, scene: &S) -> LinearizedPoint {
    let Some(c) = scene.query(src) else {
        return LinearizedPoint::default();
    };

    let (n, p) = (c.normal, *src);
    LinearizedPoint {
        row: [
            n.z * p.y - n.y * p.z,
            n.x * p.z - n.z * p.x,
            n.y * p.x - n.x * p.y,
            n.x,
            n.y,
            n.z,
        ],
        residual: (c.point - p).dot(n),
        valid: true,
    }
}

fn accumulate_row(a: &mut [[f32; 6]; 6], b: &mut [f32; 6], row: &[f32; 6], residual: f32) {
    for i in 0..6 {
        for j in 0..6 {
            a[i][j] += row[i] * row[j];
        }
        b[i] += row[i] * residual;
    }
}
