use cicp_3d::{
    linalg::{matmul44, transform_points_inplace, Mat4x4f, IDENTITY_44},
    parallel::ExecutionStrategy,
};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::{ops::LinearSystemBuffer, scene::Scene, solver::solve_normal_equations, IcpError};

/// Structure to define the ICP convergence criteria.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ICPConvergenceCriteria {
    /// Maximum number of update iterations to perform.
    pub max_iteration: usize,
    /// Convergence threshold on the change of fitness between two consecutive iterations.
    pub relative_fitness: f32,
    /// Convergence threshold on the change of inlier RMSE between two consecutive iterations.
    pub relative_rmse: f32,
}

impl Default for ICPConvergenceCriteria {
    fn default() -> Self {
        Self {
            max_iteration: 30,
            relative_fitness: 1e-6,
            relative_rmse: 1e-6,
        }
    }
}

/// The state the registration stopped in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationStatus {
    /// The registration is still iterating.
    ///
    /// Only the initial state: [`icp_point_to_plane`] never returns it.
    #[default]
    Iterating,
    /// Fitness and RMSE changed less than the thresholds between two iterations.
    Converged,
    /// The final evaluation pass after `max_iteration` updates ran.
    MaxIterationsReached,
    /// No source point had a valid correspondence.
    NoCorrespondences,
    /// The normal equations or their update were not finite.
    SolverFailure,
}

impl RegistrationStatus {
    /// Whether the registration stopped on a degenerate iteration.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RegistrationStatus::NoCorrespondences | RegistrationStatus::SolverFailure
        )
    }
}

/// Result of the ICP algorithm.
///
/// The transformation maps the input source points onto the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationResult {
    /// Fraction of the source points with a valid correspondence.
    pub fitness: f32,
    /// RMSE of the point-to-plane residuals of the valid correspondences.
    ///
    /// Infinite when no correspondence is valid.
    pub inlier_rmse: f32,
    /// The accumulated rigid transform.
    pub transformation: Mat4x4f,
    /// Number of updates applied to the source points.
    pub num_iterations: usize,
    /// Why the registration stopped.
    pub status: RegistrationStatus,
}

impl RegistrationResult {
    /// The result before the first iteration: identity transform and zero metrics.
    pub fn identity() -> Self {
        Self {
            fitness: 0.0,
            inlier_rmse: 0.0,
            transformation: IDENTITY_44,
            num_iterations: 0,
            status: RegistrationStatus::default(),
        }
    }

    /// Get the rotation block of the transformation.
    pub fn rotation(&self) -> [[f32; 3]; 3] {
        let t = &self.transformation;
        [
            [t[0][0], t[0][1], t[0][2]],
            [t[1][0], t[1][1], t[1][2]],
            [t[2][0], t[2][1], t[2][2]],
        ]
    }

    /// Get the translation column of the transformation.
    pub fn translation(&self) -> [f32; 3] {
        let t = &self.transformation;
        [t[0][3], t[1][3], t[2][3]]
    }
}

impl Default for RegistrationResult {
    fn default() -> Self {
        Self::identity()
    }
}

/// Iterative Closest Point (ICP) algorithm using point to plane distance.
///
/// Every iteration queries the scene for all the points, linearizes the
/// point-to-plane error, evaluates fitness and RMSE, checks convergence against
/// the previous iteration and applies the Gauss-Newton update to `points`. The
/// update is left-multiplied onto the accumulated transformation. After
/// `max_iteration` updates one extra pass only evaluates the metrics.
///
/// # Arguments
///
/// * `points` - Source points, transformed in place.
/// * `scene` - The surface to align the points to.
/// * `criteria` - Convergence criteria.
/// * `strategy` - The execution strategy of the per-point passes.
///
/// # Returns
///
/// * `result` - The transformation, metrics of the last evaluated iteration and the stop reason.
///
/// A degenerate iteration stops the registration without touching `points` and
/// is reported through [`RegistrationResult::status`].
pub fn icp_point_to_plane<S: Scene>(
    points: &mut [Vec3],
    scene: &S,
    criteria: &ICPConvergenceCriteria,
    strategy: ExecutionStrategy,
) -> Result<RegistrationResult, IcpError> {
    if points.is_empty() {
        return Err(IcpError::EmptyPointCloud);
    }

    let mut result = RegistrationResult::identity();
    let mut buffer = LinearSystemBuffer::new(points.len());

    // use one extra turn
    for iter in 0..=criteria.max_iteration {
        let now = std::time::Instant::now();

        buffer.linearize(points, scene, strategy)?;
        let (count, total_error) = buffer.reduce_error(strategy)?;

        let backup = result.clone();

        result.fitness = count as f32 / points.len() as f32;

        if count == 0 {
            log::warn!("ICP iteration {}: no valid correspondences", iter);
            result.inlier_rmse = f32::INFINITY;
            result.status = RegistrationStatus::NoCorrespondences;
            return Ok(result);
        }

        result.inlier_rmse = (total_error / count as f32).sqrt();

        log::debug!(
            "ICP iteration {}: fitness {} rmse {} ({} correspondences)",
            iter,
            result.fitness,
            result.inlier_rmse,
            count
        );

        // last extra iter, just compute fitness & rmse
        if iter == criteria.max_iteration {
            result.status = RegistrationStatus::MaxIterationsReached;
            return Ok(result);
        }

        if iter > 0
            && (result.fitness - backup.fitness).abs() < criteria.relative_fitness
            && (result.inlier_rmse - backup.inlier_rmse).abs() < criteria.relative_rmse
        {
            log::debug!("ICP converged in {} iterations", result.num_iterations);
            result.status = RegistrationStatus::Converged;
            return Ok(result);
        }

        let (a, b) = buffer.normal_equations(strategy)?;
        let extrinsic = match solve_normal_equations(&a, &b) {
            Ok(extrinsic) => extrinsic,
            Err(IcpError::SolverFailure) => {
                log::warn!("ICP iteration {}: non-finite update, stopping", iter);
                result.status = RegistrationStatus::SolverFailure;
                return Ok(result);
            }
            Err(e) => return Err(e),
        };

        transform_points_inplace(points, &extrinsic, strategy)?;
        result.transformation = matmul44(&extrinsic, &result.transformation);
        result.num_iterations += 1;

        log::debug!("elapsed: {:?}", now.elapsed());
    }

    // the loop always returns on its last pass
    Ok(result)
}
