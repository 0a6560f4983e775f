use faer::{Mat, Side};

use cicp_3d::{linalg::Mat4x4f, transforms::vector6_to_transform};

use crate::IcpError;

/// Eigenvalues at or below this fraction of the largest one are treated as zero.
const EIGENVALUE_TOLERANCE: f64 = 1e-9;

/// Solve the 6x6 normal equations `A x = b` in double precision.
///
/// The system is accumulated in single precision but factorized after a
/// promotion to f64. `A` is symmetric, so it is decomposed as `U S U^T` and
/// solved through the pseudo-inverse: directions whose eigenvalue is at or
/// below `1e-9` times the largest magnitude are not observable and get a zero
/// update. A flat target, where the rotation around its normal and the in-plane
/// translations vanish from `J`, is still moved along its normal.
///
/// # Arguments
///
/// * `a` - The symmetric matrix `J^T J`.
/// * `b` - The vector `J^T r`.
///
/// # Returns
///
/// The update `[r_x, r_y, r_z, t_x, t_y, t_z]`, or [`IcpError::SolverFailure`]
/// when the system or any component of the update is not finite.
pub fn solve_normal_equations_f64(a: &[[f32; 6]; 6], b: &[f32; 6]) -> Result<[f64; 6], IcpError> {
    if a.iter().flatten().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(IcpError::SolverFailure);
    }

    let a_mat = Mat::<f64>::from_fn(6, 6, |i, j| a[i][j] as f64);
    let b_mat = Mat::<f64>::from_fn(6, 1, |i, _| b[i] as f64);

    let eig = a_mat.selfadjoint_eigendecomposition(Side::Lower);
    let (s, u) = (eig.s(), eig.u());

    let max_abs = (0..6).map(|k| s.column_vector().read(k).abs()).fold(0.0, f64::max);
    let tolerance = EIGENVALUE_TOLERANCE * max_abs;

    let mut update = [0.0; 6];
    for k in 0..6 {
        let lambda = s.column_vector().read(k);
        if lambda.abs() <= tolerance {
            continue;
        }
        let coeff = (0..6).map(|i| u.read(i, k) * b_mat.read(i, 0)).sum::<f64>() / lambda;
        for (i, val) in update.iter_mut().enumerate() {
            *val += coeff * u.read(i, k);
        }
    }

    if update.iter().any(|v| !v.is_finite()) {
        return Err(IcpError::SolverFailure);
    }

    Ok(update)
}

/// Solve the 6x6 normal equations and convert the update into an incremental transform.
///
/// See [`solve_normal_equations_f64`].
pub fn solve_normal_equations(a: &[[f32; 6]; 6], b: &[f32; 6]) -> Result<Mat4x4f, IcpError> {
    let update = solve_normal_equations_f64(a, b)?;
    Ok(vector6_to_transform(&update))
}
