use glam::DMat3;

use crate::linalg::Mat4x4f;

/// Convert a 6-dof update `[r_x, r_y, r_z, t_x, t_y, t_z]` into a 4x4 rigid transform in double precision.
///
/// The rotation is composed as `Rz(r_z) * Ry(r_y) * Rx(r_x)`, the translation
/// fills the last column of the top three rows.
///
/// # Arguments
///
/// * `update` - Three rotation angles in radians followed by the translation.
///
/// # Returns
///
/// The homogeneous transform with last row `[0, 0, 0, 1]`.
pub fn vector6_to_transform_f64(update: &[f64; 6]) -> [[f64; 4]; 4] {
    let rotation = DMat3::from_rotation_z(update[2])
        * DMat3::from_rotation_y(update[1])
        * DMat3::from_rotation_x(update[0]);

    let mut trans = [[0.0; 4]; 4];
    for (i, row) in trans.iter_mut().take(3).enumerate() {
        let r = rotation.row(i);
        *row = [r.x, r.y, r.z, update[3 + i]];
    }
    trans[3][3] = 1.0;
    trans
}

/// Convert a 6-dof update into a single precision 4x4 rigid transform.
///
/// The transform is built in double precision and cast at the end.
///
/// Example:
///
/// ```
/// use cicp_3d::transforms::vector6_to_transform;
///
/// let trans = vector6_to_transform(&[0.0, 0.0, std::f64::consts::FRAC_PI_2, 1.0, 2.0, 3.0]);
/// assert!((trans[1][0] - 1.0).abs() < 1e-6);
/// assert_eq!(trans[0][3], 1.0);
/// assert_eq!(trans[3], [0.0, 0.0, 0.0, 1.0]);
/// ```
pub fn vector6_to_transform(update: &[f64; 6]) -> Mat4x4f {
    let trans = vector6_to_transform_f64(update);
    let mut out = [[0.0f32; 4]; 4];
    for (dst, src) in out.iter_mut().zip(trans.iter()) {
        for (d, s) in dst.iter_mut().zip(src.iter()) {
            *d = *s as f32;
        }
    }
    out
}

/// Recover the `[r_x, r_y, r_z]` angles of a rotation composed as `Rz * Ry * Rx`.
///
/// At gimbal lock (`r_y = ±π/2`) only the difference of `r_x` and `r_z` is
/// observable, `r_z` is then reported as zero.
pub fn rotation_to_euler_zyx(rotation: &[[f64; 3]; 3]) -> [f64; 3] {
    let sin_y = (-rotation[2][0]).clamp(-1.0, 1.0);
    let r_y = sin_y.asin();

    if sin_y.abs() > 1.0 - 1e-12 {
        let r_x = if sin_y > 0.0 {
            rotation[0][1].atan2(rotation[1][1])
        } else {
            (-rotation[0][1]).atan2(rotation[1][1])
        };
        return [r_x, r_y, 0.0];
    }

    let r_x = rotation[2][1].atan2(rotation[2][2]);
    let r_z = rotation[1][0].atan2(rotation[0][0]);
    [r_x, r_y, r_z]
}

/// Convert a rigid transform back into its 6-dof `[r_x, r_y, r_z, t_x, t_y, t_z]` vector.
pub fn transform_to_vector6(trans: &Mat4x4f) -> [f64; 6] {
    let mut rotation = [[0.0; 3]; 3];
    for (i, row) in rotation.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = trans[i][j] as f64;
        }
    }
    let [r_x, r_y, r_z] = rotation_to_euler_zyx(&rotation);
    [
        r_x,
        r_y,
        r_z,
        trans[0][3] as f64,
        trans[1][3] as f64,
        trans[2][3] as f64,
    ]
}
