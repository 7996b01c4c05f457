//! Math type aliases and helper functions.
//!
//! Everything here is `f32`, matching the precision stored in model files.

pub use nalgebra;

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Normalize `v`, leaving zero-length vectors unchanged.
pub fn normalize_or_keep(v: Vec3) -> Vec3 {
    v.try_normalize(0.0).unwrap_or(v)
}

/// Sign of `value` as `1.0` or `-1.0`; exactly zero counts as positive.
pub fn sign_or_positive(value: f32) -> f32 {
    if value < 0.0 { -1.0 } else { 1.0 }
}

/// Convert a 4x4 matrix to a column-major `[[f32; 4]; 4]` array.
pub fn mat4_to_cols_array_2d(m: &Mat4) -> [[f32; 4]; 4] {
    let s = m.as_slice();
    [
        [s[0], s[1], s[2], s[3]],
        [s[4], s[5], s[6], s[7]],
        [s[8], s[9], s[10], s[11]],
        [s[12], s[13], s[14], s[15]],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_matrix() {
        let t = Vec3::new(1.0, 2.0, 3.0);
        let m = mat4_from_translation(t);
        assert_eq!(m[(0, 3)], 1.0);
        assert_eq!(m[(1, 3)], 2.0);
        assert_eq!(m[(2, 3)], 3.0);
    }

    #[test]
    fn translation_inverse_cancels() {
        let t = Vec3::new(-4.0, 0.5, 9.0);
        let m = mat4_from_translation(t) * mat4_from_translation(-t);
        assert!((m - Mat4::identity()).norm() < 1e-6);
    }

    #[test]
    fn normalize_zero_stays_zero() {
        assert_eq!(normalize_or_keep(Vec3::zeros()), Vec3::zeros());
        let n = normalize_or_keep(Vec3::new(0.0, 3.0, 4.0));
        assert!((n.norm() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn sign_treats_zero_as_positive() {
        assert_eq!(sign_or_positive(0.0), 1.0);
        assert_eq!(sign_or_positive(-0.0), 1.0);
        assert_eq!(sign_or_positive(-2.5), -1.0);
        assert_eq!(sign_or_positive(7.0), 1.0);
    }

    #[test]
    fn cols_array_2d_translation() {
        let m = mat4_from_translation(Vec3::new(1.0, 2.0, 3.0));
        let cols = mat4_to_cols_array_2d(&m);
        assert_eq!(cols[0], [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(cols[3], [1.0, 2.0, 3.0, 1.0]);
    }
}
