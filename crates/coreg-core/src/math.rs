//! Mathematical type definitions and homogeneous transform helpers.

use nalgebra::{Isometry3, Matrix3, Matrix4, Point3, UnitQuaternion, Vector3};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;
/// Unit quaternion (rotation) with [`Real`] components.
pub type Quat = UnitQuaternion<Real>;
/// 3D rigid transform (SE(3)) using [`Real`].
pub type Iso3 = Isometry3<Real>;

/// Compose a homogeneous transform `T · R · S`.
///
/// Points are scaled per axis first, then rotated, then translated.
pub fn trs(translation: &Vec3, rotation: &Quat, scale: &Vec3) -> Mat4 {
    Mat4::new_translation(translation)
        * rotation.to_homogeneous()
        * Mat4::new_nonuniform_scaling(scale)
}

/// Upper-left 3×3 block of a homogeneous transform.
pub fn linear_block(m: &Mat4) -> Mat3 {
    m.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Translation column of a homogeneous transform.
pub fn translation_column(m: &Mat4) -> Vec3 {
    m.fixed_view::<3, 1>(0, 3).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trs_applies_scale_then_rotation_then_translation() {
        let t = Vec3::new(1.0, -2.0, 0.5);
        let r = Quat::from_euler_angles(0.0, 0.0, std::f64::consts::FRAC_PI_2);
        let s = Vec3::new(2.0, 2.0, 2.0);
        let m = trs(&t, &r, &s);

        let p = m * nalgebra::Vector4::new(1.0, 0.0, 0.0, 1.0);
        // (1,0,0) -> scaled (2,0,0) -> rotated (0,2,0) -> translated (1,0,0.5)
        assert!((p.x - 1.0).abs() < 1e-12);
        assert!((p.y - 0.0).abs() < 1e-12);
        assert!((p.z - 0.5).abs() < 1e-12);
        assert_eq!(p.w, 1.0);
    }

    #[test]
    fn blocks_round_trip_through_trs() {
        let t = Vec3::new(0.1, 0.2, 0.3);
        let r = Quat::from_euler_angles(0.3, -0.2, 0.1);
        let m = trs(&t, &r, &Vec3::repeat(1.0));

        assert!((translation_column(&m) - t).norm() < 1e-12);
        assert!((linear_block(&m) - r.to_rotation_matrix().into_inner()).norm() < 1e-12);
    }
}
