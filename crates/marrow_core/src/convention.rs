//! Coordinate convention correction.
//!
//! Importers frequently hand over data authored in a right-handed space while
//! the engine works left-handed. The fix is a single-axis mirror `M` applied
//! once at load time:
//!
//! - points and translations: `M * v`
//! - rotations: `M * R * M`, which for a quaternion keeps the mirrored axis
//!   component and `w` and negates the other two
//! - scales are unchanged (diagonal matrices commute with `M`)
//! - full matrices (inverse bind poses): `M * A * M`

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::transform::Transform;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateConvention {
    /// Data is already in engine space.
    Native,
    FlipX,
    FlipY,
    /// Right-handed, Y-up source (glTF) into the left-handed engine space.
    #[default]
    FlipZ,
}

impl CoordinateConvention {
    /// Diagonal of the mirror matrix, or `None` for [`CoordinateConvention::Native`].
    #[must_use]
    pub fn mirror(self) -> Option<Vec3> {
        match self {
            Self::Native => None,
            Self::FlipX => Some(Vec3::new(-1.0, 1.0, 1.0)),
            Self::FlipY => Some(Vec3::new(1.0, -1.0, 1.0)),
            Self::FlipZ => Some(Vec3::new(1.0, 1.0, -1.0)),
        }
    }

    #[inline]
    #[must_use]
    pub fn convert_vec3(self, v: Vec3) -> Vec3 {
        match self.mirror() {
            Some(m) => v * m,
            None => v,
        }
    }

    #[inline]
    #[must_use]
    pub fn convert_quat(self, q: Quat) -> Quat {
        match self {
            Self::Native => q,
            Self::FlipX => Quat::from_xyzw(q.x, -q.y, -q.z, q.w),
            Self::FlipY => Quat::from_xyzw(-q.x, q.y, -q.z, q.w),
            Self::FlipZ => Quat::from_xyzw(-q.x, -q.y, q.z, q.w),
        }
    }

    #[inline]
    #[must_use]
    pub fn convert_scale(self, scale: Vec3) -> Vec3 {
        scale
    }

    #[must_use]
    pub fn convert_mat4(self, matrix: Mat4) -> Mat4 {
        match self.mirror() {
            Some(m) => {
                let mirror = Mat4::from_scale(m);
                mirror * matrix * mirror
            }
            None => matrix,
        }
    }

    #[must_use]
    pub fn convert_transform(self, transform: &Transform) -> Transform {
        Transform {
            translation: self.convert_vec3(transform.translation),
            rotation: self.convert_quat(transform.rotation),
            scale: self.convert_scale(transform.scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CoordinateConvention; 4] = [
        CoordinateConvention::Native,
        CoordinateConvention::FlipX,
        CoordinateConvention::FlipY,
        CoordinateConvention::FlipZ,
    ];

    #[test]
    fn transform_conversion_matches_matrix_conjugation() {
        let t = Transform::new(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.5).normalize(), 0.8),
            Vec3::new(1.0, 2.0, 0.5),
        );

        for convention in ALL {
            let via_components = convention.convert_transform(&t).to_matrix();
            let via_matrix = convention.convert_mat4(t.to_matrix());
            assert!(
                via_components.abs_diff_eq(via_matrix, 1e-5),
                "{convention:?}: {via_components} != {via_matrix}"
            );
        }
    }

    #[test]
    fn flip_z_mirrors_points() {
        let p = CoordinateConvention::FlipZ.convert_vec3(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p, Vec3::new(1.0, 2.0, -3.0));
        assert_eq!(CoordinateConvention::default(), CoordinateConvention::FlipZ);
    }

    #[test]
    fn converted_rotation_stays_unit() {
        let q = Quat::from_rotation_x(1.2) * Quat::from_rotation_y(-0.4);
        for convention in ALL {
            let c = convention.convert_quat(q);
            assert!((c.length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn parses_snake_case_names() {
        let c: CoordinateConvention = serde_json::from_str("\"flip_x\"").unwrap();
        assert_eq!(c, CoordinateConvention::FlipX);
    }
}
