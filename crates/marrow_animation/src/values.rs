use glam::{Quat, Vec3, Vec4};

/// Above this dot product two rotations are treated as parallel and blended
/// with a normalized lerp instead of the slerp formula.
pub const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;

/// Values a keyframe track can blend between.
pub trait Interpolatable: Copy + Sized {
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self;
}

impl Interpolatable for f32 {
    #[inline]
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start * (1.0 - t) + end * t
    }
}

impl Interpolatable for Vec3 {
    #[inline]
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        start * (1.0 - t) + end * t
    }
}

impl Interpolatable for Quat {
    #[inline]
    fn interpolate_linear(start: Self, end: Self, t: f32) -> Self {
        slerp_shortest(start, end, t)
    }
}

/// Spherical linear interpolation along the shortest arc.
///
/// `b` is negated when the rotations lie in opposite hemispheres. Nearly
/// parallel inputs fall back to a normalized lerp because `sin(theta)`
/// approaches zero there. The result is always unit length.
#[must_use]
pub fn slerp_shortest(a: Quat, b: Quat, t: f32) -> Quat {
    let va = Vec4::from(a);
    let mut vb = Vec4::from(b);

    let mut dot = va.dot(vb);
    if dot < 0.0 {
        vb = -vb;
        dot = -dot;
    }

    if dot > SLERP_LINEAR_THRESHOLD {
        let blended = va * (1.0 - t) + vb * t;
        return Quat::from_vec4(blended).normalize();
    }

    let theta = dot.min(1.0).acos();
    let sin_theta = theta.sin();
    let wa = ((1.0 - t) * theta).sin() / sin_theta;
    let wb = (t * theta).sin() / sin_theta;

    Quat::from_vec4(va * wa + vb * wb).normalize()
}
