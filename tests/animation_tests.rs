//! Animation Sampling Tests
//!
//! Tests for:
//! - Track clamp-before / clamp-after and single-keyframe behaviour
//! - Exact values at keyframe times
//! - Quaternion slerp: unit norm, shortest path, near-parallel fallback
//! - Cursor sampling agreeing with stateless sampling
//! - AnimationClip lookup and load-time convention correction

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Quat, Vec3};

use marrow::animation::{
    AnimationClip, ClipSource, InterpolationMode, Keyframe, KeyframeCursor, NodeKeyframes, Track,
};
use marrow::common::{CoordinateConvention, MarrowError, Transform};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

/// Deterministic pseudo-random sequence for sweeping sample times.
fn lcg_times(seed: u32, count: usize, range: f32) -> Vec<f32> {
    let mut state = seed;
    (0..count)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 8) as f32 / (1u32 << 24) as f32 * range
        })
        .collect()
}

// ============================================================================
// Track: boundaries
// ============================================================================

#[test]
fn single_keyframe_holds_for_every_time() {
    let value = Vec3::new(1.0, -2.0, 3.5);
    let track = Track::linear(vec![Keyframe::new(0.75, value)]);

    for t in [-100.0, -1.0, 0.0, 0.75, 0.76, 3.0, 1e6] {
        assert_eq!(track.sample(t).unwrap(), value, "t={t}");
    }
}

#[test]
fn clamps_before_first_and_after_last() {
    let track = Track::linear(vec![
        Keyframe::new(1.0, Vec3::splat(10.0)),
        Keyframe::new(2.0, Vec3::splat(20.0)),
    ]);
    assert_eq!(track.sample(-5.0).unwrap(), Vec3::splat(10.0));
    assert_eq!(track.sample(0.5).unwrap(), Vec3::splat(10.0));
    assert_eq!(track.sample(2.5).unwrap(), Vec3::splat(20.0));
    assert_eq!(track.sample(f32::INFINITY).unwrap(), Vec3::splat(20.0));
    assert_eq!(track.sample(f32::NEG_INFINITY).unwrap(), Vec3::splat(10.0));
}

#[test]
fn exact_keyframe_times_return_exact_values() {
    let keys = vec![
        Keyframe::new(0.0, Vec3::new(0.1, 0.2, 0.3)),
        Keyframe::new(0.3, Vec3::new(7.7, -1.1, 2.9)),
        Keyframe::new(1.1, Vec3::new(-3.3, 4.4, 0.01)),
        Keyframe::new(2.0, Vec3::new(5.0, 5.0, 5.0)),
    ];
    let track = Track::linear(keys.clone());
    let mut cursor = KeyframeCursor::default();
    for key in &keys {
        assert_eq!(track.sample(key.time).unwrap(), key.value);
        assert_eq!(track.sample_with_cursor(key.time, &mut cursor).unwrap(), key.value);
    }

    let rotations = vec![
        Keyframe::new(0.0, Quat::from_rotation_x(0.3)),
        Keyframe::new(0.5, Quat::from_rotation_y(1.3)),
        Keyframe::new(1.0, Quat::from_rotation_z(-2.0)),
    ];
    let track = Track::linear(rotations.clone());
    for key in &rotations {
        assert_eq!(track.sample(key.time).unwrap(), key.value);
    }
}

#[test]
fn empty_track_fails_with_invalid_track() {
    let track: Track<Quat> = Track::linear(Vec::new());
    let mut cursor = KeyframeCursor::default();
    assert!(matches!(track.sample(0.0), Err(MarrowError::InvalidTrack { .. })));
    assert!(matches!(
        track.sample_with_cursor(0.0, &mut cursor),
        Err(MarrowError::InvalidTrack { .. })
    ));
}

#[test]
fn duplicate_times_never_produce_nan() {
    let track = Track::linear(vec![
        Keyframe::new(0.0, Vec3::ZERO),
        Keyframe::new(0.0, Vec3::ONE),
        Keyframe::new(1.0, Vec3::splat(2.0)),
        Keyframe::new(1.0, Vec3::splat(3.0)),
    ]);
    for t in lcg_times(7, 200, 1.5) {
        let v = track.sample(t).unwrap();
        assert!(v.is_finite(), "t={t}: {v}");
    }
}

// ============================================================================
// Track: linear interpolation
// ============================================================================

#[test]
fn vector_lerp_midpoint() {
    let track = Track::linear(vec![
        Keyframe::new(0.0, Vec3::ZERO),
        Keyframe::new(1.0, Vec3::new(10.0, 20.0, 30.0)),
    ]);
    assert!(vec3_approx(track.sample(0.5).unwrap(), Vec3::new(5.0, 10.0, 15.0)));
    assert!(vec3_approx(track.sample(0.25).unwrap(), Vec3::new(2.5, 5.0, 7.5)));
}

#[test]
fn uneven_spacing_uses_local_parameter() {
    let track = Track::linear(vec![
        Keyframe::new(0.0, 0.0_f32),
        Keyframe::new(0.1, 1.0),
        Keyframe::new(1.1, 2.0),
    ]);
    assert!(approx(track.sample(0.6).unwrap(), 1.5));
}

// ============================================================================
// Track: quaternion interpolation
// ============================================================================

#[test]
fn quaternion_samples_are_unit_length() {
    let track = Track::linear(vec![
        Keyframe::new(0.0, Quat::IDENTITY),
        Keyframe::new(0.4, Quat::from_rotation_y(PI)),
        Keyframe::new(0.8, Quat::from_axis_angle(Vec3::new(1.0, 1.0, 0.0).normalize(), 2.5)),
        Keyframe::new(1.2, Quat::from_rotation_z(0.0001)),
        Keyframe::new(1.6, -Quat::from_rotation_z(0.0002)),
        Keyframe::new(2.0, Quat::from_rotation_x(-3.0)),
    ]);
    let mut cursor = KeyframeCursor::default();
    for t in lcg_times(42, 500, 2.4) {
        let q = track.sample(t).unwrap();
        assert!((q.length() - 1.0).abs() < EPSILON, "t={t}: |q|={}", q.length());
        let qc = track.sample_with_cursor(t, &mut cursor).unwrap();
        assert_eq!(q, qc, "t={t}");
    }
}

#[test]
fn quaternion_takes_shortest_arc() {
    // 350 degrees about Y expressed positively is the same as -10 degrees
    let a = Quat::IDENTITY;
    let b = Quat::from_rotation_y(350.0_f32.to_radians());
    let track = Track::linear(vec![Keyframe::new(0.0, a), Keyframe::new(1.0, b)]);
    let mid = track.sample(0.5).unwrap();
    let expected = Quat::from_rotation_y((-5.0_f32).to_radians());
    assert!(mid.angle_between(expected) < 1e-4, "got {mid}");
}

#[test]
fn quaternion_quarter_turn_halfway() {
    let track = Track::linear(vec![
        Keyframe::new(0.0, Quat::IDENTITY),
        Keyframe::new(1.0, Quat::from_rotation_x(FRAC_PI_2)),
    ]);
    let q = track.sample(0.5).unwrap();
    assert!(q.angle_between(Quat::from_rotation_x(FRAC_PI_2 * 0.5)) < 1e-4);
}

// ============================================================================
// Track: cursor
// ============================================================================

#[test]
fn cursor_agrees_with_binary_search_under_random_access() {
    let times: Vec<f32> = (0..64).map(|i| i as f32 * 0.25).collect();
    let values: Vec<f32> = (0..64).map(|i| ((i * 37) % 11) as f32).collect();
    let track = Track::from_parts(&times, &values, InterpolationMode::Linear).unwrap();

    let mut cursor = KeyframeCursor::default();
    for t in lcg_times(9, 1000, 17.0) {
        assert_eq!(
            track.sample(t).unwrap(),
            track.sample_with_cursor(t, &mut cursor).unwrap(),
            "t={t}"
        );
    }
}

// ============================================================================
// AnimationClip
// ============================================================================

fn clip_source() -> ClipSource {
    ClipSource {
        name: "wave".into(),
        duration: 1.0,
        interpolation: InterpolationMode::Linear,
        nodes: vec![NodeKeyframes {
            name: "Hand".into(),
            translation: vec![
                Keyframe::new(0.0, Vec3::new(0.0, 0.0, 1.0)),
                Keyframe::new(1.0, Vec3::new(0.0, 0.0, 3.0)),
            ],
            rotation: vec![
                Keyframe::new(0.0, Quat::IDENTITY),
                Keyframe::new(1.0, Quat::from_rotation_x(1.0)),
            ],
            scale: Vec::new(),
        }],
    }
}

#[test]
fn clip_lookup_by_name() {
    let clip = AnimationClip::load(clip_source(), CoordinateConvention::Native).unwrap();
    assert_eq!(clip.name(), "wave");
    assert_eq!(clip.len(), 1);
    assert!(clip.node_animation("Hand").is_ok());
    assert!(matches!(
        clip.node_animation("Foot"),
        Err(MarrowError::NodeNotFound(name)) if name == "Foot"
    ));
}

#[test]
fn flip_z_load_equals_mirrored_native_sample() {
    let native = AnimationClip::load(clip_source(), CoordinateConvention::Native).unwrap();
    let flipped = AnimationClip::load(clip_source(), CoordinateConvention::FlipZ).unwrap();

    for t in [0.0, 0.3, 0.5, 1.0] {
        let n = native.node_animation("Hand").unwrap().sample(t, &Transform::IDENTITY).unwrap();
        let f = flipped.node_animation("Hand").unwrap().sample(t, &Transform::IDENTITY).unwrap();
        let expected = CoordinateConvention::FlipZ.convert_mat4(n.to_matrix());
        assert!(f.to_matrix().abs_diff_eq(expected, 1e-5), "t={t}");
    }
}
