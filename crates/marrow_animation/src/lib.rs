//! # Marrow Animation
//!
//! Time-indexed animation data and its sampling rules.
//!
//! - [`Track`] / [`Keyframe`]: one animated property; linear or step
//!   interpolation, shortest-path slerp for rotations
//! - [`AnimationClip`]: per-joint translate/rotate/scale tracks plus a duration
//! - [`ClipCache`]: explicit, scene-scoped owner of loaded clips
//! - [`Playback`]: caller-side loop policy for turning frame deltas into clip time

pub mod cache;
pub mod clip;
pub mod playback;
pub mod tracks;
pub mod values;

pub use cache::{ClipCache, ClipKey};
pub use clip::{AnimationClip, ClipSource, NodeAnimation, NodeCursor, NodeKeyframes};
pub use playback::{LoopMode, Playback};
pub use tracks::{InterpolationMode, Keyframe, KeyframeCursor, Track};
pub use values::{Interpolatable, SLERP_LINEAR_THRESHOLD, slerp_shortest};
