//! # Marrow Scene
//!
//! Per-character animation state and the per-frame skinning pipeline:
//!
//! ```text
//! Animator::apply_pose ──► Skeleton::propagate_hierarchy ──► SkinCluster::compute_palette
//! ```
//!
//! [`Skeleton`] and [`SkinCluster`] belong to exactly one character. Clips
//! are shared read-only through `Arc`.

pub mod animator;
pub mod palette;
pub mod skeleton;
pub mod skin;
pub mod system;

pub use animator::Animator;
pub use palette::{ChangeTracker, CpuPaletteBuffer, PaletteTarget};
pub use skeleton::{Joint, Skeleton, SourceNode};
pub use skin::{
    JointBindData, MAX_INFLUENCES, SkinCluster, SkinSource, SkinningMatrices, VertexInfluence,
};
pub use system::{AnimationSystem, SkinnedCharacter};
