//! # Marrow
//!
//! Skeletal animation and GPU-skinning preparation.
//!
//! Per frame, for each character:
//!
//! 1. an [`animation::AnimationClip`] is sampled at the caller's clock time,
//! 2. the sampled local transforms are propagated through the
//!    [`scene::Skeleton`] into skeleton-space matrices,
//! 3. a [`scene::SkinCluster`] combines them with inverse bind matrices into
//!    the matrix palette the GPU skins with.
//!
//! The umbrella crate only re-exports the workspace crates.

pub use marrow_animation as animation;
pub use marrow_assets as assets;
pub use marrow_core as common;
pub use marrow_scene as scene;

pub use marrow_animation::{AnimationClip, ClipCache, ClipKey, LoopMode, Playback, Track};
pub use marrow_assets::ImportedAsset;
pub use marrow_core::{CoordinateConvention, ImportSettings, MarrowError, Result, Transform};
pub use marrow_scene::{
    AnimationSystem, Animator, PaletteTarget, SkinCluster, SkinnedCharacter, Skeleton,
};

pub mod prelude {
    pub use crate::animation::{
        AnimationClip, ClipCache, ClipKey, ClipSource, InterpolationMode, Keyframe, LoopMode,
        NodeAnimation, Playback, Track,
    };
    pub use crate::assets::ImportedAsset;
    pub use crate::common::{CoordinateConvention, MarrowError, Result, Transform};
    pub use crate::scene::{
        AnimationSystem, Animator, CpuPaletteBuffer, JointBindData, PaletteTarget, SkinCluster,
        SkinSource, SkinnedCharacter, Skeleton, SkinningMatrices, SourceNode, VertexInfluence,
    };
    pub use glam::{Mat4, Quat, Vec3};
}
