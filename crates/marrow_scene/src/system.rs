use std::sync::Arc;

use marrow_animation::{AnimationClip, LoopMode, Playback};
use marrow_core::Result;

use crate::animator::Animator;
use crate::palette::PaletteTarget;
use crate::skeleton::Skeleton;
use crate::skin::SkinCluster;

/// Everything one animated character owns exclusively: its skeleton, the
/// animator driving it, and the skin cluster reading it.
#[derive(Debug, Clone)]
pub struct SkinnedCharacter {
    pub name: String,
    skeleton: Skeleton,
    skin: SkinCluster,
    animator: Option<Animator>,
    pub playback: Playback,
}

impl SkinnedCharacter {
    #[must_use]
    pub fn new(name: impl Into<String>, skeleton: Skeleton, skin: SkinCluster) -> Self {
        Self {
            name: name.into(),
            skeleton,
            skin,
            animator: None,
            playback: Playback::default(),
        }
    }

    /// Starts `clip` from time zero with the given loop policy.
    pub fn play(&mut self, clip: Arc<AnimationClip>, loop_mode: LoopMode) {
        self.animator = Some(Animator::new(clip, &self.skeleton));
        self.playback = Playback::new(loop_mode);
    }

    /// Stops animating; the next update shows the bind pose.
    pub fn stop(&mut self) {
        self.animator = None;
        self.skeleton.reset_to_bind_pose();
    }

    /// Runs one frame at clip time `time` (seconds):
    /// animator pose → hierarchy propagation → palette.
    pub fn update(&mut self, time: f32) -> Result<()> {
        match &mut self.animator {
            Some(animator) => animator.apply_pose(&mut self.skeleton, time)?,
            None => self.skeleton.propagate_hierarchy(),
        }
        self.skin.compute_palette(&self.skeleton)
    }

    /// Advances the playback clock by `dt` and runs [`SkinnedCharacter::update`].
    pub fn advance(&mut self, dt: f32) -> Result<()> {
        let duration = self
            .animator
            .as_ref()
            .map_or(0.0, |animator| animator.clip().duration());
        let time = self.playback.advance(dt, duration);
        self.update(time)
    }

    /// Writes this frame's palette and influences into `target`.
    pub fn submit<T: PaletteTarget + ?Sized>(&self, target: &mut T) {
        self.skin.write_to(target);
    }

    #[must_use]
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    #[must_use]
    pub fn skin(&self) -> &SkinCluster {
        &self.skin
    }

    #[must_use]
    pub fn animator(&self) -> Option<&Animator> {
        self.animator.as_ref()
    }
}

/// Frame driver for a set of characters.
pub struct AnimationSystem;

impl AnimationSystem {
    /// Advances every character by `dt` seconds, one after another.
    ///
    /// Stops at the first failing character and returns its error; the
    /// characters before it have already been updated.
    pub fn update(characters: &mut [SkinnedCharacter], dt: f32) -> Result<()> {
        for character in characters {
            character.advance(dt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::CpuPaletteBuffer;
    use crate::skeleton::SourceNode;
    use crate::skin::{JointBindData, SkinSource};
    use glam::{Mat4, Vec3};
    use marrow_animation::{Keyframe, NodeAnimation, Track};
    use marrow_core::Transform;

    fn character() -> SkinnedCharacter {
        let skeleton = Skeleton::build(&SourceNode::new("Root", Transform::IDENTITY));
        let skin = SkinCluster::bind(
            &skeleton,
            &SkinSource {
                name: "cube".into(),
                vertex_count: 1,
                joints: vec![JointBindData {
                    joint_name: "Root".into(),
                    inverse_bind_matrix: Mat4::IDENTITY,
                    vertex_weights: vec![(0, 1.0)],
                }],
            },
        );
        SkinnedCharacter::new("cube", skeleton, skin)
    }

    fn slide() -> Arc<AnimationClip> {
        let root = NodeAnimation::new("Root").with_translation(Track::linear(vec![
            Keyframe::new(0.0, Vec3::ZERO),
            Keyframe::new(2.0, Vec3::new(4.0, 0.0, 0.0)),
        ]));
        Arc::new(AnimationClip::new("slide", 2.0, vec![root]).unwrap())
    }

    #[test]
    fn advance_moves_palette() {
        let mut character = character();
        character.play(slide(), LoopMode::Loop);

        character.advance(0.5).unwrap();
        let moved = character.skin().deform_position(0, Vec3::ZERO).unwrap();
        assert!(moved.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5), "got {moved}");

        // Wraps past the end
        character.advance(2.0).unwrap();
        let wrapped = character.skin().deform_position(0, Vec3::ZERO).unwrap();
        assert!(wrapped.abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-5), "got {wrapped}");
    }

    #[test]
    fn stop_returns_to_bind_pose() {
        let mut character = character();
        character.play(slide(), LoopMode::Once);
        character.update(1.0).unwrap();
        character.stop();
        character.update(1.0).unwrap();
        assert_eq!(character.skin().palette()[0].skinning_matrix, Mat4::IDENTITY);
    }

    #[test]
    fn system_updates_all_and_submits() {
        let mut characters = vec![character(), character()];
        characters[0].play(slide(), LoopMode::Loop);
        AnimationSystem::update(&mut characters, 1.0).unwrap();

        let mut target = CpuPaletteBuffer::new("frame");
        characters[0].submit(&mut target);
        let t = target.palette()[0].skinning_matrix.w_axis.truncate();
        assert!(t.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));

        characters[1].submit(&mut target);
        assert_eq!(target.palette()[0].skinning_matrix, Mat4::IDENTITY);
    }
}
