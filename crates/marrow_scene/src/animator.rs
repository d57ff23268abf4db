use std::sync::Arc;

use log::debug;

use marrow_animation::{AnimationClip, NodeCursor};
use marrow_core::{MarrowError, Result};

use crate::skeleton::Skeleton;

#[derive(Debug, Clone)]
struct JointBinding {
    joint: usize,
    node: usize,
    cursor: NodeCursor,
}

/// Drives one skeleton from one clip.
///
/// Joint names are matched against the clip once, in [`Animator::new`];
/// every frame afterwards works on the resolved indices. Joints the clip does
/// not animate stay at their bind transform.
#[derive(Debug, Clone)]
pub struct Animator {
    clip: Arc<AnimationClip>,
    bindings: Vec<JointBinding>,
    unbound: Vec<usize>,
    joint_count: usize,
}

impl Animator {
    #[must_use]
    pub fn new(clip: Arc<AnimationClip>, skeleton: &Skeleton) -> Self {
        let mut bindings = Vec::with_capacity(clip.len().min(skeleton.len()));
        let mut unbound = Vec::new();

        for joint in skeleton.joints() {
            match clip.node_index(joint.name()) {
                Some(node) => bindings.push(JointBinding {
                    joint: joint.index(),
                    node,
                    cursor: NodeCursor::default(),
                }),
                None => unbound.push(joint.index()),
            }
        }

        debug!(
            "Animator bound clip '{}': {} of {} joints animated",
            clip.name(),
            bindings.len(),
            skeleton.len()
        );

        Self {
            clip,
            bindings,
            unbound,
            joint_count: skeleton.len(),
        }
    }

    /// Switches to another clip, re-resolving joint names.
    pub fn set_clip(&mut self, clip: Arc<AnimationClip>, skeleton: &Skeleton) {
        *self = Self::new(clip, skeleton);
    }

    #[inline]
    #[must_use]
    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    /// Number of joints that receive animated values.
    #[must_use]
    pub fn animated_joint_count(&self) -> usize {
        self.bindings.len()
    }

    /// Joint indices left at bind pose by this clip.
    #[must_use]
    pub fn bind_pose_joints(&self) -> &[usize] {
        &self.unbound
    }

    /// Samples the clip at `time`, writes every joint's local transform and
    /// propagates the hierarchy.
    pub fn apply_pose(&mut self, skeleton: &mut Skeleton, time: f32) -> Result<()> {
        if skeleton.len() != self.joint_count {
            return Err(MarrowError::SkeletonMismatch {
                expected: self.joint_count,
                found: skeleton.len(),
            });
        }

        for binding in &mut self.bindings {
            let Some(animation) = self.clip.node_animation_at(binding.node) else {
                continue;
            };
            let bind = *skeleton.joints()[binding.joint].bind_transform();
            let pose = animation.sample_with_cursor(time, &bind, &mut binding.cursor)?;
            skeleton.write_local(binding.joint, pose);
        }

        for &joint in &self.unbound {
            let bind = *skeleton.joints()[joint].bind_transform();
            skeleton.write_local(joint, bind);
        }

        skeleton.propagate_hierarchy();
        Ok(())
    }
}
