//! Joint Hierarchy
//!
//! The skeleton is a flat arena of [`Joint`]s addressed by index. Parent and
//! child links are indices, never references, and the array is stored in
//! parent-before-child order. That ordering is established once when the
//! skeleton is built and is what lets [`Skeleton::propagate_hierarchy`] run
//! as a single linear pass.
//!
//! Names are only used for load-time binding ([`Skeleton::joint_index`]);
//! per-frame code addresses joints by index.

use glam::Mat4;
use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use marrow_animation::AnimationClip;
use marrow_core::{MarrowError, Result, Transform};

/// A node of the importer's joint tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceNode {
    pub name: String,
    pub transform: Transform,
    pub children: Vec<SourceNode>,
}

impl SourceNode {
    #[must_use]
    pub fn new(name: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into(),
            transform,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_child(mut self, child: SourceNode) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Joint {
    name: String,
    index: usize,
    parent: Option<usize>,
    children: SmallVec<[usize; 4]>,

    bind_transform: Transform,
    local_transform: Transform,

    pub(crate) local_matrix: Mat4,
    pub(crate) skeleton_space_matrix: Mat4,
}

impl Joint {
    fn new(name: String, index: usize, parent: Option<usize>, bind_transform: Transform) -> Self {
        let local_matrix = bind_transform.to_matrix();
        Self {
            name,
            index,
            parent,
            children: SmallVec::new(),
            bind_transform,
            local_transform: bind_transform,
            local_matrix,
            skeleton_space_matrix: local_matrix,
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[usize] {
        &self.children
    }

    /// Rest-pose local transform from the source hierarchy.
    #[inline]
    #[must_use]
    pub fn bind_transform(&self) -> &Transform {
        &self.bind_transform
    }

    #[inline]
    #[must_use]
    pub fn local_transform(&self) -> &Transform {
        &self.local_transform
    }

    #[inline]
    #[must_use]
    pub fn local_matrix(&self) -> &Mat4 {
        &self.local_matrix
    }

    /// Joint-to-skeleton-root matrix as of the last propagation.
    #[inline]
    #[must_use]
    pub fn skeleton_space_matrix(&self) -> &Mat4 {
        &self.skeleton_space_matrix
    }
}

#[derive(Debug, Clone)]
pub struct Skeleton {
    root_index: usize,
    name_to_index: FxHashMap<String, usize>,
    joints: Vec<Joint>,
}

impl Skeleton {
    /// Flattens a joint tree depth-first (pre-order).
    ///
    /// Indices follow traversal order, so every parent precedes its
    /// children. The returned skeleton is in bind pose with skeleton-space
    /// matrices already propagated.
    #[must_use]
    pub fn build(root: &SourceNode) -> Self {
        let mut joints: Vec<Joint> = Vec::new();
        let mut stack: Vec<(&SourceNode, Option<usize>)> = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            let index = joints.len();
            joints.push(Joint::new(node.name.clone(), index, parent, node.transform));
            if let Some(parent) = parent {
                joints[parent].children.push(index);
            }
            // Reverse so the first child is visited first
            stack.extend(node.children.iter().rev().map(|child| (child, Some(index))));
        }

        Self::from_ordered(joints)
    }

    /// Builds from flat arrays, the other common importer layout.
    ///
    /// `parents[i]` must be `None` for exactly one joint and otherwise point
    /// at an index smaller than `i`.
    pub fn from_flat(
        names: &[String],
        parents: &[Option<usize>],
        bind_transforms: &[Transform],
    ) -> Result<Self> {
        if names.is_empty() {
            return Err(MarrowError::InvalidHierarchy("skeleton has no joints".into()));
        }
        if names.len() != parents.len() || names.len() != bind_transforms.len() {
            return Err(MarrowError::InvalidHierarchy(format!(
                "{} names, {} parents, {} bind transforms",
                names.len(),
                parents.len(),
                bind_transforms.len()
            )));
        }

        let mut joints: Vec<Joint> = Vec::with_capacity(names.len());
        let mut root = None;

        for (index, ((name, &parent), &bind)) in
            names.iter().zip(parents).zip(bind_transforms).enumerate()
        {
            match parent {
                None => {
                    if let Some(existing) = root {
                        return Err(MarrowError::InvalidHierarchy(format!(
                            "joints {existing} and {index} both have no parent"
                        )));
                    }
                    root = Some(index);
                }
                Some(p) if p >= index => {
                    return Err(MarrowError::InvalidHierarchy(format!(
                        "joint {index} ('{name}') lists parent {p}, which does not precede it"
                    )));
                }
                Some(p) => joints[p].children.push(index),
            }
            joints.push(Joint::new(name.clone(), index, parent, bind));
        }

        // Joint 0 can only have parent None, so a root always exists here
        Ok(Self::from_ordered(joints))
    }

    fn from_ordered(joints: Vec<Joint>) -> Self {
        let mut name_to_index = FxHashMap::default();
        name_to_index.reserve(joints.len());
        for joint in &joints {
            if name_to_index.contains_key(&joint.name) {
                warn!(
                    "Duplicate joint name '{}' at index {}; lookups resolve to the first",
                    joint.name, joint.index
                );
                continue;
            }
            name_to_index.insert(joint.name.clone(), joint.index);
        }

        let mut skeleton = Self {
            root_index: 0,
            name_to_index,
            joints,
        };
        skeleton.propagate_hierarchy();
        skeleton
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn root_index(&self) -> usize {
        self.root_index
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    #[inline]
    #[must_use]
    pub fn joint(&self, index: usize) -> Option<&Joint> {
        self.joints.get(index)
    }

    /// Index of the joint called `name`.
    pub fn joint_index(&self, name: &str) -> Result<usize> {
        self.find_joint_index(name)
            .ok_or_else(|| MarrowError::JointNotFound(name.to_string()))
    }

    pub fn joint_by_name(&self, name: &str) -> Result<&Joint> {
        self.joint_index(name).map(|index| &self.joints[index])
    }

    /// Non-failing form of [`Skeleton::joint_index`] for binding code that
    /// tolerates missing joints.
    #[inline]
    #[must_use]
    pub fn find_joint_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    // ========================================================================
    // Pose
    // ========================================================================

    /// Sets one joint's local transform and recomposes its local matrix.
    /// Skeleton-space matrices update on the next propagation.
    pub fn set_local_transform(&mut self, index: usize, transform: Transform) -> Result<()> {
        if index >= self.joints.len() {
            return Err(MarrowError::JointNotFound(format!("#{index}")));
        }
        self.write_local(index, transform);
        Ok(())
    }

    #[inline]
    pub(crate) fn write_local(&mut self, index: usize, transform: Transform) {
        let joint = &mut self.joints[index];
        joint.local_transform = transform;
        joint.local_matrix = transform.to_matrix();
    }

    /// Puts every joint back at its bind transform (local only).
    pub fn reset_to_bind_pose(&mut self) {
        for joint in &mut self.joints {
            joint.local_transform = joint.bind_transform;
            joint.local_matrix = joint.bind_transform.to_matrix();
        }
    }

    /// Recomposes every local matrix from its local transform.
    pub fn update_local_matrices(&mut self) {
        for joint in &mut self.joints {
            joint.local_matrix = joint.local_transform.to_matrix();
        }
    }

    /// Samples `clip` at `time` into every joint's local transform, by name.
    ///
    /// Joints the clip has no animation for are set to their bind transform.
    /// This is the name-keyed path; [`crate::Animator`] does the same work
    /// with indices resolved once up front.
    pub fn apply_pose(&mut self, clip: &AnimationClip, time: f32) -> Result<()> {
        for joint in &mut self.joints {
            let pose = match clip.node_index(&joint.name).and_then(|i| clip.node_animation_at(i)) {
                Some(animation) => animation.sample(time, &joint.bind_transform)?,
                None => joint.bind_transform,
            };
            joint.local_transform = pose;
            joint.local_matrix = pose.to_matrix();
        }
        Ok(())
    }

    /// Recomputes skeleton-space matrices in one forward pass.
    ///
    /// `skeleton_space[j] = skeleton_space[parent(j)] * local[j]`, with the
    /// root taking its local matrix as is.
    pub fn propagate_hierarchy(&mut self) {
        for index in 0..self.joints.len() {
            let local = self.joints[index].local_matrix;
            let skeleton_space = match self.joints[index].parent {
                Some(parent) => self.joints[parent].skeleton_space_matrix * local,
                None => local,
            };
            self.joints[index].skeleton_space_matrix = skeleton_space;
        }
    }

    /// Copies every skeleton-space matrix into `out`, resizing it.
    pub fn skeleton_space_matrices_into(&self, out: &mut Vec<Mat4>) {
        out.clear();
        out.extend(self.joints.iter().map(|joint| joint.skeleton_space_matrix));
    }
}
