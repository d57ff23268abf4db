//! Skin Cluster
//!
//! Binds a skeleton to one mesh's bind pose and vertex weights, and turns the
//! skeleton's current pose into a matrix palette every frame.
//!
//! # Data flow
//!
//! ```text
//! bind time:   SkinSource ──► inverse bind matrices (per joint)
//!                         └─► vertex influences     (per vertex, 4 slots)
//! per frame:   skeleton-space matrices × inverse bind ──► palette
//! ```
//!
//! The GPU blends `Σ weight_k * skinning[joint_k] * bind_position`; this
//! module only prepares the inputs (plus a CPU reference of the blend in
//! [`SkinCluster::deform_position`]).

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use marrow_core::{CoordinateConvention, MarrowError, Result};

use crate::palette::PaletteTarget;
use crate::skeleton::Skeleton;

/// Joint slots per vertex.
pub const MAX_INFLUENCES: usize = 4;

// ============================================================================
// Import boundary
// ============================================================================

/// Skin data for one joint as handed over by an importer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JointBindData {
    pub joint_name: String,
    /// Maps mesh bind-pose space into the joint's local space.
    #[serde(default = "identity")]
    pub inverse_bind_matrix: Mat4,
    /// `(vertex index, weight)` pairs.
    #[serde(default)]
    pub vertex_weights: Vec<(u32, f32)>,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

/// A mesh's complete skin description. `joints` is processed in order, which
/// decides slot order inside each vertex influence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkinSource {
    pub name: String,
    pub vertex_count: usize,
    pub joints: Vec<JointBindData>,
}

impl SkinSource {
    /// Applies an axis correction to every inverse bind matrix.
    #[must_use]
    pub fn converted(mut self, convention: CoordinateConvention) -> Self {
        for joint in &mut self.joints {
            joint.inverse_bind_matrix = convention.convert_mat4(joint.inverse_bind_matrix);
        }
        self
    }
}

// ============================================================================
// GPU-facing records
// ============================================================================

/// Up to four `(joint, weight)` pairs for one vertex. A slot with weight 0
/// is empty.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct VertexInfluence {
    pub weights: [f32; MAX_INFLUENCES],
    pub joint_indices: [u32; MAX_INFLUENCES],
}

impl VertexInfluence {
    /// Stores the pair in the first empty slot. Returns `false` when all
    /// slots are taken and the pair was not stored.
    pub fn insert(&mut self, joint: u32, weight: f32) -> bool {
        match self.weights.iter().position(|&w| w == 0.0) {
            Some(slot) => {
                self.weights[slot] = weight;
                self.joint_indices[slot] = joint;
                true
            }
            None => false,
        }
    }

    /// Occupied slots as `(joint, weight)`.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.joint_indices
            .iter()
            .zip(&self.weights)
            .filter(|&(_, &w)| w != 0.0)
            .map(|(&j, &w)| (j, w))
    }

    #[must_use]
    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.iter().all(|&w| w == 0.0)
    }
}

/// One palette entry: the skinning matrix and its inverse transpose for
/// normals.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SkinningMatrices {
    pub skinning_matrix: Mat4,
    pub skinning_inverse_transpose: Mat4,
}

impl SkinningMatrices {
    pub const IDENTITY: Self = Self {
        skinning_matrix: Mat4::IDENTITY,
        skinning_inverse_transpose: Mat4::IDENTITY,
    };

    #[must_use]
    pub fn from_skinning(skinning_matrix: Mat4) -> Self {
        Self {
            skinning_matrix,
            skinning_inverse_transpose: normal_matrix(&skinning_matrix),
        }
    }
}

impl Default for SkinningMatrices {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// `transpose(inverse(m))`, or identity when `m` cannot be inverted.
fn normal_matrix(m: &Mat4) -> Mat4 {
    let det = m.determinant();
    if det == 0.0 || !det.is_finite() {
        trace!("Singular skinning matrix; using identity for normals");
        return Mat4::IDENTITY;
    }
    let inverse = m.inverse();
    if inverse.is_finite() {
        inverse.transpose()
    } else {
        Mat4::IDENTITY
    }
}

// ============================================================================
// Skin cluster
// ============================================================================

#[derive(Debug, Clone)]
pub struct SkinCluster {
    inverse_bind_matrices: Vec<Mat4>,
    vertex_influences: Vec<VertexInfluence>,
    palette: Vec<SkinningMatrices>,

    skipped_joints: usize,
    dropped_influences: usize,
}

impl SkinCluster {
    /// Resolves skin data against `skeleton`.
    ///
    /// - Joints without skin data keep an identity inverse bind matrix.
    /// - Entries naming a joint the skeleton lacks are skipped.
    /// - Weights go into the first free slot of their vertex; a fifth or
    ///   later influence is dropped and only counted
    ///   ([`SkinCluster::dropped_influences`]). Remaining weights are not
    ///   renormalized.
    /// - Non-positive or non-finite weights and out-of-range vertex indices
    ///   are ignored.
    #[must_use]
    pub fn bind(skeleton: &Skeleton, source: &SkinSource) -> Self {
        let mut inverse_bind_matrices = vec![Mat4::IDENTITY; skeleton.len()];
        let mut vertex_influences = vec![VertexInfluence::default(); source.vertex_count];
        let mut skipped_joints = 0;
        let mut dropped_influences = 0;

        for entry in &source.joints {
            let Some(joint) = skeleton.find_joint_index(&entry.joint_name) else {
                debug!(
                    "Skin '{}': joint '{}' not in skeleton, skipped",
                    source.name, entry.joint_name
                );
                skipped_joints += 1;
                continue;
            };

            inverse_bind_matrices[joint] = entry.inverse_bind_matrix;

            for &(vertex, weight) in &entry.vertex_weights {
                if !(weight.is_finite() && weight > 0.0) {
                    continue;
                }
                let Some(influence) = vertex_influences.get_mut(vertex as usize) else {
                    debug!(
                        "Skin '{}': vertex {vertex} out of range ({} vertices)",
                        source.name, source.vertex_count
                    );
                    continue;
                };
                if !influence.insert(joint as u32, weight) {
                    dropped_influences += 1;
                }
            }
        }

        debug!(
            "Bound skin '{}': {} joints, {} vertices, {skipped_joints} unknown joints, {dropped_influences} dropped influences",
            source.name,
            skeleton.len(),
            source.vertex_count
        );

        Self {
            inverse_bind_matrices,
            vertex_influences,
            palette: vec![SkinningMatrices::IDENTITY; skeleton.len()],
            skipped_joints,
            dropped_influences,
        }
    }

    /// Rebuilds the palette from the skeleton's current skeleton-space
    /// matrices. Run after [`Skeleton::propagate_hierarchy`].
    pub fn compute_palette(&mut self, skeleton: &Skeleton) -> Result<()> {
        if skeleton.len() != self.inverse_bind_matrices.len() {
            return Err(MarrowError::SkeletonMismatch {
                expected: self.inverse_bind_matrices.len(),
                found: skeleton.len(),
            });
        }

        for ((entry, inverse_bind), joint) in self
            .palette
            .iter_mut()
            .zip(&self.inverse_bind_matrices)
            .zip(skeleton.joints())
        {
            *entry = SkinningMatrices::from_skinning(joint.skeleton_space_matrix * *inverse_bind);
        }
        Ok(())
    }

    /// Hands the palette and influence table to a renderer-owned target.
    pub fn write_to<T: PaletteTarget + ?Sized>(&self, target: &mut T) {
        target.write_palette(&self.palette);
        target.write_influences(&self.vertex_influences);
    }

    #[inline]
    #[must_use]
    pub fn palette(&self) -> &[SkinningMatrices] {
        &self.palette
    }

    #[inline]
    #[must_use]
    pub fn vertex_influences(&self) -> &[VertexInfluence] {
        &self.vertex_influences
    }

    #[inline]
    #[must_use]
    pub fn inverse_bind_matrices(&self) -> &[Mat4] {
        &self.inverse_bind_matrices
    }

    #[must_use]
    pub fn joint_count(&self) -> usize {
        self.inverse_bind_matrices.len()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertex_influences.len()
    }

    /// Skin entries whose joint name the skeleton did not have.
    #[must_use]
    pub fn skipped_joints(&self) -> usize {
        self.skipped_joints
    }

    /// Influences discarded because their vertex already had four.
    #[must_use]
    pub fn dropped_influences(&self) -> usize {
        self.dropped_influences
    }

    /// CPU reference of the GPU blend for one vertex position.
    ///
    /// A vertex without influences stays at its bind position. Returns
    /// `None` for an out-of-range vertex.
    #[must_use]
    pub fn deform_position(&self, vertex: usize, bind_position: Vec3) -> Option<Vec3> {
        let influence = self.vertex_influences.get(vertex)?;
        if influence.is_empty() {
            return Some(bind_position);
        }
        Some(influence.iter().fold(Vec3::ZERO, |acc, (joint, weight)| {
            let skinning = &self.palette[joint as usize].skinning_matrix;
            acc + skinning.transform_point3(bind_position) * weight
        }))
    }

    /// CPU reference of the normal blend; the result is renormalized.
    #[must_use]
    pub fn deform_normal(&self, vertex: usize, bind_normal: Vec3) -> Option<Vec3> {
        let influence = self.vertex_influences.get(vertex)?;
        if influence.is_empty() {
            return Some(bind_normal);
        }
        let blended = influence.iter().fold(Vec3::ZERO, |acc, (joint, weight)| {
            let normal = &self.palette[joint as usize].skinning_inverse_transpose;
            acc + normal.transform_vector3(bind_normal) * weight
        });
        Some(blended.normalize_or_zero())
    }
}
