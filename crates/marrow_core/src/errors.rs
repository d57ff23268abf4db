//! Error Types
//!
//! This module defines the error types shared by every Marrow crate.
//!
//! # Overview
//!
//! The main error type [`MarrowError`] covers all failure modes including:
//! - Malformed keyframe data
//! - Name lookups against clips and skeletons
//! - Hierarchy validation and skeleton/skin mismatches
//! - Asset I/O and JSON decoding
//!
//! # Usage
//!
//! All fallible APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, MarrowError>`.
//!
//! ```rust,ignore
//! use marrow_core::{MarrowError, Result};
//!
//! fn find_hip(skeleton: &Skeleton) -> Result<usize> {
//!     skeleton.joint_index("Hips")
//! }
//! ```
//!
//! Some lookups are deliberately *not* errors: a joint without a clip track
//! keeps its bind pose, and skin data naming a joint the skeleton lacks is
//! skipped. Those paths never construct a [`MarrowError`].

use thiserror::Error;

/// The main error type for the Marrow crates.
#[derive(Error, Debug)]
pub enum MarrowError {
    // ========================================================================
    // Animation Data Errors
    // ========================================================================
    /// A keyframe track is empty, unordered, or contains non-finite data.
    #[error("Invalid keyframe track: {reason}")]
    InvalidTrack {
        /// What made the track unusable
        reason: String,
    },

    /// The clip has no node animation with this name.
    #[error("Node animation not found: {0}")]
    NodeNotFound(String),

    // ========================================================================
    // Skeleton Errors
    // ========================================================================
    /// The skeleton has no joint with this name.
    #[error("Joint not found: {0}")]
    JointNotFound(String),

    /// The joint hierarchy violates the parent-before-child ordering or has
    /// a root count other than one.
    #[error("Invalid joint hierarchy: {0}")]
    InvalidHierarchy(String),

    /// Per-joint data was bound against a skeleton of a different size.
    #[error("Skeleton mismatch: bound to {expected} joints, got {found}")]
    SkeletonMismatch {
        /// Joint count at bind time
        expected: usize,
        /// Joint count of the skeleton passed in
        found: usize,
    },

    // ========================================================================
    // Asset Loading Errors
    // ========================================================================
    /// The requested asset was not found.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parse error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl MarrowError {
    /// Shorthand for [`MarrowError::InvalidTrack`].
    #[must_use]
    pub fn invalid_track(reason: impl Into<String>) -> Self {
        MarrowError::InvalidTrack {
            reason: reason.into(),
        }
    }
}

/// Alias for `Result<T, MarrowError>`.
pub type Result<T> = std::result::Result<T, MarrowError>;
