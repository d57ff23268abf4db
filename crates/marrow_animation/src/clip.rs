use glam::{Quat, Vec3};
use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use marrow_core::{CoordinateConvention, MarrowError, Result, Transform};

use crate::tracks::{InterpolationMode, Keyframe, KeyframeCursor, Track};

// ============================================================================
// Import boundary
// ============================================================================

/// Raw keyframes for one node as handed over by an importer. Times are
/// already converted to seconds. An empty list means the channel is not
/// animated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeKeyframes {
    pub name: String,
    pub translation: Vec<Keyframe<Vec3>>,
    pub rotation: Vec<Keyframe<Quat>>,
    pub scale: Vec<Keyframe<Vec3>>,
}

/// One clip as handed over by an importer, still in the source convention.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipSource {
    pub name: String,
    /// Declared clip length in seconds. Non-positive values are replaced by
    /// the last key time across all tracks.
    pub duration: f32,
    pub interpolation: InterpolationMode,
    pub nodes: Vec<NodeKeyframes>,
}

// ============================================================================
// Node animation
// ============================================================================

/// Per-channel cursors for sampling one [`NodeAnimation`] frame after frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeCursor {
    pub translation: KeyframeCursor,
    pub rotation: KeyframeCursor,
    pub scale: KeyframeCursor,
}

/// Translate/rotate/scale tracks for one joint name.
///
/// A `None` channel is not animated by the clip; sampling returns the bind
/// pose component for it.
#[derive(Debug, Clone)]
pub struct NodeAnimation {
    pub name: String,
    pub translation: Option<Track<Vec3>>,
    pub rotation: Option<Track<Quat>>,
    pub scale: Option<Track<Vec3>>,
}

impl NodeAnimation {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            translation: None,
            rotation: None,
            scale: None,
        }
    }

    #[must_use]
    pub fn with_translation(mut self, track: Track<Vec3>) -> Self {
        self.translation = Some(track);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, track: Track<Quat>) -> Self {
        self.rotation = Some(track);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, track: Track<Vec3>) -> Self {
        self.scale = Some(track);
        self
    }

    /// Samples every animated channel at `time`. Channels the clip does not
    /// animate are taken from `bind`.
    pub fn sample(&self, time: f32, bind: &Transform) -> Result<Transform> {
        Ok(Transform {
            translation: sample_or(self.translation.as_ref(), time, bind.translation)?,
            rotation: sample_or(self.rotation.as_ref(), time, bind.rotation)?,
            scale: sample_or(self.scale.as_ref(), time, bind.scale)?,
        })
    }

    /// Cursor-accelerated [`NodeAnimation::sample`].
    pub fn sample_with_cursor(
        &self,
        time: f32,
        bind: &Transform,
        cursor: &mut NodeCursor,
    ) -> Result<Transform> {
        let translation = match &self.translation {
            Some(track) => track.sample_with_cursor(time, &mut cursor.translation)?,
            None => bind.translation,
        };
        let rotation = match &self.rotation {
            Some(track) => track.sample_with_cursor(time, &mut cursor.rotation)?,
            None => bind.rotation,
        };
        let scale = match &self.scale {
            Some(track) => track.sample_with_cursor(time, &mut cursor.scale)?,
            None => bind.scale,
        };
        Ok(Transform {
            translation,
            rotation,
            scale,
        })
    }

    /// Last key time over all channels.
    #[must_use]
    pub fn end_time(&self) -> f32 {
        let t = self.translation.as_ref().map_or(0.0, Track::end_time);
        let r = self.rotation.as_ref().map_or(0.0, Track::end_time);
        let s = self.scale.as_ref().map_or(0.0, Track::end_time);
        t.max(r).max(s)
    }

    fn validate(&self) -> Result<()> {
        let named = |err: MarrowError, channel: &str| match err {
            MarrowError::InvalidTrack { reason } => {
                MarrowError::invalid_track(format!("{} {channel}: {reason}", self.name))
            }
            other => other,
        };

        if let Some(track) = &self.translation {
            track.validate().map_err(|e| named(e, "translation"))?;
        }
        if let Some(track) = &self.rotation {
            track.validate().map_err(|e| named(e, "rotation"))?;
            if let Some(i) = track
                .keyframes()
                .iter()
                .position(|k| !k.value.is_finite() || k.value.length_squared() < 1e-12)
            {
                return Err(named(
                    MarrowError::invalid_track(format!("keyframe {i} is not a usable rotation")),
                    "rotation",
                ));
            }
        }
        if let Some(track) = &self.scale {
            track.validate().map_err(|e| named(e, "scale"))?;
        }
        Ok(())
    }
}

fn sample_or<T: crate::values::Interpolatable>(
    track: Option<&Track<T>>,
    time: f32,
    fallback: T,
) -> Result<T> {
    match track {
        Some(track) => track.sample(time),
        None => Ok(fallback),
    }
}

// ============================================================================
// Clip
// ============================================================================

/// A named set of node animations plus a duration.
///
/// Immutable once constructed; share it between characters through
/// `Arc<AnimationClip>`.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    name: String,
    duration: f32,
    nodes: Vec<NodeAnimation>,
    node_lookup: FxHashMap<String, usize>,
}

impl AnimationClip {
    /// Builds a clip from already-converted node animations.
    ///
    /// Every present track is validated and rotation keys are normalized.
    /// A non-positive or non-finite `duration` is replaced by the latest key
    /// time. When two node animations share a name, the first one wins.
    pub fn new(
        name: impl Into<String>,
        duration: f32,
        mut nodes: Vec<NodeAnimation>,
    ) -> Result<Self> {
        let name = name.into();

        let mut node_lookup = FxHashMap::default();
        node_lookup.reserve(nodes.len());
        for (index, node) in nodes.iter_mut().enumerate() {
            node.validate()?;
            if let Some(rotation) = &mut node.rotation {
                *rotation = rotation.map_values(Quat::normalize);
            }
            if node_lookup.contains_key(&node.name) {
                warn!("Clip '{name}': duplicate node animation '{}' ignored", node.name);
                continue;
            }
            node_lookup.insert(node.name.clone(), index);
        }

        let duration = if duration.is_finite() && duration > 0.0 {
            duration
        } else {
            nodes.iter().map(NodeAnimation::end_time).fold(0.0_f32, f32::max)
        };

        Ok(Self {
            name,
            duration,
            nodes,
            node_lookup,
        })
    }

    /// Converts importer output into a clip, applying `convention` to every
    /// translation and rotation key once.
    pub fn load(source: ClipSource, convention: CoordinateConvention) -> Result<Self> {
        let interpolation = source.interpolation;
        let nodes = source
            .nodes
            .into_iter()
            .map(|node| NodeAnimation {
                translation: channel(node.translation, interpolation)
                    .map(|t| t.map_values(|v| convention.convert_vec3(v))),
                rotation: channel(node.rotation, interpolation)
                    .map(|t| t.map_values(|q| convention.convert_quat(q))),
                scale: channel(node.scale, interpolation)
                    .map(|t| t.map_values(|s| convention.convert_scale(s))),
                name: node.name,
            })
            .collect();

        let clip = Self::new(source.name, source.duration, nodes)?;
        debug!(
            "Loaded clip '{}': {} node animations, {:.3}s",
            clip.name,
            clip.nodes.len(),
            clip.duration
        );
        Ok(clip)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    #[must_use]
    pub fn node_animations(&self) -> &[NodeAnimation] {
        &self.nodes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up the node animation for `name`.
    pub fn node_animation(&self, name: &str) -> Result<&NodeAnimation> {
        self.node_index(name)
            .map(|index| &self.nodes[index])
            .ok_or_else(|| MarrowError::NodeNotFound(name.to_string()))
    }

    /// Load-time resolution of a node name to a stable index.
    #[must_use]
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.node_lookup.get(name).copied()
    }

    #[inline]
    #[must_use]
    pub fn node_animation_at(&self, index: usize) -> Option<&NodeAnimation> {
        self.nodes.get(index)
    }
}

fn channel<T: crate::values::Interpolatable>(
    keys: Vec<Keyframe<T>>,
    interpolation: InterpolationMode,
) -> Option<Track<T>> {
    (!keys.is_empty()).then(|| Track::new(keys, interpolation))
}
