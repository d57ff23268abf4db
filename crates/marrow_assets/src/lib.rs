//! # Marrow Assets
//!
//! The import boundary. An external importer (glTF, FBX, ...) produces an
//! [`ImportedAsset`]: a joint tree, clips with keyframes already in seconds,
//! and skins with inverse bind matrices and vertex weights. This crate reads
//! that description from JSON and turns it into a ready-to-run
//! [`SkinnedCharacter`].
//!
//! ```rust,ignore
//! use marrow_assets::ImportedAsset;
//! use marrow_animation::ClipCache;
//!
//! let asset = ImportedAsset::load_file("assets/hero.rig.json")?;
//! let mut hero = asset.instantiate(ClipCache::global())?;
//! hero.advance(1.0 / 60.0)?;
//! ```

use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use marrow_animation::{AnimationClip, ClipCache, ClipKey, ClipSource, LoopMode};
use marrow_core::{ImportSettings, MarrowError, Result};
use marrow_scene::{SkinCluster, SkinSource, Skeleton, SkinnedCharacter, SourceNode};

/// Everything an importer hands over for one rigged model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportedAsset {
    pub name: String,
    pub settings: ImportSettings,
    pub hierarchy: SourceNode,
    pub clips: Vec<ClipSource>,
    pub skins: Vec<SkinSource>,
}

impl ImportedAsset {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let asset = Self::from_json_slice(&bytes)?;
        info!(
            "Loaded rig '{}' from {}: {} clips, {} skins",
            asset.name,
            path.display(),
            asset.clips.len(),
            asset.skins.len()
        );
        Ok(asset)
    }

    /// Builds the skeleton with the configured axis correction applied to
    /// every bind transform.
    #[must_use]
    pub fn build_skeleton(&self) -> Skeleton {
        let mut hierarchy = self.hierarchy.clone();
        convert_tree(&mut hierarchy, &self.settings);
        Skeleton::build(&hierarchy)
    }

    /// Loads every clip through `cache`, returning them in source order.
    ///
    /// Clips are cached under this asset's name, so same-named clips of
    /// different rigs stay separate.
    pub fn load_clips(&self, cache: &ClipCache) -> Result<Vec<Arc<AnimationClip>>> {
        self.clips
            .iter()
            .map(|source| cache.load(&self.name, source.clone(), self.settings.convention))
            .collect()
    }

    /// The cache key [`ImportedAsset::load_clips`] uses for `clip_name`.
    #[must_use]
    pub fn clip_key(&self, clip_name: &str) -> ClipKey {
        ClipKey::new(self.name.as_str(), clip_name, self.settings.convention)
    }

    /// Binds the skin at `index` against `skeleton`.
    pub fn bind_skin(&self, skeleton: &Skeleton, index: usize) -> Result<SkinCluster> {
        let source = self
            .skins
            .get(index)
            .ok_or_else(|| MarrowError::AssetNotFound(format!("{} skin #{index}", self.name)))?;
        let source = source.clone().converted(self.settings.convention);
        let skin = SkinCluster::bind(skeleton, &source);

        if self.settings.report_dropped_influences && skin.dropped_influences() > 0 {
            warn!(
                "Skin '{}' dropped {} influences beyond the per-vertex limit",
                source.name,
                skin.dropped_influences()
            );
        }
        Ok(skin)
    }

    /// Builds a character from the first skin, playing the first clip in a
    /// loop if the asset has any.
    pub fn instantiate(&self, cache: &ClipCache) -> Result<SkinnedCharacter> {
        let clips = self.load_clips(cache)?;
        let mut character = self.instantiate_static()?;
        if let Some(clip) = clips.into_iter().next() {
            character.play(clip, LoopMode::Loop);
        }
        Ok(character)
    }

    /// Like [`ImportedAsset::instantiate`], starting the clip called `clip_name`.
    pub fn instantiate_with_clip(
        &self,
        cache: &ClipCache,
        clip_name: &str,
    ) -> Result<SkinnedCharacter> {
        let clip = self
            .load_clips(cache)?
            .into_iter()
            .find(|clip| clip.name() == clip_name)
            .ok_or_else(|| MarrowError::AssetNotFound(format!("clip '{clip_name}'")))?;
        let mut character = self.instantiate_static()?;
        character.play(clip, LoopMode::Loop);
        Ok(character)
    }

    fn instantiate_static(&self) -> Result<SkinnedCharacter> {
        let skeleton = self.build_skeleton();
        let skin = self.bind_skin(&skeleton, 0)?;
        Ok(SkinnedCharacter::new(self.name.clone(), skeleton, skin))
    }
}

fn convert_tree(node: &mut SourceNode, settings: &ImportSettings) {
    node.transform = settings.convention.convert_transform(&node.transform);
    for child in &mut node.children {
        convert_tree(child, settings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    const RIG: &str = r#"{
        "name": "stick",
        "settings": { "convention": "native" },
        "hierarchy": {
            "name": "Root",
            "children": [ { "name": "Tip", "transform": { "translation": [0.0, 1.0, 0.0] } } ]
        },
        "clips": [
            { "name": "rise", "duration": 1.0, "nodes": [
                { "name": "Root", "translation": [
                    { "time": 0.0, "value": [0.0, 0.0, 0.0] },
                    { "time": 1.0, "value": [0.0, 2.0, 0.0] }
                ] }
            ] }
        ],
        "skins": [
            { "name": "stick", "vertex_count": 2, "joints": [
                { "joint_name": "Root", "vertex_weights": [[0, 1.0]] },
                { "joint_name": "Tip", "vertex_weights": [[1, 1.0]] },
                { "joint_name": "Ghost", "vertex_weights": [[0, 0.5]] }
            ] }
        ]
    }"#;

    #[test]
    fn instantiates_and_plays_first_clip() {
        let asset = ImportedAsset::from_json_str(RIG).unwrap();
        let cache = ClipCache::new();
        let mut character = asset.instantiate(&cache).unwrap();
        assert!(cache.contains(&asset.clip_key("rise")));
        assert_eq!(character.skin().skipped_joints(), 1);

        character.advance(0.5).unwrap();
        let tip = character.skeleton().joint_by_name("Tip").unwrap();
        assert!(tip
            .skeleton_space_matrix()
            .w_axis
            .truncate()
            .abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn unknown_clip_name_is_reported() {
        let asset = ImportedAsset::from_json_str(RIG).unwrap();
        let err = asset
            .instantiate_with_clip(&ClipCache::new(), "fall")
            .unwrap_err();
        assert!(matches!(err, MarrowError::AssetNotFound(_)));
    }

    #[test]
    fn missing_skin_is_reported() {
        let mut asset = ImportedAsset::from_json_str(RIG).unwrap();
        asset.skins.clear();
        assert!(asset.instantiate(&ClipCache::new()).is_err());
    }

    #[test]
    fn default_convention_mirrors_bind_pose() {
        let mut asset = ImportedAsset::from_json_str(RIG).unwrap();
        asset.settings = ImportSettings::default();
        asset.hierarchy.children[0].transform.translation = Vec3::new(0.0, 0.0, 1.0);
        let skeleton = asset.build_skeleton();
        let tip = skeleton.joint(1).unwrap();
        assert_eq!(tip.bind_transform().translation, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn malformed_json_is_a_json_error() {
        let err = ImportedAsset::from_json_str("{ \"hierarchy\": 3 }").unwrap_err();
        assert!(matches!(err, MarrowError::JsonError(_)));
    }
}
