//! Animation Clip Cache
//!
//! Clips are immutable once loaded and shared by every character playing
//! them. The cache owns one `Arc<AnimationClip>` per [`ClipKey`].
//!
//! A clip name alone is not unique: exporters default to names such as
//! "Take 001" or "idle" for every rig. Entries are therefore keyed by a
//! scope (normally the asset name), the clip name and the coordinate
//! convention the keys were converted with.
//!
//! Unlike a lazily-filled global, entries only appear through an explicit
//! [`ClipCache::load`] / [`ClipCache::insert`] and only disappear through
//! [`ClipCache::evict_all`]. The scene or level loader decides both, so the
//! cache lifetime follows the scene rather than the process.
//!
//! ```rust,ignore
//! let cache = ClipCache::global();
//! let walk = cache.load("hero", source, CoordinateConvention::FlipZ)?;
//! // ... level runs ...
//! cache.evict_all();
//! ```
//!
//! Characters that still hold an `Arc` keep their clip alive after eviction.

use std::fmt;
use std::sync::{Arc, LazyLock};

use log::{debug, info};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use marrow_core::{CoordinateConvention, Result};

use crate::clip::{AnimationClip, ClipSource};

static GLOBAL_CLIP_CACHE: LazyLock<ClipCache> = LazyLock::new(ClipCache::new);

/// Identity of a cached clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClipKey {
    pub scope: String,
    pub name: String,
    pub convention: CoordinateConvention,
}

impl ClipKey {
    #[must_use]
    pub fn new(
        scope: impl Into<String>,
        name: impl Into<String>,
        convention: CoordinateConvention,
    ) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
            convention,
        }
    }
}

impl fmt::Display for ClipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({:?})", self.scope, self.name, self.convention)
    }
}

#[derive(Debug, Default)]
pub struct ClipCache {
    clips: RwLock<FxHashMap<ClipKey, Arc<AnimationClip>>>,
}

impl ClipCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance used by the asset loader.
    #[must_use]
    pub fn global() -> &'static ClipCache {
        &GLOBAL_CLIP_CACHE
    }

    /// Returns the clip cached under `(scope, source.name, convention)`,
    /// loading and inserting it first if absent. An already cached clip is
    /// returned as is; `source` is not reloaded.
    pub fn load(
        &self,
        scope: &str,
        source: ClipSource,
        convention: CoordinateConvention,
    ) -> Result<Arc<AnimationClip>> {
        let key = ClipKey::new(scope, source.name.as_str(), convention);
        if let Some(existing) = self.get(&key) {
            debug!("Clip cache hit: {key}");
            return Ok(existing);
        }

        // Build outside the lock; a concurrent loader of the same key wins.
        let clip = Arc::new(AnimationClip::load(source, convention)?);
        let mut clips = self.clips.write();
        let entry = clips.entry(key).or_insert_with(|| Arc::clone(&clip));
        Ok(Arc::clone(entry))
    }

    /// Inserts (or replaces) a clip built elsewhere.
    pub fn insert(&self, key: ClipKey, clip: AnimationClip) -> Arc<AnimationClip> {
        let clip = Arc::new(clip);
        self.clips.write().insert(key, Arc::clone(&clip));
        clip
    }

    #[must_use]
    pub fn get(&self, key: &ClipKey) -> Option<Arc<AnimationClip>> {
        self.clips.read().get(key).cloned()
    }

    #[must_use]
    pub fn contains(&self, key: &ClipKey) -> bool {
        self.clips.read().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clips.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clips.read().is_empty()
    }

    /// Keys of all cached clips, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<ClipKey> {
        let mut keys: Vec<ClipKey> = self.clips.read().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Drops every cached clip and returns how many were removed.
    pub fn evict_all(&self) -> usize {
        let mut clips = self.clips.write();
        let count = clips.len();
        clips.clear();
        if count > 0 {
            info!("Evicted {count} animation clips");
        }
        count
    }
}
