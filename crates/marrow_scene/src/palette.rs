//! Render hand-off
//!
//! The skin cluster never owns GPU-visible memory. Each frame it gets a
//! transient write capability through a [`PaletteTarget`] supplied by the
//! rendering side, which owns allocation, upload and frame-in-flight
//! buffering.

use bytemuck::Pod;

use crate::skin::{SkinningMatrices, VertexInfluence};

/// Write-only destination for skinning data.
pub trait PaletteTarget {
    /// Receives the full palette, one entry per joint. Called every frame.
    fn write_palette(&mut self, palette: &[SkinningMatrices]);

    /// Receives the per-vertex influence table. The table is fixed after
    /// binding, so implementations may skip redundant uploads.
    fn write_influences(&mut self, influences: &[VertexInfluence]);
}

/// Version counter bumped on every content change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeTracker {
    version: u64,
}

impl ChangeTracker {
    pub fn changed(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// CPU-side staging copy of a character's skinning data.
///
/// A renderer polls [`CpuPaletteBuffer::palette_version`] /
/// [`CpuPaletteBuffer::influence_version`] and re-uploads only what changed.
#[derive(Debug, Clone, Default)]
pub struct CpuPaletteBuffer {
    label: String,
    palette: Vec<SkinningMatrices>,
    influences: Vec<VertexInfluence>,
    palette_tracker: ChangeTracker,
    influence_tracker: ChangeTracker,
}

impl CpuPaletteBuffer {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn palette(&self) -> &[SkinningMatrices] {
        &self.palette
    }

    #[must_use]
    pub fn influences(&self) -> &[VertexInfluence] {
        &self.influences
    }

    /// Palette as raw bytes, ready for a buffer upload.
    #[must_use]
    pub fn palette_bytes(&self) -> &[u8] {
        as_bytes(&self.palette)
    }

    #[must_use]
    pub fn influence_bytes(&self) -> &[u8] {
        as_bytes(&self.influences)
    }

    #[must_use]
    pub fn palette_version(&self) -> u64 {
        self.palette_tracker.version()
    }

    #[must_use]
    pub fn influence_version(&self) -> u64 {
        self.influence_tracker.version()
    }
}

impl PaletteTarget for CpuPaletteBuffer {
    fn write_palette(&mut self, palette: &[SkinningMatrices]) {
        self.palette.clear();
        self.palette.extend_from_slice(palette);
        self.palette_tracker.changed();
    }

    fn write_influences(&mut self, influences: &[VertexInfluence]) {
        if self.influences.as_slice() == influences {
            return;
        }
        self.influences.clear();
        self.influences.extend_from_slice(influences);
        self.influence_tracker.changed();
    }
}

fn as_bytes<T: Pod>(data: &[T]) -> &[u8] {
    bytemuck::cast_slice(data)
}
